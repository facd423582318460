//! File-level entry points around [`crate::compile`].

use std::path::Path;

use anyhow::Context;
use tracing::{debug, trace};

use crate::{codegen, parser, tokenizer, transform, CompileError};

/// How far to run the pipeline and what to print.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Emit {
    /// Compiled JavaScript.
    #[default]
    Js,
    /// The token list as JSON.
    Tokens,
    /// The parsed syntax tree, before transformation, as JSON.
    Ast,
}

pub fn read_source(path: &Path) -> anyhow::Result<String> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read source file {}", path.display()))?;
    trace!(source_len = source.len(), path = %path.display(), "Read input file");
    Ok(source)
}

pub fn compile_file(path: &Path) -> anyhow::Result<String> {
    let source = read_source(path)?;
    Ok(crate::compile(&source)?)
}

/// Runs the pipeline over `source` up to the stage `emit` asks for.
///
/// Stage failures come back as a [`CompileError`] inside the `anyhow::Error`.
pub fn emit(source: &str, emit: Emit) -> anyhow::Result<String> {
    let tokens = tokenizer::tokenize(source).map_err(CompileError::from)?;
    if emit == Emit::Tokens {
        return Ok(serde_json::to_string_pretty(&tokens)?);
    }

    let mut program = parser::parse(&tokens).map_err(CompileError::from)?;
    if emit == Emit::Ast {
        return Ok(serde_json::to_string_pretty(&program)?);
    }

    transform::transform(&mut program);
    Ok(codegen::generate(&program))
}

pub fn write_output(path: &Path, text: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }
    std::fs::write(path, text)
        .with_context(|| format!("failed to write output file {}", path.display()))?;
    debug!(path = %path.display(), bytes = text.len(), "Wrote output file");
    Ok(())
}
