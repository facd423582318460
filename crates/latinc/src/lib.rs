//! A source-to-source compiler from Latin keywords and Roman numerals to
//! JavaScript-style declarations.
//!
//! The pipeline runs in four stages, each in its own module:
//! - `tokenizer` scans the source into positioned tokens and checks bracket balance.
//! - `parser` builds the syntax tree by recursive descent.
//! - `transform` rewrites Latin vocabulary through the `ast_walk` visitor.
//! - `codegen` renders the tree as text.
//!
//! [`compile`] chains all four; `driver` and `diagnostics` serve the binary.

pub mod ast_walk;
pub mod codegen;
pub mod diagnostics;
pub mod driver;
pub mod numerals;
pub mod parser;
pub mod tokenizer;
pub mod transform;

use tracing::debug;

pub use parser::ParseError;
pub use tokenizer::LexError;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CompileError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl CompileError {
    pub fn position(&self) -> Option<tokenizer::Position> {
        match self {
            CompileError::Lex(err) => Some(err.position()),
            CompileError::Parse(err) => err.position(),
        }
    }
}

/// Compiles Latin source text into JavaScript source text.
///
/// The first error from any stage aborts the compilation and is returned
/// unchanged.
#[tracing::instrument(level = "trace", skip_all)]
pub fn compile(source: &str) -> Result<String, CompileError> {
    let tokens = tokenizer::tokenize(source)?;
    let mut program = parser::parse(&tokens)?;
    transform::transform(&mut program);
    let output = codegen::generate(&program);
    debug!(
        tokens = tokens.len(),
        statements = program.body.len(),
        "Compiled source"
    );
    Ok(output)
}
