use std::env;
use std::path::Path;
use std::process::ExitCode;
use std::str::FromStr;

use clap::Parser;
use latinc::diagnostics::{
    diagnostic_from_anyhow, diagnostic_from_compile_error, CompilerDiagnostic, DiagnosticStage,
};
use latinc::driver::{self, Emit};
use latinc::CompileError;
use tracing::{info, trace};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

fn main() -> ExitCode {
    initialize_logging();

    let latinc = Latinc::parse();

    let result = match latinc.subcmd {
        LatincSubcommand::Build(build) => run_build(build),
        LatincSubcommand::Eval(eval) => run_eval(eval),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(diagnostic) => {
            eprintln!("{}", diagnostic.render_terminal_auto());
            ExitCode::FAILURE
        }
    }
}

fn run_build(build: Build) -> Result<(), CompilerDiagnostic> {
    let source_path = Path::new(&build.source);
    let source = driver::read_source(source_path).map_err(|err| {
        diagnostic_from_anyhow(
            DiagnosticStage::Io,
            "LATINC-IO-001",
            "failed to read source",
            &err,
        )
    })?;

    let output = driver::emit(&source, build.emit)
        .map_err(|err| stage_diagnostic(&source, Some(source_path), &err))?;
    trace!(emit = ?build.emit, output_len = output.len(), "Ran pipeline");

    match build.output {
        Some(output_path) => {
            let output_path = Path::new(&output_path);
            driver::write_output(output_path, &output).map_err(|err| {
                diagnostic_from_anyhow(
                    DiagnosticStage::Io,
                    "LATINC-IO-001",
                    "failed to write output",
                    &err,
                )
            })?;
            info!(output_path = %output_path.display(), "Output written");
        }
        None => println!("{output}"),
    }

    Ok(())
}

fn run_eval(eval: Eval) -> Result<(), CompilerDiagnostic> {
    let output = latinc::compile(&eval.code)
        .map_err(|err| diagnostic_from_compile_error(&eval.code, None, &err))?;
    println!("{output}");
    Ok(())
}

fn stage_diagnostic(
    source: &str,
    source_path: Option<&Path>,
    err: &anyhow::Error,
) -> CompilerDiagnostic {
    match err.downcast_ref::<CompileError>() {
        Some(compile_error) => diagnostic_from_compile_error(source, source_path, compile_error),
        None => diagnostic_from_anyhow(
            DiagnosticStage::Internal,
            "LATINC-INTERNAL-001",
            "failed to render output",
            err,
        ),
    }
}

fn initialize_logging() {
    let env_filter = env::var("RUST_LOG").unwrap_or_default();
    let filter = EnvFilter::from_str(&env_filter).unwrap_or_else(|_| EnvFilter::new(""));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_filter(filter))
        .init();
}

#[derive(clap::Parser)]
#[clap(about = "Compile Latin source into JavaScript.")]
struct Latinc {
    #[clap(subcommand)]
    subcmd: LatincSubcommand,
}

#[derive(clap::Subcommand)]
enum LatincSubcommand {
    Build(Build),
    Eval(Eval),
}

/// Compile a source file.
#[derive(clap::Parser)]
struct Build {
    /// Path to the Latin source file
    source: String,

    /// Output file path (prints to stdout if not provided)
    #[clap(short, long)]
    output: Option<String>,

    /// Which pipeline stage to print
    #[clap(long, value_enum, default_value_t)]
    emit: Emit,
}

/// Compile a snippet given on the command line.
#[derive(clap::Parser)]
struct Eval {
    code: String,
}
