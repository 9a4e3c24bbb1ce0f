//! Evaluate an eo source file.
//!
//! ```ignore
//! eo input.eo >output.bin
//! eo input.eo -o output.bin
//! ```
//!
//! With no input file there is no input, and the output is empty.
//! Includes resolve from the working directory, then the input file's
//! directory, then the directories listed in `EO_PATH`.

use std::error::Error as _;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use eo::{Evaluator, Options};

#[derive(Parser, Debug)]
#[command(version, about = "Evaluate an eo source into bytes", long_about = None)]
struct Args {
    /// Source file to evaluate.
    input: Option<PathBuf>,

    /// Write output to this file instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> ExitCode {
    let args = Args::parse();

    use tracing_subscriber::{fmt, EnvFilter};
    // EO_LOG takes precedence over RUST_LOG; default to warnings only.
    let filter = EnvFilter::try_from_env("EO_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            let mut source = err.source();
            while let Some(cause) = source {
                eprintln!("  caused by: {cause}");
                source = cause.source();
            }
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let mut options = Options::default();
    let output = match &args.input {
        Some(path) => {
            let source = fs::read_to_string(path)
                .map_err(|e| format!("failed to read the input file {}: {e}", path.display()))?;
            if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
                options.include_paths.push(dir.to_path_buf());
            }
            options.include_paths.extend(Options::from_env().include_paths);

            let evaluator = Evaluator::with_options(options);
            evaluator.evaluate(&source, &evaluator.environment())?
        }
        None => Vec::new(),
    };

    match &args.output {
        Some(path) => fs::write(path, &output)
            .map_err(|e| format!("failed to write {}: {e}", path.display()))?,
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&output)?;
            stdout.flush()?;
        }
    }
    Ok(())
}
