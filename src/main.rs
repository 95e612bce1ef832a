//! rlock: run a command while holding a distributed lock.
//!
//! This is the main entry point for the `rlock` CLI. It parses arguments,
//! sets up logging, runs the command under the lock, and maps the outcome to
//! the process exit code.

mod cli;
pub mod config;
pub mod error;
pub mod exit_codes;
pub mod locks;
pub mod protocol;
mod runner;
pub mod session;
mod signals;

#[cfg(test)]
mod test_support;

use cli::Cli;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Initialize the tracing subscriber on stderr.
///
/// - `quiet`: Suppress all logging output
/// - `verbose`: Enable debug-level logging
fn init_tracing(quiet: bool, verbose: bool) {
    let filter = if quiet {
        EnvFilter::new("off")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse_args();
    init_tracing(cli.quiet, cli.verbose);

    let result = cli.into_run_config().and_then(|config| runner::run(&config));

    match result {
        Ok(code) => ExitCode::from(code.clamp(0, 255) as u8),
        Err(err) => {
            // Print user-actionable error message to stderr
            eprintln!("Error: {}", err);

            ExitCode::from(err.exit_code() as u8)
        }
    }
}
