//! Groundwork CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use groundwork::cli::{self, Cli};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the tracing subscriber for logging.
///
/// Log level is controlled by:
/// 1. `--debug` flag sets level to DEBUG
/// 2. `RUST_LOG` environment variable (if set)
/// 3. Default is INFO
fn init_tracing(debug: bool, verbose: bool) {
    let filter = if debug {
        EnvFilter::new("groundwork=debug")
    } else if verbose {
        EnvFilter::new("groundwork=info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("groundwork=warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug, cli.verbose);

    tracing::debug!("Groundwork starting with args: {:?}", cli);

    if cli.no_color {
        std::env::set_var("NO_COLOR", "1");
    }

    // The exit code is 0 by contract: a Codespace post-create hook that
    // exits nonzero blocks the whole environment, and every failure this
    // tool can hit is reported as a warning instead.
    if let Err(e) = cli::dispatch(&cli) {
        eprintln!("warning: {}", e);
    }

    ExitCode::SUCCESS
}
