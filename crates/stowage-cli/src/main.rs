//! stowage - vendor a Go project's dependencies at pinned revisions.
//!
//! Reads `vendor.conf`, fetches every pinned repository in parallel,
//! resolves the project's transitive imports, and prunes the vendor tree
//! down to exactly what the build needs.

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

mod commands;
mod ops;

use clap::Parser;
use commands::Cli;
use std::process::ExitCode;
use tracing::{Level, error, info};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let filter = EnvFilter::builder()
        .with_default_directive(log_level.into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    match ops::run(&cli) {
        Ok(()) => {
            info!("Success");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}
