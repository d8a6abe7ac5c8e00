//! Artifact normalizer: repair generated-output trees that drifted from the
//! canonical layout.
//!
//! Pipeline: scan for one anomaly pattern, plan operations per match, then
//! execute (or narrate, in dry run) and report.
use anyhow::Result;
use clap::Parser;
use std::env;
use std::process::ExitCode;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

mod cli;
mod config;
mod execute;
mod model;
mod pattern;
mod plan;
mod report;
mod scan;
mod util;
mod workflow;

/// Environment variable holding a tracing filter directive.
const LOG_ENV: &str = "ANORM_LOG";

fn main() -> Result<ExitCode> {
    let args = cli::RootArgs::parse();
    init_tracing(args.command.common().verbose);

    let report = workflow::run(&args.command)?;
    if report.has_failures() {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = env::var(LOG_ENV)
        .ok()
        .and_then(|directive| EnvFilter::try_new(directive).ok())
        .unwrap_or_else(|| EnvFilter::new(fallback));
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time(),
        )
        .with(filter)
        .init();
}
