//! basar-map - manage non-overlapping map polygons from the command line
//!
//! Usage:
//!   basar-map list                               All stored polygons
//!   basar-map create --name N --coords JSON      Store a polygon, cut back against neighbours
//!   basar-map within 3 --points points.json      Which features polygon 3 covers
//!   basar-map export --output map.svg            Draw every polygon
//!
//! Results are JSON on stdout. Logs go to stderr.

mod cli;
mod config;

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::config::Config;

fn main() -> ExitCode {
    let args = Cli::parse();
    match run(args) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Cli) -> Result<ExitCode> {
    let config = Config::load_or_default(args.config.as_deref())?;
    init_logging(&config.log_filter)?;
    cli::dispatch(args, config)
}

/// `RUST_LOG` first, then the configured filter.
fn init_logging(fallback: &str) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(fallback)?,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}
