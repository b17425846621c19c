//! Binary crate for the `skywatch` command-line tool.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Wiring configuration into the core pipeline
//! - Logging the run for operators

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cmd = cli::Cli::parse();
    cmd.run().await
}
