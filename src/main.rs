//! Smellscan - ML code smell analysis CLI
//!
//! A fast, local static analyzer that detects machine-learning-specific
//! anti-patterns in Python codebases.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    // Parse CLI args and run
    let cli = smellscan::cli::Cli::parse();
    smellscan::cli::run(cli)
}
