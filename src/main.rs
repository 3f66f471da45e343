//! # Pipeline Reuse CLI
//!
//! Binary entry point for the `pipeline-reuse` command-line tool. It parses
//! arguments with `clap` and hands off to the command implementations, which
//! drive the `pipeline_reuse` library.

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli.execute()
}
