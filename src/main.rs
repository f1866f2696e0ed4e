//! # modsync CLI
//!
//! Binary entry point for the `modsync` command-line tool. It parses the
//! arguments with `clap`, resolves the run options and hands over to the
//! library. A returned error is printed to stderr and exits with code 1;
//! usage errors exit with code 2.

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli.execute()
}
