//! # Reset Command Implementation
//!
//! Resets every working copy to the tip of its remote branch (or
//! `--source-branch`) and removes untracked files. Requires a branch.

use anyhow::Result;
use clap::Args;

use modsync::batch::BatchRunner;
use modsync::options::{OptionsLayer, RunOptions};
use modsync::output::emoji;

use super::{flag, SelectionArgs};
use crate::cli::Context;

/// Reset working copies to their remote state
#[derive(Args, Debug)]
pub struct ResetArgs {
    #[command(flatten)]
    pub selection: SelectionArgs,

    /// Reference to reset to instead of the remote branch
    #[arg(long, value_name = "REF")]
    pub source_branch: Option<String>,

    /// Branch to start new branches from when the remote has no default
    #[arg(long, value_name = "BRANCH")]
    pub default_branch: Option<String>,

    /// Do not fetch before resetting
    #[arg(long)]
    pub offline: bool,
}

/// Execute the `reset` command
pub fn execute(args: ResetArgs, context: &Context) -> Result<()> {
    let layer = OptionsLayer {
        source_branch: args.source_branch.clone(),
        default_branch: args.default_branch.clone(),
        offline: flag(args.offline),
        ..args.selection.layer()
    };
    let options = RunOptions::resolve(&context.settings, layer)?;
    BatchRunner::new(&options).reset_all()?;
    println!("{} Working copies reset", emoji(&context.output, "🧹", "[RESET]"));
    Ok(())
}
