//! # Push Command Implementation
//!
//! Force-pushes the branch of every module that has a working copy.
//! Requires a branch.

use anyhow::Result;
use clap::Args;

use modsync::batch::BatchRunner;
use modsync::options::{OptionsLayer, RunOptions};
use modsync::output::emoji;

use super::SelectionArgs;
use crate::cli::Context;

/// Force-push module branches
#[derive(Args, Debug)]
pub struct PushArgs {
    #[command(flatten)]
    pub selection: SelectionArgs,

    /// Remote branch to push to (defaults to the branch name)
    #[arg(short, long, value_name = "BRANCH")]
    pub remote_branch: Option<String>,
}

/// Execute the `push` command
pub fn execute(args: PushArgs, context: &Context) -> Result<()> {
    let layer = OptionsLayer {
        remote_branch: args.remote_branch.clone(),
        ..args.selection.layer()
    };
    let options = RunOptions::resolve(&context.settings, layer)?;
    BatchRunner::new(&options).push_all()?;
    println!("{} Branches pushed", emoji(&context.output, "🚀", "[PUSHED]"));
    Ok(())
}
