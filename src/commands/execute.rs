//! # Execute Command Implementation
//!
//! Runs an arbitrary command in each module's working copy, cloning and
//! switching branch first. Build-tool and interpreter variables are removed
//! from the child environment.

use anyhow::Result;
use clap::Args;

use modsync::batch::BatchRunner;
use modsync::options::{OptionsLayer, RunOptions};

use super::{flag, SelectionArgs};
use crate::cli::Context;

/// Run a command in every working copy
#[derive(Args, Debug)]
pub struct ExecuteArgs {
    #[command(flatten)]
    pub selection: SelectionArgs,

    /// Stop at the first failing module
    #[arg(long)]
    pub fail_fast: bool,

    /// Branch to start new branches from when the remote has no default
    #[arg(long, value_name = "BRANCH")]
    pub default_branch: Option<String>,

    /// Command and its arguments
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,
}

/// Execute the `execute` command
pub fn execute(args: ExecuteArgs, context: &Context) -> Result<()> {
    let layer = OptionsLayer {
        fail_fast: flag(args.fail_fast),
        default_branch: args.default_branch.clone(),
        ..args.selection.layer()
    };
    let options = RunOptions::resolve(&context.settings, layer)?;
    BatchRunner::new(&options).execute(&args.command)?;
    Ok(())
}
