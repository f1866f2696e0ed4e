//! # Clone Command Implementation
//!
//! Clones every selected module that has no working copy yet. Existing
//! working copies are left untouched.

use anyhow::Result;
use clap::Args;

use modsync::batch::BatchRunner;
use modsync::options::RunOptions;
use modsync::output::emoji;

use super::SelectionArgs;
use crate::cli::Context;

/// Clone missing working copies
#[derive(Args, Debug)]
pub struct CloneArgs {
    #[command(flatten)]
    pub selection: SelectionArgs,
}

/// Execute the `clone` command
pub fn execute(args: CloneArgs, context: &Context) -> Result<()> {
    let options = RunOptions::resolve(&context.settings, args.selection.layer())?;
    let cloned = BatchRunner::new(&options).clone_all()?;

    for name in &cloned {
        println!("{} cloned {}", emoji(&context.output, "📥", "[CLONED]"), name);
    }
    if cloned.is_empty() {
        println!("All working copies already present.");
    }
    Ok(())
}
