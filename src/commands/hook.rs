//! # Hook Command Implementation
//!
//! Installs or removes the pre-push hook of the configs repository. Once
//! activated, every push of the configs repository runs `modsync update`
//! with the message of the last commit.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Subcommand};

use modsync::hook::Hook;
use modsync::options::{OptionsLayer, RunOptions};
use modsync::output::emoji;

use crate::cli::Context;

/// Manage the pre-push hook
#[derive(Args, Debug)]
pub struct HookArgs {
    #[command(subcommand)]
    pub command: HookCommand,
}

#[derive(Subcommand, Debug)]
pub enum HookCommand {
    /// Install the hook, replacing any existing one
    Activate(ActivateArgs),

    /// Remove the hook
    Deactivate(DeactivateArgs),
}

#[derive(Args, Debug)]
pub struct ActivateArgs {
    /// Extra arguments appended to the `modsync update` call
    #[arg(short = 'a', long, value_name = "ARGS", allow_hyphen_values = true)]
    pub hook_args: Option<String>,

    /// Branch the hook pushes to
    #[arg(short, long)]
    pub branch: Option<String>,

    /// Namespace passed to the hook's update call
    #[arg(short, long)]
    pub namespace: Option<String>,

    /// Configs repository the hook is installed into
    #[arg(short, long, value_name = "DIR")]
    pub configs: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct DeactivateArgs {
    /// Configs repository the hook is removed from
    #[arg(short, long, value_name = "DIR")]
    pub configs: Option<PathBuf>,
}

/// Execute the `hook` command
pub fn execute(args: HookArgs, context: &Context) -> Result<()> {
    match args.command {
        HookCommand::Activate(args) => {
            let layer = OptionsLayer {
                configs: args.configs,
                namespace: args.namespace,
                branch: args.branch,
                ..Default::default()
            };
            let options = RunOptions::resolve(&context.settings, layer)?;
            let hook = Hook::for_repository(&options.configs, options.namespace.as_str())?;
            hook.activate(args.hook_args.as_deref().unwrap_or(""), options.branch.as_deref())?;
            println!(
                "{} Hook installed at {}",
                emoji(&context.output, "🪝", "[HOOK]"),
                hook.path().display()
            );
        }
        HookCommand::Deactivate(args) => {
            let layer = OptionsLayer {
                configs: args.configs,
                ..Default::default()
            };
            let options = RunOptions::resolve(&context.settings, layer)?;
            let hook = Hook::for_repository(&options.configs, options.namespace.as_str())?;
            hook.deactivate()?;
            println!(
                "{} Hook removed from {}",
                emoji(&context.output, "🪝", "[HOOK]"),
                hook.path().display()
            );
        }
    }
    Ok(())
}
