//! CLI argument parsing and command dispatch

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use modsync::defaults::SETTINGS_FILE;
use modsync::output::OutputConfig;

use crate::commands;

/// modsync - Keep shared files in sync across many Git repositories
#[derive(Parser, Debug)]
#[command(name = "modsync")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL", default_value = "info")]
    log_level: String,

    /// Run settings file providing default option values
    #[arg(long, global = true, value_name = "FILE", default_value = SETTINGS_FILE)]
    settings: PathBuf,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render templates into every module, then commit and push
    Update(commands::update::UpdateArgs),

    /// Clone every module that has no working copy yet
    Clone(commands::clone::CloneArgs),

    /// Run a command in every module's working copy
    Execute(commands::execute::ExecuteArgs),

    /// Reset every working copy to its remote branch
    Reset(commands::reset::ResetArgs),

    /// Force-push the branch of every module
    Push(commands::push::PushArgs),

    /// Manage the pre-push hook of the configs repository
    Hook(commands::hook::HookArgs),
}

/// Values shared by every command.
#[derive(Debug)]
pub struct Context {
    pub settings: PathBuf,
    pub output: OutputConfig,
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        let env = env_logger::Env::default().default_filter_or(self.log_level.as_str());
        let _ = env_logger::Builder::from_env(env)
            .format_timestamp(None)
            .format_target(false)
            .try_init();

        let context = Context {
            settings: self.settings,
            output: OutputConfig::from_env_and_flag(&self.color),
        };

        match self.command {
            Commands::Update(args) => commands::update::execute(args, &context),
            Commands::Clone(args) => commands::clone::execute(args, &context),
            Commands::Execute(args) => commands::execute::execute(args, &context),
            Commands::Reset(args) => commands::reset::execute(args, &context),
            Commands::Push(args) => commands::push::execute(args, &context),
            Commands::Hook(args) => commands::hook::execute(args, &context),
        }
    }
}
