//! # CLI Command Implementations
//!
//! Each subcommand of `modsync` lives in its own file with:
//! - an `Args` struct derived with `clap`, convertible into an
//!   [`OptionsLayer`] of command-line overrides;
//! - an `execute` function resolving the [`RunOptions`] and calling into the
//!   `modsync` library.
//!
//! [`RunOptions`]: modsync::options::RunOptions

use std::path::PathBuf;

use clap::Args;
use modsync::options::OptionsLayer;

pub mod clone;
pub mod execute;
pub mod hook;
pub mod push;
pub mod reset;
pub mod update;

/// Options selecting the modules and where they live.
#[derive(Args, Debug, Default)]
pub struct SelectionArgs {
    /// Directory holding managed_modules.yml, config_defaults.yml and moduleroot/
    #[arg(short, long, value_name = "DIR")]
    pub configs: Option<PathBuf>,

    /// Module registry file name, relative to the configs directory
    #[arg(long, value_name = "FILE")]
    pub managed_modules_conf: Option<String>,

    /// Directory receiving the working copies
    #[arg(long, value_name = "DIR")]
    pub project_root: Option<PathBuf>,

    /// Namespace of modules without one in their name
    #[arg(short, long)]
    pub namespace: Option<String>,

    /// Base URL remotes are derived from
    #[arg(long, value_name = "URL")]
    pub git_base: Option<String>,

    /// Only act on modules whose name matches this regex
    #[arg(short, long, value_name = "REGEX")]
    pub filter: Option<String>,

    /// Skip modules whose name matches this regex
    #[arg(short = 'x', long, value_name = "REGEX")]
    pub negative_filter: Option<String>,

    /// Branch to operate on
    #[arg(short, long)]
    pub branch: Option<String>,
}

impl SelectionArgs {
    pub fn layer(&self) -> OptionsLayer {
        OptionsLayer {
            configs: self.configs.clone(),
            managed_modules_conf: self.managed_modules_conf.clone(),
            project_root: self.project_root.clone(),
            namespace: self.namespace.clone(),
            git_base: self.git_base.clone(),
            filter: self.filter.clone(),
            negative_filter: self.negative_filter.clone(),
            branch: self.branch.clone(),
            ..Default::default()
        }
    }
}

/// An unset boolean flag must not shadow the settings file.
pub fn flag(value: bool) -> Option<bool> {
    value.then_some(true)
}
