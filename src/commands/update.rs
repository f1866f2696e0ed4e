//! # Update Command Implementation
//!
//! Renders the templates into every selected module and commits and pushes
//! the result. With `--noop` the changes are only shown; with `--offline`
//! nothing touches the network and nothing is committed.
//!
//! After a real push, `--bump` increments the module version (and
//! `--changelog` records it), `--tag` tags the release and `--pr` opens a
//! pull request.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use modsync::options::{OptionsLayer, RunOptions};
use modsync::output::{self, emoji};
use modsync::sync::{ModuleOutcome, Synchronizer};

use super::{flag, SelectionArgs};
use crate::cli::Context;

/// Sync templated files into every module
#[derive(Args, Debug, Default)]
pub struct UpdateArgs {
    #[command(flatten)]
    pub selection: SelectionArgs,

    /// Commit message
    #[arg(short, long)]
    pub message: Option<String>,

    /// Render and show changes without committing
    #[arg(long)]
    pub noop: bool,

    /// Skip every network operation and do not commit
    #[arg(long)]
    pub offline: bool,

    /// Skip modules that fail instead of aborting
    #[arg(long)]
    pub skip_broken: bool,

    /// Exit non-zero when any module was skipped
    #[arg(long)]
    pub fail_on_warnings: bool,

    /// Bump the module version after pushing
    #[arg(long)]
    pub bump: bool,

    /// Add a CHANGELOG.md entry for the bumped version
    #[arg(long)]
    pub changelog: bool,

    /// Tag the bumped version
    #[arg(long)]
    pub tag: bool,

    /// Tag name pattern; `%s` is replaced by the version
    #[arg(long, value_name = "PATTERN")]
    pub tag_pattern: Option<String>,

    /// Open a pull request after pushing
    #[arg(long)]
    pub pr: bool,

    /// Pull request title (defaults to the commit message)
    #[arg(long)]
    pub pr_title: Option<String>,

    /// Comma-separated pull request labels
    #[arg(long, value_delimiter = ',')]
    pub pr_labels: Vec<String>,

    /// Base branch of the pull request
    #[arg(long, value_name = "BRANCH")]
    pub pr_target_branch: Option<String>,

    /// Amend the previous commit instead of creating one
    #[arg(long)]
    pub amend: bool,

    /// Force-push
    #[arg(long)]
    pub force: bool,

    /// Script run with the working copy path before committing
    #[arg(long, value_name = "FILE")]
    pub pre_commit_script: Option<PathBuf>,

    /// Push to this remote branch instead of the local branch name
    #[arg(short, long, value_name = "BRANCH")]
    pub remote_branch: Option<String>,

    /// Branch to start new branches from when the remote has no default
    #[arg(long, value_name = "BRANCH")]
    pub default_branch: Option<String>,
}

impl UpdateArgs {
    fn layer(&self) -> OptionsLayer {
        OptionsLayer {
            message: self.message.clone(),
            noop: flag(self.noop),
            offline: flag(self.offline),
            skip_broken: flag(self.skip_broken),
            fail_on_warnings: flag(self.fail_on_warnings),
            bump: flag(self.bump),
            changelog: flag(self.changelog),
            tag: flag(self.tag),
            tag_pattern: self.tag_pattern.clone(),
            pr: flag(self.pr),
            pr_title: self.pr_title.clone(),
            pr_labels: (!self.pr_labels.is_empty()).then(|| self.pr_labels.clone()),
            pr_target_branch: self.pr_target_branch.clone(),
            amend: flag(self.amend),
            force: flag(self.force),
            pre_commit_script: self.pre_commit_script.clone(),
            remote_branch: self.remote_branch.clone(),
            default_branch: self.default_branch.clone(),
            ..self.selection.layer()
        }
    }
}

/// Execute the `update` command
pub fn execute(args: UpdateArgs, context: &Context) -> Result<()> {
    let options = RunOptions::resolve(&context.settings, args.layer())?;
    let summary = Synchronizer::new(&options).update()?;
    let out = &context.output;

    for report in &summary.modules {
        println!("{}", output::module_line(out, report));
        for file in &report.unmanaged {
            println!("    {} not managing '{}'", emoji(out, "⏭️", "-"), file);
        }
        if let ModuleOutcome::Previewed(changes) = &report.outcome {
            if !changes.diff.trim().is_empty() {
                println!("{}", changes.diff.trim_end());
            }
            for file in &changes.added {
                println!("    {} new file '{}'", emoji(out, "➕", "+"), file);
            }
        }
    }

    summary.enforce(options.fail_on_warnings)?;
    Ok(())
}
