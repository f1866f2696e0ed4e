//! # Repository Controller
//!
//! This module provides [`Repository`], the controller for one module's
//! working copy. It owns the workspace state machine:
//!
//! ```text
//! Absent -> Cloned -> BranchSynced -> {Clean, Dirty}
//! ```
//!
//! ## Design
//!
//! Git access goes through the [`GitOperations`] trait so the state machine
//! can be exercised without a real repository or network. In the main
//! application [`DefaultGitOperations`] forwards to [`crate::git`], which
//! shells out to the system `git`; tests substitute a recording mock.
//!
//! "Nothing to commit" is the only version-control outcome that is not an
//! error: [`Repository::submit_changes`] reports it as `Ok(false)` so callers
//! skip bump, tag and pull request steps.

use std::path::{Path, PathBuf};
use std::process::Command;

use glob::Pattern;
use log::{debug, info, warn};
use semver::Version;

use crate::defaults::FALLBACK_BRANCH;
use crate::error::{Error, Result};
use crate::git::{CommitStatus, StatusEntry};
use crate::release;

const REMOTE: &str = "origin";

/// Trait for git operations - allows mocking in tests
pub trait GitOperations: Send + Sync {
    fn clone_repo(&self, url: &str, target_dir: &Path) -> Result<()>;
    fn fetch(&self, dir: &Path) -> Result<()>;
    fn reset_hard(&self, dir: &Path, target: Option<&str>) -> Result<()>;
    fn clean(&self, dir: &Path) -> Result<()>;
    fn current_branch(&self, dir: &Path) -> Result<Option<String>>;
    fn local_branches(&self, dir: &Path) -> Result<Vec<String>>;
    /// Branches on `origin`, without the remote prefix.
    fn remote_branches(&self, dir: &Path) -> Result<Vec<String>>;
    fn default_branch(&self, dir: &Path) -> Result<Option<String>>;
    fn checkout(&self, dir: &Path, branch: &str) -> Result<()>;
    fn checkout_new_branch(&self, dir: &Path, branch: &str, start_point: &str, track: bool) -> Result<()>;
    fn status(&self, dir: &Path) -> Result<Vec<StatusEntry>>;
    fn diff_head(&self, dir: &Path) -> Result<String>;
    fn diff_refs(&self, dir: &Path, from: &str, to: &str) -> Result<String>;
    fn add(&self, dir: &Path, path: &str) -> Result<()>;
    fn remove(&self, dir: &Path, path: &str) -> Result<()>;
    fn commit(&self, dir: &Path, message: &str, amend: bool) -> Result<CommitStatus>;
    fn push(&self, dir: &Path, remote: &str, refspec: &str, force: bool) -> Result<()>;
    fn tag(&self, dir: &Path, name: &str, message: &str) -> Result<()>;
}

/// The default implementation of `GitOperations`, which uses the system's
/// `git` command to perform real Git operations.
pub struct DefaultGitOperations;

impl GitOperations for DefaultGitOperations {
    fn clone_repo(&self, url: &str, target_dir: &Path) -> Result<()> {
        crate::git::clone(url, target_dir)
    }

    fn fetch(&self, dir: &Path) -> Result<()> {
        crate::git::fetch(dir)
    }

    fn reset_hard(&self, dir: &Path, target: Option<&str>) -> Result<()> {
        crate::git::reset_hard(dir, target)
    }

    fn clean(&self, dir: &Path) -> Result<()> {
        crate::git::clean(dir)
    }

    fn current_branch(&self, dir: &Path) -> Result<Option<String>> {
        crate::git::current_branch(dir)
    }

    fn local_branches(&self, dir: &Path) -> Result<Vec<String>> {
        crate::git::local_branches(dir)
    }

    fn remote_branches(&self, dir: &Path) -> Result<Vec<String>> {
        crate::git::remote_branches(dir)
    }

    fn default_branch(&self, dir: &Path) -> Result<Option<String>> {
        crate::git::default_branch(dir)
    }

    fn checkout(&self, dir: &Path, branch: &str) -> Result<()> {
        crate::git::checkout(dir, branch)
    }

    fn checkout_new_branch(&self, dir: &Path, branch: &str, start_point: &str, track: bool) -> Result<()> {
        crate::git::checkout_new_branch(dir, branch, start_point, track)
    }

    fn status(&self, dir: &Path) -> Result<Vec<StatusEntry>> {
        crate::git::status(dir)
    }

    fn diff_head(&self, dir: &Path) -> Result<String> {
        crate::git::diff_head(dir)
    }

    fn diff_refs(&self, dir: &Path, from: &str, to: &str) -> Result<String> {
        crate::git::diff_refs(dir, from, to)
    }

    fn add(&self, dir: &Path, path: &str) -> Result<()> {
        crate::git::add(dir, path)
    }

    fn remove(&self, dir: &Path, path: &str) -> Result<()> {
        crate::git::remove(dir, path)
    }

    fn commit(&self, dir: &Path, message: &str, amend: bool) -> Result<CommitStatus> {
        crate::git::commit(dir, message, amend)
    }

    fn push(&self, dir: &Path, remote: &str, refspec: &str, force: bool) -> Result<()> {
        crate::git::push(dir, remote, refspec, force)
    }

    fn tag(&self, dir: &Path, name: &str, message: &str) -> Result<()> {
        crate::git::tag(dir, name, message)
    }
}

/// Where a working copy stands in the workspace state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkspaceState {
    Absent,
    /// Cloned, with a detached or not yet selected HEAD.
    Cloned,
    BranchSynced(String),
}

/// Result of the dry-run inspection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeReport {
    /// Working tree and index against HEAD.
    pub diff: String,
    /// Untracked files that no ignore pattern matches.
    pub added: Vec<String>,
}

impl ChangeReport {
    pub fn has_changes(&self) -> bool {
        !self.diff.trim().is_empty() || !self.added.is_empty()
    }
}

/// Parameters of a commit-and-push.
#[derive(Debug, Clone, Default)]
pub struct SubmitOptions<'a> {
    pub branch: &'a str,
    pub message: &'a str,
    pub remote_branch: Option<&'a str>,
    pub default_branch: Option<&'a str>,
    pub amend: bool,
    pub force: bool,
    pub pre_commit_script: Option<&'a Path>,
}

impl SubmitOptions<'_> {
    /// `branch` or `branch:remote_branch`.
    pub fn refspec(&self) -> String {
        refspec(self.branch, self.remote_branch)
    }
}

fn refspec(branch: &str, remote_branch: Option<&str>) -> String {
    match remote_branch {
        Some(remote) => format!("{}:{}", branch, remote),
        None => branch.to_string(),
    }
}

/// Controller for one module's working copy.
pub struct Repository<'a> {
    directory: PathBuf,
    remote: String,
    git: &'a dyn GitOperations,
}

impl<'a> Repository<'a> {
    pub fn new(git: &'a dyn GitOperations, directory: impl Into<PathBuf>, remote: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            remote: remote.into(),
            git,
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn remote(&self) -> &str {
        &self.remote
    }

    pub fn is_cloned(&self) -> bool {
        self.directory.join(".git").exists()
    }

    pub fn state(&self) -> Result<WorkspaceState> {
        if !self.is_cloned() {
            return Ok(WorkspaceState::Absent);
        }
        Ok(match self.git.current_branch(&self.directory)? {
            Some(branch) => WorkspaceState::BranchSynced(branch),
            None => WorkspaceState::Cloned,
        })
    }

    pub fn clone_repo(&self) -> Result<()> {
        info!("Cloning from '{}'", self.remote);
        self.git.clone_repo(&self.remote, &self.directory)
    }

    pub fn remote_branch_exists(&self, branch: &str) -> Result<bool> {
        Ok(self
            .git
            .remote_branches(&self.directory)?
            .iter()
            .any(|b| b == branch))
    }

    fn local_branch_exists(&self, branch: &str) -> Result<bool> {
        Ok(self
            .git
            .local_branches(&self.directory)?
            .iter()
            .any(|b| b == branch))
    }

    /// The remote default branch, then `fallback`, then the checked-out
    /// branch, then `master`.
    pub fn default_branch(&self, fallback: Option<&str>) -> Result<String> {
        if let Some(branch) = self.git.default_branch(&self.directory)? {
            return Ok(branch);
        }
        if let Some(branch) = fallback {
            return Ok(branch.to_string());
        }
        Ok(self
            .git
            .current_branch(&self.directory)?
            .unwrap_or_else(|| FALLBACK_BRANCH.to_string()))
    }

    /// Check out `branch`, creating it when needed, and return its name.
    ///
    /// Without a branch the remote default branch is used. A branch missing
    /// locally is created tracking `origin/<branch>` when the remote has it,
    /// otherwise from the tip of the remote default branch.
    pub fn switch(&self, branch: Option<&str>, fallback: Option<&str>) -> Result<String> {
        let target = match branch {
            Some(branch) => branch.to_string(),
            None => self.default_branch(fallback)?,
        };

        if self.git.current_branch(&self.directory)?.as_deref() == Some(target.as_str()) {
            debug!("Already on branch '{}'", target);
            return Ok(target);
        }

        if self.local_branch_exists(&target)? {
            info!("Switching to branch '{}'", target);
            self.git.checkout(&self.directory, &target)?;
        } else if self.remote_branch_exists(&target)? {
            info!("Creating local branch '{}' from '{}/{}'", target, REMOTE, target);
            self.git.checkout_new_branch(
                &self.directory,
                &target,
                &format!("{}/{}", REMOTE, target),
                true,
            )?;
        } else {
            let base = self.default_branch(fallback)?;
            info!("Creating new branch '{}' from '{}/{}'", target, REMOTE, base);
            self.git.checkout_new_branch(
                &self.directory,
                &target,
                &format!("{}/{}", REMOTE, base),
                false,
            )?;
        }
        Ok(target)
    }

    /// Bring the working copy to a clean checkout of `branch`.
    ///
    /// An existing clone is fetched and hard-reset so no local drift survives;
    /// an absent one is cloned. Offline mode skips every network call and
    /// fails when there is nothing local to work on.
    pub fn prepare_workspace(&self, branch: Option<&str>, fallback: Option<&str>, offline: bool) -> Result<String> {
        if self.is_cloned() {
            if !offline {
                debug!("Fetching {}", self.directory.display());
                self.git.fetch(&self.directory)?;
            }
            self.git.reset_hard(&self.directory, None)?;
            let branch = self.switch(branch, fallback)?;
            if !offline && self.remote_branch_exists(&branch)? {
                self.git
                    .reset_hard(&self.directory, Some(&format!("{}/{}", REMOTE, branch)))?;
            }
            Ok(branch)
        } else {
            if offline {
                return Err(Error::Workspace {
                    path: self.directory.clone(),
                    message: "Unable to clone in offline mode.".to_string(),
                });
            }
            self.clone_repo()?;
            self.switch(branch, fallback)
        }
    }

    /// Diff against HEAD plus untracked, unignored files. Read-only.
    pub fn show_changes(&self) -> Result<ChangeReport> {
        Ok(ChangeReport {
            diff: self.git.diff_head(&self.directory)?,
            added: self.untracked_unignored_files()?,
        })
    }

    /// Untracked files, filtered against `.gitignore` independently of what
    /// `git status` reports.
    pub fn untracked_unignored_files(&self) -> Result<Vec<String>> {
        let patterns = self.ignore_patterns()?;
        Ok(self
            .git
            .status(&self.directory)?
            .into_iter()
            .filter(StatusEntry::is_untracked)
            .map(|entry| entry.path)
            .filter(|path| !is_ignored(&patterns, path))
            .collect())
    }

    fn ignore_patterns(&self) -> Result<Vec<IgnoreRule>> {
        let path = self.directory.join(".gitignore");
        if !path.exists() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(path)?;
        Ok(parse_ignore_patterns(&content))
    }

    /// Stage `files`, commit and push.
    ///
    /// Returns `Ok(false)` when there was nothing to commit; no push happens
    /// then.
    pub fn submit_changes(&self, files: &[String], options: &SubmitOptions<'_>) -> Result<bool> {
        self.switch(Some(options.branch), options.default_branch)?;

        let status = self.git.status(&self.directory)?;
        for file in files {
            if self.directory.join(file).exists() {
                self.git.add(&self.directory, file)?;
            } else if status.iter().any(|e| e.path == *file && e.is_deleted()) {
                self.git.remove(&self.directory, file)?;
            }
        }

        if let Some(script) = options.pre_commit_script {
            run_pre_commit_script(script, &self.directory);
        }

        if self.git.commit(&self.directory, options.message, options.amend)?
            == CommitStatus::NothingToCommit
        {
            info!("There were no changes in '{}'. Not committing.", self.directory.display());
            return Ok(false);
        }

        if let Some(remote_branch) = options.remote_branch {
            if self.remote_branch_exists(remote_branch)?
                && self
                    .git
                    .diff_refs(
                        &self.directory,
                        options.branch,
                        &format!("{}/{}", REMOTE, remote_branch),
                    )?
                    .trim()
                    .is_empty()
            {
                info!(
                    "Remote branch '{}' already matches '{}'. Not pushing.",
                    remote_branch, options.branch
                );
                return Ok(true);
            }
        }

        let refspec = options.refspec();
        self.git
            .push(&self.directory, REMOTE, &refspec, options.force)?;
        info!("Changes have been pushed to '{}'", refspec);
        Ok(true)
    }

    /// Bump `metadata.json`, optionally update the changelog, commit and push.
    pub fn bump(&self, message: &str, changelog: bool, options: &SubmitOptions<'_>) -> Result<Version> {
        let version = release::bump_metadata(&self.directory)?;
        self.git.add(&self.directory, release::METADATA_FILE)?;

        if changelog {
            let today = chrono::Local::now().date_naive();
            if release::update_changelog(&self.directory, &version, message, today)? {
                self.git.add(&self.directory, release::CHANGELOG_FILE)?;
            }
        }

        let commit_message = format!("Release version {}", version);
        if self.git.commit(&self.directory, &commit_message, false)?
            == CommitStatus::NothingToCommit
        {
            return Err(Error::Release {
                message: format!("version bump to {} produced no commit", version),
            });
        }
        self.git
            .push(&self.directory, REMOTE, &options.refspec(), options.force)?;
        Ok(version)
    }

    /// Create an annotated tag for `version` and push it.
    pub fn tag(&self, version: &Version, tag_pattern: &str) -> Result<String> {
        let name = release::tag_name(tag_pattern, version)?;
        info!("Tagging with {}", name);
        self.git
            .tag(&self.directory, &name, &format!("Version {}", version))?;
        self.git.push(
            &self.directory,
            REMOTE,
            &format!("refs/tags/{}", name),
            false,
        )?;
        Ok(name)
    }

    /// Force-push `branch` to `remote_branch` (or the same name).
    pub fn push(&self, branch: &str, remote_branch: Option<&str>) -> Result<()> {
        if !self.is_cloned() {
            return Err(Error::Workspace {
                path: self.directory.clone(),
                message: "Repository must be locally available before trying to push".to_string(),
            });
        }
        let refspec = refspec(branch, remote_branch);
        info!("Pushing '{}' to {}", refspec, REMOTE);
        self.git.push(&self.directory, REMOTE, &refspec, true)
    }

    /// Prepare, hard-reset to `source_branch` (or the remote branch) and
    /// remove untracked files.
    pub fn reset_workspace(
        &self,
        branch: &str,
        source_branch: Option<&str>,
        fallback: Option<&str>,
        offline: bool,
    ) -> Result<()> {
        let branch = self.prepare_workspace(Some(branch), fallback, offline)?;
        let target = match source_branch {
            Some(source) => source.to_string(),
            None if self.remote_branch_exists(&branch)? => format!("{}/{}", REMOTE, branch),
            None => format!("{}/{}", REMOTE, self.default_branch(fallback)?),
        };
        info!("Resetting {} to '{}'", self.directory.display(), target);
        self.git.reset_hard(&self.directory, Some(&target))?;
        self.git.clean(&self.directory)
    }
}

/// Run the pre-commit script with the working copy as its only argument.
/// Failure is reported but does not stop the commit.
fn run_pre_commit_script(script: &Path, workdir: &Path) {
    info!("Running pre-commit script {}", script.display());
    match Command::new(script).arg(workdir).status() {
        Ok(status) if status.success() => {}
        Ok(status) => warn!(
            "Pre-commit script {} exited with {}",
            script.display(),
            status
        ),
        Err(e) => warn!("Unable to run pre-commit script {}: {}", script.display(), e),
    }
}

/// One compiled `.gitignore` line.
#[derive(Debug, Clone)]
pub struct IgnoreRule {
    pattern: Pattern,
    negated: bool,
    anchored: bool,
    directory_only: bool,
}

impl IgnoreRule {
    /// Whether the rule matches `path` itself or one of its parent
    /// directories.
    fn matches(&self, path: &str) -> bool {
        let components: Vec<&str> = path.split('/').filter(|c| !c.is_empty()).collect();
        let last = components.len().saturating_sub(1);
        (0..components.len())
            .filter(|&i| !self.directory_only || i < last)
            .any(|i| {
                if self.anchored {
                    self.pattern.matches(&components[..=i].join("/"))
                } else {
                    self.pattern.matches(components[i])
                }
            })
    }
}

/// Compile `.gitignore` lines. Comments and invalid globs are skipped.
///
/// A leading or inner `/` anchors a pattern to the repository root; other
/// patterns match a file or directory name at any depth. A trailing `/`
/// restricts the pattern to directories. `!` re-includes, and the last
/// matching rule wins. Unlike git, a negation can re-include a file inside an
/// excluded directory.
pub fn parse_ignore_patterns(content: &str) -> Vec<IgnoreRule> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let (negated, line) = match line.strip_prefix('!') {
                Some(rest) => (true, rest),
                None => (false, line),
            };
            let directory_only = line.ends_with('/');
            let line = line.trim_end_matches('/');
            let anchored = line.contains('/');
            let line = line.trim_start_matches('/');
            if line.is_empty() {
                return None;
            }
            Pattern::new(line).ok().map(|pattern| IgnoreRule {
                pattern,
                negated,
                anchored,
                directory_only,
            })
        })
        .collect()
}

/// Whether the last rule matching `path` ignores it.
pub fn is_ignored(rules: &[IgnoreRule], path: &str) -> bool {
    rules
        .iter()
        .rev()
        .find(|rule| rule.matches(path))
        .is_some_and(|rule| !rule.negated)
}
