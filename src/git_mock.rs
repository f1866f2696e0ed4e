//! Recording test double for [`GitOperations`].
//!
//! Mutating calls are recorded as short command strings (`"checkout main"`,
//! `"push --force origin a:b"`) so tests can assert on exact sequences.
//! Queries answer from configurable in-memory state; `clone_repo` creates the
//! target's `.git` directory so the workspace reads as cloned afterwards.

use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::error::{Error, Result};
use crate::git::{parse_status_line, CommitStatus, StatusEntry};
use crate::repository::GitOperations;

#[derive(Default)]
pub struct MockGitOperations {
    calls: Arc<Mutex<Vec<String>>>,
    current_branch: Mutex<Option<String>>,
    local_branches: Mutex<Vec<String>>,
    remote_branches: Vec<String>,
    default_branch: Option<String>,
    status: Vec<StatusEntry>,
    diff: String,
    nothing_to_commit: bool,
    fail_on: Option<String>,
}

impl MockGitOperations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_current_branch(self, branch: &str) -> Self {
        *self.current_branch.lock().unwrap() = Some(branch.to_string());
        self.local_branches.lock().unwrap().push(branch.to_string());
        self
    }

    pub fn with_local_branches(self, branches: &[&str]) -> Self {
        {
            let mut local = self.local_branches.lock().unwrap();
            for branch in branches {
                if !local.iter().any(|b| b == branch) {
                    local.push(branch.to_string());
                }
            }
        }
        self
    }

    pub fn with_remote_branches(mut self, branches: &[&str]) -> Self {
        self.remote_branches = branches.iter().map(|b| b.to_string()).collect();
        self
    }

    pub fn with_default_branch(mut self, branch: &str) -> Self {
        self.default_branch = Some(branch.to_string());
        self
    }

    /// Porcelain status lines, e.g. `"?? new.txt"`.
    pub fn with_status(mut self, lines: &[&str]) -> Self {
        self.status = lines.iter().filter_map(|l| parse_status_line(l)).collect();
        self
    }

    pub fn with_diff(mut self, diff: &str) -> Self {
        self.diff = diff.to_string();
        self
    }

    pub fn with_nothing_to_commit(mut self) -> Self {
        self.nothing_to_commit = true;
        self
    }

    /// Fail every recorded call starting with `prefix`.
    pub fn failing_on(mut self, prefix: &str) -> Self {
        self.fail_on = Some(prefix.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Shared handle on the call log, still readable after the mock is boxed.
    pub fn call_log(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.calls)
    }

    fn record(&self, dir: &Path, call: String) -> Result<()> {
        let failing = self
            .fail_on
            .as_deref()
            .is_some_and(|prefix| call.starts_with(prefix));
        self.calls.lock().unwrap().push(call.clone());
        if failing {
            return Err(Error::GitCommand {
                command: call,
                dir: dir.to_path_buf(),
                stderr: "simulated failure".to_string(),
            });
        }
        Ok(())
    }

    fn set_current(&self, branch: &str) {
        *self.current_branch.lock().unwrap() = Some(branch.to_string());
        let mut local = self.local_branches.lock().unwrap();
        if !local.iter().any(|b| b == branch) {
            local.push(branch.to_string());
        }
    }
}

impl GitOperations for MockGitOperations {
    fn clone_repo(&self, url: &str, target_dir: &Path) -> Result<()> {
        self.record(target_dir, format!("clone {}", url))?;
        fs::create_dir_all(target_dir.join(".git"))?;
        if let Some(branch) = &self.default_branch {
            self.set_current(branch);
        }
        Ok(())
    }

    fn fetch(&self, dir: &Path) -> Result<()> {
        self.record(dir, "fetch".to_string())
    }

    fn reset_hard(&self, dir: &Path, target: Option<&str>) -> Result<()> {
        match target {
            Some(target) => self.record(dir, format!("reset --hard {}", target)),
            None => self.record(dir, "reset --hard".to_string()),
        }
    }

    fn clean(&self, dir: &Path) -> Result<()> {
        self.record(dir, "clean".to_string())
    }

    fn current_branch(&self, _dir: &Path) -> Result<Option<String>> {
        Ok(self.current_branch.lock().unwrap().clone())
    }

    fn local_branches(&self, _dir: &Path) -> Result<Vec<String>> {
        Ok(self.local_branches.lock().unwrap().clone())
    }

    fn remote_branches(&self, _dir: &Path) -> Result<Vec<String>> {
        Ok(self.remote_branches.clone())
    }

    fn default_branch(&self, _dir: &Path) -> Result<Option<String>> {
        Ok(self.default_branch.clone())
    }

    fn checkout(&self, dir: &Path, branch: &str) -> Result<()> {
        self.record(dir, format!("checkout {}", branch))?;
        self.set_current(branch);
        Ok(())
    }

    fn checkout_new_branch(&self, dir: &Path, branch: &str, start_point: &str, track: bool) -> Result<()> {
        let flag = if track { "--track" } else { "--no-track" };
        self.record(dir, format!("checkout -b {} {} {}", branch, flag, start_point))?;
        self.set_current(branch);
        Ok(())
    }

    fn status(&self, _dir: &Path) -> Result<Vec<StatusEntry>> {
        Ok(self.status.clone())
    }

    fn diff_head(&self, _dir: &Path) -> Result<String> {
        Ok(self.diff.clone())
    }

    fn diff_refs(&self, _dir: &Path, _from: &str, _to: &str) -> Result<String> {
        Ok(String::new())
    }

    fn add(&self, dir: &Path, path: &str) -> Result<()> {
        self.record(dir, format!("add {}", path))
    }

    fn remove(&self, dir: &Path, path: &str) -> Result<()> {
        self.record(dir, format!("rm {}", path))
    }

    fn commit(&self, dir: &Path, message: &str, amend: bool) -> Result<CommitStatus> {
        let call = if amend {
            format!("commit --amend {}", message)
        } else {
            format!("commit {}", message)
        };
        self.record(dir, call)?;
        Ok(if self.nothing_to_commit {
            CommitStatus::NothingToCommit
        } else {
            CommitStatus::Committed
        })
    }

    fn push(&self, dir: &Path, remote: &str, refspec: &str, force: bool) -> Result<()> {
        let call = if force {
            format!("push --force {} {}", remote, refspec)
        } else {
            format!("push {} {}", remote, refspec)
        };
        self.record(dir, call)
    }

    fn tag(&self, dir: &Path, name: &str, message: &str) -> Result<()> {
        self.record(dir, format!("tag {} {}", name, message))
    }
}
