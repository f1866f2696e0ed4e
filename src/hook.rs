//! # Pre-push Hook
//!
//! Manages the `.git/hooks/pre-push` script of the configs repository. An
//! activated hook re-runs `modsync update` with the last commit message
//! whenever the configs repository is pushed, so template changes reach the
//! modules without a separate step.

use std::fs;
use std::path::{Path, PathBuf};

use log::info;

use crate::error::{Error, Result};

pub const HOOK_NAME: &str = "pre-push";

/// The pre-push hook of one repository.
#[derive(Debug, Clone)]
pub struct Hook {
    path: PathBuf,
    namespace: String,
}

impl Hook {
    /// Locate the hook for the repository at `repo_root`.
    pub fn for_repository(repo_root: &Path, namespace: impl Into<String>) -> Result<Self> {
        let git_dir = find_git_dir(repo_root)?;
        Ok(Self {
            path: git_dir.join("hooks").join(HOOK_NAME),
            namespace: namespace.into(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_active(&self) -> bool {
        self.path.exists()
    }

    /// Script body: namespace flag, branch flag, then `extra_args` verbatim.
    pub fn content(&self, extra_args: &str, branch: Option<&str>) -> String {
        let mut parts = vec![format!("-n {}", self.namespace)];
        if let Some(branch) = branch {
            parts.push(format!("-b {}", branch));
        }
        if !extra_args.trim().is_empty() {
            parts.push(extra_args.trim().to_string());
        }

        format!(
            r#"#!/usr/bin/env bash

current_branch=`git symbolic-ref HEAD | sed -e 's,.*/\(.*\),\1,'`
git_dir=`git rev-parse --show-toplevel`
message=`git log -1 --format=%B`
modsync update -m "$message" {}
"#,
            parts.join(" ")
        )
    }

    /// Write the executable hook script, replacing any previous one.
    pub fn activate(&self, extra_args: &str, branch: Option<&str>) -> Result<()> {
        if let Some(hooks_dir) = self.path.parent() {
            fs::create_dir_all(hooks_dir)?;
        }
        fs::write(&self.path, self.content(extra_args, branch))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o755))?;
        }

        info!("Activated {}", self.path.display());
        Ok(())
    }

    /// Remove the hook script. An absent hook is not an error.
    pub fn deactivate(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                info!("Deactivated {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Find the .git directory for a repository
fn find_git_dir(repo_path: &Path) -> Result<PathBuf> {
    let git_dir = repo_path.join(".git");

    if git_dir.is_dir() {
        Ok(git_dir)
    } else if git_dir.is_file() {
        // Worktree or submodule - .git is a file pointing to the actual git dir
        let content = fs::read_to_string(&git_dir)?;
        let gitdir = content
            .trim()
            .strip_prefix("gitdir: ")
            .ok_or_else(|| Error::Workspace {
                path: git_dir.clone(),
                message: "invalid .git file format".to_string(),
            })?;

        Ok(if Path::new(gitdir).is_absolute() {
            PathBuf::from(gitdir)
        } else {
            repo_path.join(gitdir)
        })
    } else {
        Err(Error::Workspace {
            path: repo_path.to_path_buf(),
            message: "not a Git repository".to_string(),
        })
    }
}
