//! Pull request creation.
//!
//! The orchestrator only needs "open a pull request for this branch"; the
//! [`PullRequestOpener`] trait keeps the forge behind that one call. The
//! default implementation drives the GitHub CLI.

use std::path::Path;
use std::process::Command;

use log::{debug, info};

use crate::error::{Error, Result};

/// What to open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequest {
    pub title: String,
    pub body: String,
    pub head_branch: String,
    /// Base branch; the forge's default branch when `None`.
    pub target_branch: Option<String>,
    pub labels: Vec<String>,
}

pub trait PullRequestOpener: Send + Sync {
    /// Open `request` for the working copy at `repository_path`.
    fn open(&self, repository_path: &Path, request: &PullRequest) -> Result<()>;
}

/// Opens pull requests with `gh pr create`.
pub struct GhCliOpener;

impl GhCliOpener {
    fn arguments(request: &PullRequest) -> Vec<String> {
        let mut args = vec![
            "pr".to_string(),
            "create".to_string(),
            "--title".to_string(),
            request.title.clone(),
            "--body".to_string(),
            request.body.clone(),
            "--head".to_string(),
            request.head_branch.clone(),
        ];
        if let Some(target) = &request.target_branch {
            args.push("--base".to_string());
            args.push(target.clone());
        }
        for label in &request.labels {
            args.push("--label".to_string());
            args.push(label.clone());
        }
        args
    }
}

impl PullRequestOpener for GhCliOpener {
    fn open(&self, repository_path: &Path, request: &PullRequest) -> Result<()> {
        let args = Self::arguments(request);
        debug!("gh {}", args.join(" "));
        let repository = repository_path.display().to_string();
        let out = Command::new("gh")
            .current_dir(repository_path)
            .args(&args)
            .output()
            .map_err(|e| Error::PullRequest {
                repository: repository.clone(),
                message: format!("unable to run gh: {}", e),
            })?;

        if !out.status.success() {
            return Err(Error::PullRequest {
                repository,
                message: String::from_utf8_lossy(&out.stderr).trim().to_string(),
            });
        }
        info!(
            "Submitted pull request {}",
            String::from_utf8_lossy(&out.stdout).trim()
        );
        Ok(())
    }
}
