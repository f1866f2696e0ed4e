//! Thin wrappers around the system `git` command.
//!
//! Every function runs `git` inside a working copy and maps a non-zero exit
//! to [`Error::GitCommand`] carrying the stderr output. Using the system
//! binary means SSH keys, credential helpers and `~/.gitconfig` settings are
//! honoured without any extra setup.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use log::debug;

use crate::error::{Error, Result};

/// Outcome of a commit attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitStatus {
    Committed,
    /// The index matched HEAD; git refused to create an empty commit.
    NothingToCommit,
}

/// One record of `git status --porcelain -z`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEntry {
    /// The two-character `XY` status code.
    pub code: String,
    pub path: String,
}

impl StatusEntry {
    pub fn is_untracked(&self) -> bool {
        self.code == "??"
    }

    pub fn is_deleted(&self) -> bool {
        self.code.contains('D')
    }
}

fn output(dir: &Path, args: &[&str]) -> Result<Output> {
    debug!("git {} (in {})", args.join(" "), dir.display());
    Command::new("git")
        .current_dir(dir)
        .args(["-c", "core.quotepath=off"])
        .args(args)
        .env("LC_ALL", "C")
        .output()
        .map_err(|e| Error::GitCommand {
            command: args.join(" "),
            dir: dir.to_path_buf(),
            stderr: e.to_string(),
        })
}

/// Run `git` and return its stdout, failing on a non-zero exit.
fn run(dir: &Path, args: &[&str]) -> Result<String> {
    let out = output(dir, args)?;
    if !out.status.success() {
        return Err(Error::GitCommand {
            command: args.join(" "),
            dir: dir.to_path_buf(),
            stderr: String::from_utf8_lossy(&out.stderr).trim().to_string(),
        });
    }
    Ok(String::from_utf8_lossy(&out.stdout).into_owned())
}

/// Run `git` and return trimmed stdout, or `None` on a non-zero exit.
fn query(dir: &Path, args: &[&str]) -> Result<Option<String>> {
    let out = output(dir, args)?;
    if !out.status.success() {
        return Ok(None);
    }
    let text = String::from_utf8_lossy(&out.stdout).trim().to_string();
    Ok(if text.is_empty() { None } else { Some(text) })
}

/// Clone `url` into `target_dir`, creating parent directories as needed.
pub fn clone(url: &str, target_dir: &Path) -> Result<()> {
    if let Some(parent) = target_dir.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let target = target_dir.to_string_lossy();
    let out = Command::new("git")
        .args(["clone", url, target.as_ref()])
        .output()
        .map_err(|e| Error::GitClone {
            url: url.to_string(),
            message: e.to_string(),
        })?;

    if !out.status.success() {
        let stderr = String::from_utf8_lossy(&out.stderr);
        let message = if stderr.contains("Authentication failed")
            || stderr.contains("Permission denied")
            || stderr.contains("Could not read from remote repository")
        {
            format!(
                "Authentication failed. Make sure you have access to the repository.\n\
                Check your SSH agent, git credentials or access token.\n\
                Error: {}",
                stderr.trim()
            )
        } else {
            stderr.trim().to_string()
        };
        return Err(Error::GitClone {
            url: url.to_string(),
            message,
        });
    }
    Ok(())
}

pub fn fetch(dir: &Path) -> Result<()> {
    run(dir, &["fetch", "--prune", "origin"]).map(|_| ())
}

/// `git reset --hard [target]`.
pub fn reset_hard(dir: &Path, target: Option<&str>) -> Result<()> {
    let mut args = vec!["reset", "--hard"];
    args.extend(target);
    run(dir, &args).map(|_| ())
}

/// Remove untracked files and directories.
pub fn clean(dir: &Path) -> Result<()> {
    run(dir, &["clean", "-d", "-f"]).map(|_| ())
}

/// The checked-out branch, `None` when HEAD is detached.
pub fn current_branch(dir: &Path) -> Result<Option<String>> {
    query(dir, &["symbolic-ref", "--quiet", "--short", "HEAD"])
}

pub fn local_branches(dir: &Path) -> Result<Vec<String>> {
    let out = run(dir, &["for-each-ref", "--format=%(refname)", "refs/heads"])?;
    Ok(strip_refs(&out, "refs/heads/"))
}

/// Branch names known on `origin`, without the `origin/` prefix.
pub fn remote_branches(dir: &Path) -> Result<Vec<String>> {
    let out = run(
        dir,
        &["for-each-ref", "--format=%(refname)", "refs/remotes/origin"],
    )?;
    Ok(strip_refs(&out, "refs/remotes/origin/")
        .into_iter()
        .filter(|b| b != "HEAD")
        .collect())
}

fn strip_refs(out: &str, prefix: &str) -> Vec<String> {
    out.lines()
        .filter_map(|line| line.trim().strip_prefix(prefix))
        .map(str::to_string)
        .collect()
}

/// The branch `origin/HEAD` points to, if the clone recorded one.
pub fn default_branch(dir: &Path) -> Result<Option<String>> {
    Ok(query(dir, &["symbolic-ref", "--quiet", "refs/remotes/origin/HEAD"])?
        .and_then(|r| r.strip_prefix("refs/remotes/origin/").map(str::to_string)))
}

pub fn checkout(dir: &Path, branch: &str) -> Result<()> {
    run(dir, &["checkout", branch]).map(|_| ())
}

/// Create `branch` at `start_point` and check it out.
pub fn checkout_new_branch(dir: &Path, branch: &str, start_point: &str, track: bool) -> Result<()> {
    let track_flag = if track { "--track" } else { "--no-track" };
    run(dir, &["checkout", "-b", branch, track_flag, start_point]).map(|_| ())
}

pub fn status(dir: &Path) -> Result<Vec<StatusEntry>> {
    let out = run(dir, &["status", "--porcelain", "-z", "-uall"])?;
    Ok(parse_status(&out))
}

/// Parse NUL-separated porcelain output. Paths are never quoted in this
/// format; a rename or copy record is followed by its source path, which is
/// dropped so the entry keeps the new path.
pub fn parse_status(output: &str) -> Vec<StatusEntry> {
    let mut entries = Vec::new();
    let mut records = output.split('\0');
    while let Some(record) = records.next() {
        let Some(entry) = parse_status_line(record) else {
            continue;
        };
        if entry.code.contains('R') || entry.code.contains('C') {
            records.next();
        }
        entries.push(entry);
    }
    entries
}

/// Parse one `XY path` record.
pub fn parse_status_line(record: &str) -> Option<StatusEntry> {
    if record.len() < 4 || !record.is_char_boundary(3) {
        return None;
    }
    let (code, path) = record.split_at(3);
    Some(StatusEntry {
        code: code[..2].to_string(),
        path: path.to_string(),
    })
}

/// Working tree and index against HEAD.
pub fn diff_head(dir: &Path) -> Result<String> {
    run(dir, &["diff", "HEAD", "--"])
}

pub fn diff_refs(dir: &Path, from: &str, to: &str) -> Result<String> {
    run(dir, &["diff", from, to, "--"])
}

pub fn add(dir: &Path, path: &str) -> Result<()> {
    run(dir, &["add", "--", path]).map(|_| ())
}

pub fn remove(dir: &Path, path: &str) -> Result<()> {
    run(dir, &["rm", "--quiet", "--", path]).map(|_| ())
}

/// Commit the index. An empty commit is reported, not raised.
pub fn commit(dir: &Path, message: &str, amend: bool) -> Result<CommitStatus> {
    let mut args = vec!["commit", "--message", message];
    if amend {
        args.push("--amend");
    }
    let out = output(dir, &args)?;
    if out.status.success() {
        return Ok(CommitStatus::Committed);
    }

    let stdout = String::from_utf8_lossy(&out.stdout);
    let stderr = String::from_utf8_lossy(&out.stderr);
    if is_nothing_to_commit(&stdout) || is_nothing_to_commit(&stderr) {
        return Ok(CommitStatus::NothingToCommit);
    }
    Err(Error::GitCommand {
        command: "commit".to_string(),
        dir: dir.to_path_buf(),
        stderr: stderr.trim().to_string(),
    })
}

fn is_nothing_to_commit(text: &str) -> bool {
    text.contains("nothing to commit") || text.contains("working tree clean")
}

pub fn push(dir: &Path, remote: &str, refspec: &str, force: bool) -> Result<()> {
    let mut args = vec!["push", remote, refspec];
    if force {
        args.push("--force");
    }
    run(dir, &args).map(|_| ())
}

/// Create an annotated tag on HEAD.
pub fn tag(dir: &Path, name: &str, message: &str) -> Result<()> {
    run(dir, &["tag", "--annotate", name, "--message", message]).map(|_| ())
}
