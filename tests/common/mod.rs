//! Shared test utilities for the E2E tests.
//!
//! ## Usage
//!
//! Add `mod common;` to your test file, then use the helpers:
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = TestFixture::new().with_registry("- widget\n");
//!     fixture.command().arg("clone").assert().success();
//! }
//! ```

use assert_fs::prelude::*;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    pub use assert_cmd::cargo::cargo_bin_cmd;
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use assert_fs::TempDir;
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::{git, git_available, TestFixture};
}

/// Identity used for every commit made by the tests.
#[allow(dead_code)]
pub const GIT_IDENTITY: [(&str, &str); 4] = [
    ("GIT_AUTHOR_NAME", "Test Author"),
    ("GIT_AUTHOR_EMAIL", "author@example.com"),
    ("GIT_COMMITTER_NAME", "Test Author"),
    ("GIT_COMMITTER_EMAIL", "author@example.com"),
];

/// Whether a usable `git` executable is on the PATH.
#[allow(dead_code)]
pub fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Run git in `dir` and return trimmed stdout, panicking on failure.
#[allow(dead_code)]
pub fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .envs(GIT_IDENTITY)
        .output()
        .expect("Failed to run git");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// A temporary workspace with a configs directory, a project root and an
/// optional directory of bare remotes.
///
/// ```text
/// <tmp>/configs/managed_modules.yml
/// <tmp>/configs/config_defaults.yml
/// <tmp>/configs/moduleroot/
/// <tmp>/modules/
/// <tmp>/remotes/<namespace>/<name>
/// ```
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

impl TestFixture {
    /// Create a fixture with an empty `configs/moduleroot` directory.
    pub fn new() -> Self {
        let temp_dir = assert_fs::TempDir::new().expect("Failed to create temp directory");
        temp_dir
            .child("configs/moduleroot")
            .create_dir_all()
            .expect("Failed to create moduleroot");
        Self { temp_dir }
    }

    /// Write `managed_modules.yml`.
    pub fn with_registry(self, content: &str) -> Self {
        self.with_config_file("managed_modules.yml", content)
    }

    /// Write `config_defaults.yml`.
    #[allow(dead_code)]
    pub fn with_defaults(self, content: &str) -> Self {
        self.with_config_file("config_defaults.yml", content)
    }

    /// Write a file under `moduleroot/`.
    #[allow(dead_code)]
    pub fn with_template(self, name: &str, content: &str) -> Self {
        self.with_config_file(&format!("moduleroot/{}", name), content)
    }

    /// Write a file under the configs directory.
    pub fn with_config_file(self, path: &str, content: &str) -> Self {
        self.temp_dir
            .child("configs")
            .child(path)
            .write_str(content)
            .expect("Failed to write config file");
        self
    }

    /// Create a bare remote for `namespace/name` holding one commit on
    /// `master` with the given files.
    #[allow(dead_code)]
    pub fn with_remote(self, namespace: &str, name: &str, files: &[(&str, &str)]) -> Self {
        let bare = self.remotes().join(namespace).join(name);
        std::fs::create_dir_all(&bare).expect("Failed to create remote directory");
        git(&bare, &["init", "--bare", "--quiet"]);
        git(&bare, &["symbolic-ref", "HEAD", "refs/heads/master"]);

        let seed = self.temp_dir.child(format!("seed/{}/{}", namespace, name));
        seed.create_dir_all().expect("Failed to create seed directory");
        git(seed.path(), &["init", "--quiet"]);
        for (path, content) in files {
            seed.child(path).write_str(content).expect("Failed to write seed file");
        }
        git(seed.path(), &["add", "--all"]);
        git(seed.path(), &["commit", "--quiet", "-m", "Initial commit"]);
        git(
            seed.path(),
            &["push", "--quiet", bare.to_str().expect("utf-8 path"), "HEAD:refs/heads/master"],
        );
        self
    }

    /// Root of the fixture.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn configs(&self) -> PathBuf {
        self.path().join("configs")
    }

    pub fn project_root(&self) -> PathBuf {
        self.path().join("modules")
    }

    #[allow(dead_code)]
    pub fn remotes(&self) -> PathBuf {
        self.path().join("remotes")
    }

    /// `--git-base` value pointing at the bare remotes.
    #[allow(dead_code)]
    pub fn git_base(&self) -> String {
        format!("{}/", self.remotes().display())
    }

    /// A `modsync` command running in the fixture root with plain output
    /// and a fixed commit identity.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("modsync");
        cmd.current_dir(self.path())
            .envs(GIT_IDENTITY)
            .arg("--color")
            .arg("never");
        cmd
    }

    /// Selection arguments shared by every module-level command.
    pub fn selection(&self) -> Vec<String> {
        vec![
            "--configs".to_string(),
            self.configs().display().to_string(),
            "--project-root".to_string(),
            self.project_root().display().to_string(),
        ]
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}
