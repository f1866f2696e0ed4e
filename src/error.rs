//! # Error Handling
//!
//! This module defines the centralized error type for `modsync`. It uses the
//! `thiserror` library to describe every anticipated failure mode with enough
//! context (module, path, command, template) to be reported directly to the
//! user.
//!
//! ## Key Components
//!
//! - **`Error`**: The main enum that represents all possible errors that can
//!   occur within the library.
//!
//! - **`ErrorKind`**: A coarse classification of `Error` variants. The sync
//!   orchestrator inspects it to decide whether a module failure aborts the
//!   run or is skipped under the skip-broken policy.
//!
//! - **`Result<T>`**: A type alias for `std::result::Result<T, Error>`.

use std::path::PathBuf;

use thiserror::Error;

/// Coarse classification used by callers that apply a failure policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or invalid configuration. Fatal before the module loop starts.
    Configuration,
    /// A version-control operation failed for one module.
    VersionControl,
    /// A template could not be loaded or evaluated.
    Render,
    /// A user-supplied command failed.
    ExternalCommand,
    /// Anything else (I/O, serialization, ...).
    Other,
}

/// Main error type for modsync operations
#[derive(Error, Debug)]
pub enum Error {
    /// A configuration document could not be parsed or has the wrong shape.
    #[error("Configuration parsing error in {}: {message}{}", path.display(), hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    ConfigParse {
        path: PathBuf,
        message: String,
        /// Optional hint for how to fix the configuration issue
        hint: Option<String>,
    },

    /// The run cannot start because of a missing or inconsistent setting.
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// An error occurred while cloning a Git repository.
    #[error("Git clone error for {url}: {message}")]
    GitClone { url: String, message: String },

    /// An error occurred while executing a Git command.
    #[error("Git command failed in {}: git {command} - {stderr}", dir.display())]
    GitCommand {
        command: String,
        dir: PathBuf,
        stderr: String,
    },

    /// The local working copy is not in a state the operation can work with.
    #[error("Workspace error in {}: {message}", path.display())]
    Workspace { path: PathBuf, message: String },

    /// A template file could not be found or read.
    #[error("Template not found: {}", path.display())]
    TemplateNotFound { path: PathBuf },

    /// A template failed to compile or evaluate.
    #[error("Template processing error in {template}: {source}")]
    Template {
        template: String,
        #[source]
        source: minijinja::Error,
    },

    /// A user-supplied command could not be run or exited unsuccessfully.
    #[error("Command execution failed ('{command}'): {message}")]
    Command { command: String, message: String },

    /// The metadata version bump could not be performed.
    #[error("Version bump error: {message}")]
    Release { message: String },

    /// A pull request could not be opened.
    #[error("Pull request error for {repository}: {message}")]
    PullRequest { repository: String, message: String },

    /// Some modules were skipped and warnings are treated as failures.
    #[error("{count} module(s) failed and were skipped: {}", modules.join(", "))]
    SkippedModules { count: usize, modules: Vec<String> },

    /// One or more modules failed during `execute`.
    #[error("Error(s) during `execute` command:\n{}", failures.iter().map(|(name, message)| format!("  * {}: {}", name, message)).collect::<Vec<_>>().join("\n"))]
    ExecuteFailures { failures: Vec<(String, String)> },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML parsing error, wrapped from `serde_yaml::Error`.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A JSON error, wrapped from `serde_json::Error`.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A regular expression error, wrapped from `regex::Error`.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// A semantic versioning parsing error, wrapped from `semver::Error`.
    #[error("Semver parsing error: {0}")]
    Semver(#[from] semver::Error),

    /// A directory walk error, wrapped from `walkdir::Error`.
    #[error("Directory traversal error: {0}")]
    Walk(#[from] walkdir::Error),
}

impl Error {
    /// Classify this error for failure-policy decisions.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::ConfigParse { .. } | Error::Configuration { .. } | Error::Yaml(_) => {
                ErrorKind::Configuration
            }
            Error::GitClone { .. }
            | Error::GitCommand { .. }
            | Error::Workspace { .. }
            | Error::Release { .. }
            | Error::PullRequest { .. } => ErrorKind::VersionControl,
            Error::TemplateNotFound { .. } | Error::Template { .. } => ErrorKind::Render,
            Error::Command { .. } | Error::ExecuteFailures { .. } => ErrorKind::ExternalCommand,
            Error::SkippedModules { .. }
            | Error::Io(_)
            | Error::Json(_)
            | Error::Regex(_)
            | Error::Semver(_)
            | Error::Walk(_) => ErrorKind::Other,
        }
    }

    /// Whether the error belongs to the recognized domain failures
    /// (configuration or version control) that are reported with the module
    /// name before the skip-broken policy is applied.
    pub fn is_domain(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Configuration | ErrorKind::VersionControl
        )
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
