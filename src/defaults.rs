//! Default values for modsync run options.
//!
//! This module provides centralized default values used across commands,
//! ensuring consistency and avoiding duplication.

use std::path::PathBuf;

/// Run settings file read from the current directory.
pub const SETTINGS_FILE: &str = "modsync.yml";

/// Directory holding `managed_modules.yml`, `config_defaults.yml` and
/// `moduleroot/`.
pub const CONFIGS_DIR: &str = ".";

/// Registry document name inside the configs directory.
pub const MANAGED_MODULES_CONF: &str = "managed_modules.yml";

/// Directory that receives the working copies.
pub const PROJECT_ROOT: &str = "modules/";

/// Namespace used for modules whose name carries none.
pub const NAMESPACE: &str = "modsync";

/// Prefix of every derived remote URL.
pub const GIT_BASE: &str = "git@github.com:";

/// Tag name pattern; `%s` is replaced by the version.
pub const TAG_PATTERN: &str = "%s";

/// Base branch assumed when the remote default branch cannot be detected.
pub const FALLBACK_BRANCH: &str = "master";

/// Returns the default project root.
pub fn default_project_root() -> PathBuf {
    PathBuf::from(PROJECT_ROOT)
}

/// Returns the default configs directory.
pub fn default_configs_dir() -> PathBuf {
    PathBuf::from(CONFIGS_DIR)
}
