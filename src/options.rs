//! # Run Options
//!
//! Every command invocation builds exactly one immutable [`RunOptions`] and
//! passes it by reference to every component. Values come from three layers,
//! later layers winning:
//!
//! 1. Built-in defaults (see [`crate::defaults`]).
//! 2. The run settings file, `modsync.yml` in the current directory.
//! 3. Command-line flags.
//!
//! Layers 2 and 3 share the same shape, [`OptionsLayer`], where every field is
//! optional so that an unset flag never shadows a value from the settings
//! file.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::config::{self, CONFIG_DEFAULTS_FILE, MODULE_FILES_DIR};
use crate::defaults;
use crate::error::{Error, Result};

/// One layer of run options. Unset fields fall through to lower layers.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct OptionsLayer {
    pub configs: Option<PathBuf>,
    pub managed_modules_conf: Option<String>,
    pub project_root: Option<PathBuf>,
    pub namespace: Option<String>,
    pub git_base: Option<String>,
    pub branch: Option<String>,
    pub remote_branch: Option<String>,
    pub source_branch: Option<String>,
    pub default_branch: Option<String>,
    pub message: Option<String>,
    pub filter: Option<String>,
    pub negative_filter: Option<String>,
    pub offline: Option<bool>,
    pub noop: Option<bool>,
    pub skip_broken: Option<bool>,
    pub fail_on_warnings: Option<bool>,
    pub fail_fast: Option<bool>,
    pub bump: Option<bool>,
    pub changelog: Option<bool>,
    pub tag: Option<bool>,
    pub tag_pattern: Option<String>,
    pub pr: Option<bool>,
    pub pr_title: Option<String>,
    pub pr_labels: Option<Vec<String>>,
    pub pr_target_branch: Option<String>,
    pub amend: Option<bool>,
    pub force: Option<bool>,
    pub pre_commit_script: Option<PathBuf>,
}

macro_rules! overlay {
    ($low:expr, $high:expr, $($field:ident),+ $(,)?) => {
        OptionsLayer {
            $($field: $high.$field.or($low.$field),)+
        }
    };
}

impl OptionsLayer {
    /// Load a settings file. A missing file is an empty layer.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        match config::load_document(path)? {
            None | Some(serde_yaml::Value::Null) => Ok(Self::default()),
            Some(value) => serde_yaml::from_value(value).map_err(|e| Error::ConfigParse {
                path: path.to_path_buf(),
                message: e.to_string(),
                hint: Some("Keys must be run option names such as 'branch' or 'namespace'".to_string()),
            }),
        }
    }

    /// Overlay `higher` on top of `self`: fields set in `higher` win.
    pub fn overlay(self, higher: OptionsLayer) -> OptionsLayer {
        overlay!(
            self,
            higher,
            configs,
            managed_modules_conf,
            project_root,
            namespace,
            git_base,
            branch,
            remote_branch,
            source_branch,
            default_branch,
            message,
            filter,
            negative_filter,
            offline,
            noop,
            skip_broken,
            fail_on_warnings,
            fail_fast,
            bump,
            changelog,
            tag,
            tag_pattern,
            pr,
            pr_title,
            pr_labels,
            pr_target_branch,
            amend,
            force,
            pre_commit_script,
        )
    }
}

/// Fully resolved, immutable options for one command invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOptions {
    /// Directory holding the registry, the defaults document and the
    /// template root.
    pub configs: PathBuf,
    pub managed_modules_conf: String,
    /// Directory receiving the working copies.
    pub project_root: PathBuf,
    pub namespace: String,
    pub git_base: String,
    pub branch: Option<String>,
    pub remote_branch: Option<String>,
    pub source_branch: Option<String>,
    pub default_branch: Option<String>,
    pub message: Option<String>,
    pub filter: Option<String>,
    pub negative_filter: Option<String>,
    pub offline: bool,
    pub noop: bool,
    pub skip_broken: bool,
    pub fail_on_warnings: bool,
    pub fail_fast: bool,
    pub bump: bool,
    pub changelog: bool,
    pub tag: bool,
    pub tag_pattern: String,
    pub pr: bool,
    pub pr_title: Option<String>,
    pub pr_labels: Vec<String>,
    pub pr_target_branch: Option<String>,
    pub amend: bool,
    pub force: bool,
    pub pre_commit_script: Option<PathBuf>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self::from(OptionsLayer::default())
    }
}

impl From<OptionsLayer> for RunOptions {
    fn from(layer: OptionsLayer) -> Self {
        Self {
            configs: layer.configs.unwrap_or_else(defaults::default_configs_dir),
            managed_modules_conf: layer
                .managed_modules_conf
                .unwrap_or_else(|| defaults::MANAGED_MODULES_CONF.to_string()),
            project_root: layer
                .project_root
                .unwrap_or_else(defaults::default_project_root),
            namespace: layer
                .namespace
                .unwrap_or_else(|| defaults::NAMESPACE.to_string()),
            git_base: layer
                .git_base
                .unwrap_or_else(|| defaults::GIT_BASE.to_string()),
            branch: layer.branch,
            remote_branch: layer.remote_branch,
            source_branch: layer.source_branch,
            default_branch: layer.default_branch,
            message: layer.message,
            filter: layer.filter,
            negative_filter: layer.negative_filter,
            offline: layer.offline.unwrap_or(false),
            noop: layer.noop.unwrap_or(false),
            skip_broken: layer.skip_broken.unwrap_or(false),
            fail_on_warnings: layer.fail_on_warnings.unwrap_or(false),
            fail_fast: layer.fail_fast.unwrap_or(false),
            bump: layer.bump.unwrap_or(false),
            changelog: layer.changelog.unwrap_or(false),
            tag: layer.tag.unwrap_or(false),
            tag_pattern: layer
                .tag_pattern
                .unwrap_or_else(|| defaults::TAG_PATTERN.to_string()),
            pr: layer.pr.unwrap_or(false),
            pr_title: layer.pr_title,
            pr_labels: layer.pr_labels.unwrap_or_default(),
            pr_target_branch: layer.pr_target_branch,
            amend: layer.amend.unwrap_or(false),
            force: layer.force.unwrap_or(false),
            pre_commit_script: layer.pre_commit_script,
        }
    }
}

impl RunOptions {
    /// Resolve options from a settings file and command-line overrides.
    pub fn resolve<P: AsRef<Path>>(settings_file: P, cli: OptionsLayer) -> Result<Self> {
        let file = OptionsLayer::from_file(settings_file)?;
        Ok(Self::from(file.overlay(cli)))
    }

    /// Path of the module registry document.
    pub fn managed_modules_path(&self) -> PathBuf {
        self.configs.join(&self.managed_modules_conf)
    }

    /// Path of the global defaults document.
    pub fn config_defaults_path(&self) -> PathBuf {
        self.configs.join(CONFIG_DEFAULTS_FILE)
    }

    /// Root directory scanned for templates.
    pub fn template_root(&self) -> PathBuf {
        self.configs.join(MODULE_FILES_DIR)
    }

    /// The branch, or a configuration error naming the command that needs it.
    pub fn require_branch(&self, command: &str) -> Result<&str> {
        self.branch.as_deref().ok_or_else(|| Error::Configuration {
            message: format!(
                "'branch' option is missing for `{}`, please set it in configuration or in command line",
                command
            ),
        })
    }

    /// Pre-commit script path, resolved against the configs directory when
    /// relative.
    pub fn pre_commit_script_path(&self) -> Option<PathBuf> {
        self.pre_commit_script.as_ref().map(|script| {
            if script.is_absolute() {
                script.clone()
            } else {
                self.configs.join(script)
            }
        })
    }
}
