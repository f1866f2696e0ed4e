//! # Module Registry
//!
//! Loads the list of managed modules from `managed_modules.yml`. The document
//! is either a plain sequence of names:
//!
//! ```yaml
//! - ns/repo-one
//! - repo-two
//! ```
//!
//! or a mapping from name to per-module overrides:
//!
//! ```yaml
//! ns/repo-one:
//! repo-two:
//!   remote: https://git.example.com/other/repo-two.git
//!   branch: develop
//! ```
//!
//! Modules keep registry order; names are unique by construction of the
//! mapping form and de-duplicated for the sequence form.

use std::path::{Path, PathBuf};

use log::{debug, warn};
use regex::Regex;
use serde::Deserialize;
use serde_yaml::{Mapping, Value};

use crate::config::{self, describe};
use crate::error::{Error, Result};
use crate::options::RunOptions;

/// Per-module overrides read from the registry.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct ModuleOptions {
    /// Full remote URL, replacing the one derived from `git_base`.
    pub remote: Option<String>,
    /// Namespace, replacing the run-level namespace.
    pub namespace: Option<String>,
    /// Branch, replacing the run-level branch.
    pub branch: Option<String>,
    /// Unrecognized keys, kept for forward compatibility.
    #[serde(flatten)]
    pub extra: Mapping,
}

/// One repository whose shared files are kept in sync.
#[derive(Debug, Clone, PartialEq)]
pub struct ManagedModule {
    /// The key used in the registry; unique within a run.
    pub given_name: String,
    pub options: ModuleOptions,
}

impl ManagedModule {
    pub fn new(given_name: impl Into<String>, options: ModuleOptions) -> Self {
        Self {
            given_name: given_name.into(),
            options,
        }
    }

    /// Repository name: the last `/`-separated component of the given name.
    pub fn repository_name(&self) -> &str {
        self.given_name
            .rsplit_once('/')
            .map(|(_, name)| name)
            .unwrap_or(&self.given_name)
    }

    /// Namespace from the given name, then the module options, then the run.
    pub fn repository_namespace<'a>(&'a self, options: &'a RunOptions) -> &'a str {
        if let Some((namespace, _)) = self.given_name.rsplit_once('/') {
            return namespace;
        }
        self.options
            .namespace
            .as_deref()
            .unwrap_or(&options.namespace)
    }

    /// `namespace/name`, the path used for remotes and working copies.
    pub fn repository_path(&self, options: &RunOptions) -> String {
        format!(
            "{}/{}",
            self.repository_namespace(options),
            self.repository_name()
        )
    }

    /// The remote URL: the explicit override or `git_base` + repository path.
    pub fn remote_url(&self, options: &RunOptions) -> String {
        if let Some(remote) = &self.options.remote {
            return remote.clone();
        }
        let base = &options.git_base;
        let path = self.repository_path(options);
        if base.is_empty() || base.ends_with('/') || base.ends_with(':') {
            format!("{}{}", base, path)
        } else {
            format!("{}/{}", base, path)
        }
    }

    /// Directory holding this module's working copy.
    pub fn working_directory(&self, options: &RunOptions) -> PathBuf {
        options.project_root.join(self.repository_path(options))
    }

    /// Path of `filename` inside the working copy.
    pub fn path(&self, options: &RunOptions, filename: &str) -> PathBuf {
        self.working_directory(options).join(filename)
    }

    /// The branch to operate on: module override first, then the run branch.
    pub fn branch<'a>(&'a self, options: &'a RunOptions) -> Option<&'a str> {
        self.options
            .branch
            .as_deref()
            .or(options.branch.as_deref())
    }
}

/// Load, validate and filter the registry named by the run options.
///
/// An empty registry is a configuration error. Filters apply afterwards, so a
/// filter that matches nothing simply yields no modules.
pub fn load_managed_modules(options: &RunOptions) -> Result<Vec<ManagedModule>> {
    let path = options.managed_modules_path();
    let modules = parse_registry(&path)?;

    if modules.is_empty() {
        return Err(Error::Configuration {
            message: format!(
                "No modules found in {}. Check that you specified the right configs directory and managed modules file.",
                path.display()
            ),
        });
    }

    filter_modules(
        modules,
        options.filter.as_deref(),
        options.negative_filter.as_deref(),
    )
}

/// Parse a registry document without applying filters.
pub fn parse_registry(path: &Path) -> Result<Vec<ManagedModule>> {
    let document = config::load_document(path)?;
    let mut modules: Vec<ManagedModule> = Vec::new();

    match document {
        None | Some(Value::Null) => {}
        Some(Value::Sequence(names)) => {
            for entry in names {
                let name = module_name(path, &entry)?;
                if modules.iter().any(|m| m.given_name == name) {
                    warn!("Module '{}' is listed twice in {}", name, path.display());
                    continue;
                }
                modules.push(ManagedModule::new(name, ModuleOptions::default()));
            }
        }
        Some(Value::Mapping(entries)) => {
            for (key, value) in entries {
                let name = module_name(path, &key)?;
                let module_options = match value {
                    Value::Null => ModuleOptions::default(),
                    other => serde_yaml::from_value(other).map_err(|e| Error::ConfigParse {
                        path: path.to_path_buf(),
                        message: format!("invalid options for module '{}': {}", name, e),
                        hint: None,
                    })?,
                };
                modules.push(ManagedModule::new(name, module_options));
            }
        }
        Some(other) => {
            return Err(Error::ConfigParse {
                path: path.to_path_buf(),
                message: format!(
                    "expected a sequence or mapping of modules, found {}",
                    describe(&other)
                ),
                hint: None,
            })
        }
    }

    debug!("Loaded {} module(s) from {}", modules.len(), path.display());
    Ok(modules)
}

/// Keep modules matching `filter` and drop those matching `negative_filter`.
pub fn filter_modules(
    modules: Vec<ManagedModule>,
    filter: Option<&str>,
    negative_filter: Option<&str>,
) -> Result<Vec<ManagedModule>> {
    let filter = compile_filter("filter", filter)?;
    let negative_filter = compile_filter("negative_filter", negative_filter)?;

    Ok(modules
        .into_iter()
        .filter(|m| filter.as_ref().is_none_or(|re| re.is_match(&m.given_name)))
        .filter(|m| {
            negative_filter
                .as_ref()
                .is_none_or(|re| !re.is_match(&m.given_name))
        })
        .collect())
}

fn compile_filter(name: &str, pattern: Option<&str>) -> Result<Option<Regex>> {
    pattern
        .map(|p| {
            Regex::new(p).map_err(|e| Error::Configuration {
                message: format!("invalid {} regex '{}': {}", name, p, e),
            })
        })
        .transpose()
}

fn module_name(path: &Path, value: &Value) -> Result<String> {
    match value {
        Value::String(name) if !name.trim().is_empty() => Ok(name.clone()),
        other => Err(Error::ConfigParse {
            path: path.to_path_buf(),
            message: format!("module names must be non-empty strings, found {}", describe(other)),
            hint: None,
        }),
    }
}
