//! # Configuration Documents
//!
//! This module loads the YAML documents that drive a sync run:
//!
//! - **`config_defaults.yml`**: global defaults shared by every module, found
//!   in the configs directory.
//! - **`.sync.yml`**: per-module overrides, found at the root of each module's
//!   working copy.
//! - **`managed_modules.yml`**: the module registry (see [`crate::modules`]).
//!
//! Defaults documents are mappings whose keys are either the reserved
//! [`GLOBAL_DEFAULTS_KEY`] section or a file path relative to the module root.
//! Each value is itself a mapping of template variables for that file.
//!
//! Loading is a pure function of the filesystem: a missing document is an
//! empty mapping, never an error, because most modules carry no `.sync.yml`.

use std::fs;
use std::path::{Component, Path};

use log::debug;
use serde_yaml::{Mapping, Value};

use crate::error::{Error, Result};

/// Name of the global defaults document inside the configs directory.
pub const CONFIG_DEFAULTS_FILE: &str = "config_defaults.yml";

/// Name of the per-module document at the root of a working copy.
pub const MODULE_CONFIG_FILE: &str = ".sync.yml";

/// Name of the template root directory inside the configs directory.
pub const MODULE_FILES_DIR: &str = "moduleroot";

/// Reserved section holding defaults that apply to every file.
pub const GLOBAL_DEFAULTS_KEY: &str = ":global";

/// Read a YAML document, returning `None` if the file does not exist.
///
/// An empty file (or one holding only comments) yields `Some(Value::Null)`.
pub fn load_document<P: AsRef<Path>>(path: P) -> Result<Option<Value>> {
    let path = path.as_ref();
    if !path.is_file() {
        debug!("No config file under {}", path.display());
        return Ok(None);
    }

    let content = fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(Some(Value::Null));
    }

    serde_yaml::from_str(&content)
        .map(Some)
        .map_err(|e| Error::ConfigParse {
            path: path.to_path_buf(),
            message: e.to_string(),
            hint: None,
        })
}

/// Load a defaults document as a mapping.
///
/// Missing files and empty documents produce an empty mapping. Any other
/// top-level shape is a parse error.
pub fn parse_config<P: AsRef<Path>>(path: P) -> Result<Mapping> {
    let path = path.as_ref();
    match load_document(path)? {
        None | Some(Value::Null) => Ok(Mapping::new()),
        Some(Value::Mapping(mapping)) => Ok(mapping),
        Some(other) => Err(Error::ConfigParse {
            path: path.to_path_buf(),
            message: format!("expected a mapping at the top level, found {}", describe(&other)),
            hint: Some(format!(
                "Sections are keyed by file path or '{}'",
                GLOBAL_DEFAULTS_KEY
            )),
        }),
    }
}

/// Return the mapping stored under `key`. Absent keys and non-mapping values
/// both yield `None`.
pub fn section<'a>(document: &'a Mapping, key: &str) -> Option<&'a Mapping> {
    document.get(key).and_then(Value::as_mapping)
}

/// Iterate over the file sections of a defaults document, skipping the
/// reserved global section and non-string keys.
pub fn file_keys(document: &Mapping) -> impl Iterator<Item = &str> {
    document
        .keys()
        .filter_map(Value::as_str)
        .filter(|key| *key != GLOBAL_DEFAULTS_KEY)
}

/// Whether `key` names a path inside the module root: relative, non-empty
/// and free of `..` components.
pub fn is_contained_path(key: &str) -> bool {
    let path = Path::new(key);
    path.components().next().is_some()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

/// Short human description of a YAML value's type, for error messages.
pub(crate) fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}
