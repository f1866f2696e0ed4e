//! # Settings Resolution
//!
//! Decides, per module and per file, whether the file is managed and with
//! which template variables.
//!
//! ## Layers
//!
//! A [`FileConfig`] is a shallow, per-key merge of exactly four layers, each
//! later layer overriding keys of the earlier ones:
//!
//! 1. global defaults: `config_defaults.yml[":global"]`
//! 2. global file section: `config_defaults.yml[<file>]`
//! 3. module defaults: `.sync.yml[":global"]`
//! 4. module file section: `.sync.yml[<file>]`
//!
//! Values are replaced whole; nested mappings are not merged recursively.
//!
//! ## Managed and unmanaged files
//!
//! The candidate universe is the discovered template names plus every file
//! key of both documents. A candidate is unmanaged when it, or any of its
//! ancestor directories, resolves to `unmanaged: true`, or when it has no
//! template and is not marked `delete: true`. Everything else is managed. The
//! two sets are disjoint and together cover the candidates.

use std::collections::BTreeSet;
use std::path::Path;

use log::warn;
use serde::Serialize;
use serde_yaml::{Mapping, Value};

use crate::config::{self, GLOBAL_DEFAULTS_KEY};
use crate::templates::TemplateSet;

/// Key marking a file for removal instead of rendering.
pub const DELETE_KEY: &str = "delete";

/// Key excluding a file (or a whole directory) from management.
pub const UNMANAGED_KEY: &str = "unmanaged";

/// The fully merged configuration for one (module, file) pair.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FileConfig(Mapping);

impl FileConfig {
    /// Merge layers in order; keys from later layers win.
    pub fn merge_layers<'a, I>(layers: I) -> Self
    where
        I: IntoIterator<Item = &'a Mapping>,
    {
        let mut merged = Mapping::new();
        for layer in layers {
            for (key, value) in layer {
                merged.insert(key.clone(), value.clone());
            }
        }
        FileConfig(merged)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// True only for an explicit boolean `true`.
    pub fn flag(&self, key: &str) -> bool {
        matches!(self.get(key), Some(Value::Bool(true)))
    }

    /// Whether this file must be removed rather than rendered.
    pub fn is_delete(&self) -> bool {
        self.flag(DELETE_KEY)
    }

    pub fn is_unmanaged(&self) -> bool {
        self.flag(UNMANAGED_KEY)
    }

    pub fn as_mapping(&self) -> &Mapping {
        &self.0
    }
}

/// The four configuration layers for one module.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    global_defaults: Mapping,
    defaults: Mapping,
    module_defaults: Mapping,
    module_configs: Mapping,
}

impl Settings {
    /// Build settings from the global defaults document and the module's own
    /// document. The reserved `:global` sections are split out here.
    pub fn new(defaults: Mapping, module_configs: Mapping) -> Self {
        let global_defaults = config::section(&defaults, GLOBAL_DEFAULTS_KEY)
            .cloned()
            .unwrap_or_default();
        let module_defaults = config::section(&module_configs, GLOBAL_DEFAULTS_KEY)
            .cloned()
            .unwrap_or_default();
        Self {
            global_defaults,
            defaults,
            module_defaults,
            module_configs,
        }
    }

    /// Resolve the merged configuration for `filename`.
    pub fn build_file_configs(&self, filename: &str) -> FileConfig {
        let empty = Mapping::new();
        let file_defaults = config::section(&self.defaults, filename).unwrap_or(&empty);
        let file_module = config::section(&self.module_configs, filename).unwrap_or(&empty);

        FileConfig::merge_layers([
            &self.global_defaults,
            file_defaults,
            &self.module_defaults,
            file_module,
        ])
    }

    /// Whether neither `filename` nor any of its ancestor directories is
    /// marked `unmanaged`.
    pub fn is_managed_path(&self, filename: &str) -> bool {
        Path::new(filename)
            .ancestors()
            .filter_map(|p| p.to_str())
            .filter(|p| !p.is_empty())
            .all(|p| !self.build_file_configs(p).is_unmanaged())
    }

    /// Every name this module could act on: templates plus configured files.
    ///
    /// Configured keys that point outside the module root are dropped.
    pub fn candidates(&self, templates: &TemplateSet) -> BTreeSet<String> {
        let configured = config::file_keys(&self.defaults)
            .chain(config::file_keys(&self.module_configs))
            .filter(|key| {
                let contained = config::is_contained_path(key);
                if !contained {
                    warn!("Ignoring '{}': not a path inside the module", key);
                }
                contained
            });
        templates
            .names()
            .chain(configured)
            .map(str::to_string)
            .collect()
    }

    fn is_managed(&self, templates: &TemplateSet, filename: &str) -> bool {
        if !self.is_managed_path(filename) {
            return false;
        }
        templates.contains(filename) || self.build_file_configs(filename).is_delete()
    }

    /// Candidates to render or remove.
    pub fn managed_files(&self, templates: &TemplateSet) -> BTreeSet<String> {
        self.candidates(templates)
            .into_iter()
            .filter(|f| self.is_managed(templates, f))
            .collect()
    }

    /// Candidates left untouched, reported for visibility.
    pub fn unmanaged_files(&self, templates: &TemplateSet) -> BTreeSet<String> {
        self.candidates(templates)
            .into_iter()
            .filter(|f| !self.is_managed(templates, f))
            .collect()
    }
}
