//! # modsync
//!
//! Keeps a set of shared, templated files in sync across many Git
//! repositories ("managed modules"). Templates live in one configs
//! repository; each module gets them rendered with layered configuration,
//! and the result is committed and pushed, or previewed in no-op mode.
//!
//! ## Quick Example
//!
//! ```
//! use modsync::settings::Settings;
//! use modsync::templates::{TemplateSet, TemplateSource};
//!
//! let defaults = serde_yaml::from_str("\":global\":\n  owner: infra\n").unwrap();
//! let module = serde_yaml::from_str(".travis.yml:\n  delete: true\n").unwrap();
//! let settings = Settings::new(defaults, module);
//!
//! let templates = TemplateSet::from_entries(
//!     "moduleroot",
//!     [("README.md".to_string(), TemplateSource::Templated("moduleroot/README.md.j2".into()))],
//! );
//! let managed = settings.managed_files(&templates);
//! assert!(managed.contains("README.md"));
//! assert!(managed.contains(".travis.yml"));
//! assert!(settings.build_file_configs(".travis.yml").is_delete());
//! ```
//!
//! ## Core Concepts
//!
//! - **Run options (`options`)**: one immutable [`options::RunOptions`] per
//!   invocation, layered from built-in defaults, `modsync.yml` and flags.
//! - **Registry (`modules`)**: the managed modules and their overrides.
//! - **Settings (`settings`, `config`)**: the four-layer merge deciding which
//!   files are managed and with which template variables.
//! - **Rendering (`templates`, `renderer`)**: template discovery, evaluation
//!   and writing into the working copy.
//! - **Repository control (`repository`, `git`, `release`, `forge`)**: the
//!   working-copy state machine, version bumps, tags and pull requests.
//! - **Orchestration (`sync`, `batch`)**: `update` across all modules, and
//!   the `clone`, `reset`, `push` and `execute` batch commands.
//! - **Hook (`hook`)**: the pre-push hook of the configs repository.
//!
//! ## Execution Flow of `update`
//!
//! For each module, in registry order: prepare the working copy, resolve
//! settings, render or remove managed files, then preview, stop (offline),
//! or commit and push, optionally followed by bump, tag and pull request.

pub mod batch;
pub mod config;
pub mod defaults;
pub mod error;
pub mod forge;
pub mod git;
pub mod hook;
pub mod modules;
pub mod options;
pub mod output;
pub mod release;
pub mod renderer;
pub mod repository;
pub mod settings;
pub mod sync;
pub mod templates;

#[cfg(test)]
mod git_mock;
#[cfg(test)]
mod settings_proptest;
