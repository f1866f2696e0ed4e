//! # Template Discovery
//!
//! Builds the [`TemplateSet`]: every file under the template root
//! (`<configs>/moduleroot`) that carries the [`TEMPLATE_SUFFIX`], identified
//! by its path relative to the root with the suffix stripped. The file
//! `moduleroot/.github/ci.yml.j2` manages `.github/ci.yml`.
//!
//! Files without the suffix are still accepted when no suffixed twin exists.
//! This is a deprecated compatibility path: discovery warns and the file is
//! copied verbatim rather than evaluated.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use log::warn;
use walkdir::WalkDir;

use crate::error::{Error, Result};

/// Suffix marking a file as a template.
pub const TEMPLATE_SUFFIX: &str = ".j2";

/// Where a managed file's content comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSource {
    /// A suffixed file evaluated by the template engine.
    Templated(PathBuf),
    /// A bare file copied as-is (deprecated).
    Literal(PathBuf),
}

impl TemplateSource {
    /// Path of the source file on disk.
    pub fn path(&self) -> &Path {
        match self {
            TemplateSource::Templated(path) | TemplateSource::Literal(path) => path,
        }
    }
}

/// The discovered templates, keyed by managed file name.
#[derive(Debug, Clone, Default)]
pub struct TemplateSet {
    root: PathBuf,
    entries: BTreeMap<String, TemplateSource>,
}

impl TemplateSet {
    /// Scan `root` recursively.
    ///
    /// A missing root is a configuration error: it almost always means the
    /// command runs from the wrong directory or `--configs` is wrong.
    pub fn discover<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(Error::Configuration {
                message: format!(
                    "{} does not exist. Check that you are working in your module configs directory or that you have passed in the correct directory with --configs.",
                    root.display()
                ),
            });
        }

        let mut templated = BTreeMap::new();
        let mut literal = BTreeMap::new();

        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = relative_name(root, entry.path());
            match relative.strip_suffix(TEMPLATE_SUFFIX) {
                Some(name) if !name.is_empty() => {
                    templated.insert(name.to_string(), entry.path().to_path_buf());
                }
                _ => {
                    literal.insert(relative, entry.path().to_path_buf());
                }
            }
        }

        let mut entries: BTreeMap<String, TemplateSource> = templated
            .into_iter()
            .map(|(name, path)| (name, TemplateSource::Templated(path)))
            .collect();

        for (name, path) in literal {
            if entries.contains_key(&name) {
                continue;
            }
            warn!(
                "Using '{}' as template without '{}' suffix; its content is copied verbatim",
                path.display(),
                TEMPLATE_SUFFIX
            );
            entries.insert(name, TemplateSource::Literal(path));
        }

        Ok(Self {
            root: root.to_path_buf(),
            entries,
        })
    }

    /// Build a set from explicit entries, rooted at `root`.
    pub fn from_entries<I>(root: impl Into<PathBuf>, entries: I) -> Self
    where
        I: IntoIterator<Item = (String, TemplateSource)>,
    {
        Self {
            root: root.into(),
            entries: entries.into_iter().collect(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Managed file names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn get(&self, name: &str) -> Option<&TemplateSource> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Relative path with `/` separators, independent of the host platform.
fn relative_name(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_discover_strips_suffix_and_recurses() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "README.md.j2", "# {{ metadata.module_name }}");
        write(temp.path(), ".github/workflows/ci.yml.j2", "on: push");

        let set = TemplateSet::discover(temp.path()).unwrap();
        let names: Vec<&str> = set.names().collect();
        assert_eq!(names, vec![".github/workflows/ci.yml", "README.md"]);
        assert!(matches!(
            set.get("README.md"),
            Some(TemplateSource::Templated(_))
        ));
    }

    #[test]
    fn test_discover_missing_root_is_configuration_error() {
        let temp = TempDir::new().unwrap();
        let err = TemplateSet::discover(temp.path().join("moduleroot")).unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
        assert!(err.to_string().contains("moduleroot"));
    }

    #[test]
    fn test_bare_file_is_literal_when_no_twin() {
        testing_logger::setup();
        let temp = TempDir::new().unwrap();
        write(temp.path(), "LICENSE", "plain text");

        let set = TemplateSet::discover(temp.path()).unwrap();
        assert!(matches!(set.get("LICENSE"), Some(TemplateSource::Literal(_))));

        testing_logger::validate(|logs| {
            assert!(logs
                .iter()
                .any(|l| l.level == log::Level::Warn && l.body.contains("without '.j2' suffix")));
        });
    }

    #[test]
    fn test_suffixed_twin_wins_over_bare_file() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "Gemfile", "bare");
        write(temp.path(), "Gemfile.j2", "templated");

        let set = TemplateSet::discover(temp.path()).unwrap();
        assert_eq!(set.len(), 1);
        let source = set.get("Gemfile").unwrap();
        assert!(matches!(source, TemplateSource::Templated(_)));
        assert!(source.path().ends_with("Gemfile.j2"));
    }

    #[test]
    fn test_empty_root() {
        let temp = TempDir::new().unwrap();
        let set = TemplateSet::discover(temp.path()).unwrap();
        assert!(set.is_empty());
        assert_eq!(set.root(), temp.path());
    }
}
