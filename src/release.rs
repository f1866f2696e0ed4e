//! # Releases
//!
//! Version bumps, changelog entries and tag names for a module's working
//! copy. The version lives in `metadata.json` under the `version` key; a bump
//! increments its patch component and rewrites the document with its keys in
//! their original order.

use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use log::{info, warn};
use semver::Version;
use serde_json::Value;

use crate::error::{Error, Result};

pub const METADATA_FILE: &str = "metadata.json";
pub const CHANGELOG_FILE: &str = "CHANGELOG.md";

/// Placeholder replaced by the version in a tag pattern.
pub const TAG_PLACEHOLDER: &str = "%s";

/// Increment the patch version in `<dir>/metadata.json` and return it.
pub fn bump_metadata(dir: &Path) -> Result<Version> {
    let path = dir.join(METADATA_FILE);
    let content = fs::read_to_string(&path).map_err(|e| Error::Release {
        message: format!("cannot read {}: {}", path.display(), e),
    })?;
    let mut document: Value = serde_json::from_str(&content)?;

    let current = document
        .get("version")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::Release {
            message: format!("{} has no string 'version' key", path.display()),
        })?;
    let mut version = Version::parse(current)?;
    version.patch += 1;
    version.pre = semver::Prerelease::EMPTY;
    version.build = semver::BuildMetadata::EMPTY;

    document["version"] = Value::String(version.to_string());
    let mut rendered = serde_json::to_string_pretty(&document)?;
    rendered.push('\n');
    fs::write(&path, rendered)?;

    info!("Bumped to version {}", version);
    Ok(version)
}

/// Prepend a release entry to `<dir>/CHANGELOG.md`.
///
/// Returns `false` when the changelog does not exist; nothing is created.
pub fn update_changelog(dir: &Path, version: &Version, message: &str, date: NaiveDate) -> Result<bool> {
    let path = dir.join(CHANGELOG_FILE);
    if !path.exists() {
        warn!("No {} file found in {}, skipping changelog update", CHANGELOG_FILE, dir.display());
        return Ok(false);
    }

    let existing = fs::read_to_string(&path)?;
    let entry = format!(
        "## {} - Release {}\n\n{}\n\n",
        date.format("%Y-%m-%d"),
        version,
        message.trim_end()
    );
    fs::write(&path, format!("{}{}", entry, existing))?;
    Ok(true)
}

/// Substitute `version` into `pattern`.
pub fn tag_name(pattern: &str, version: &Version) -> Result<String> {
    if !pattern.contains(TAG_PLACEHOLDER) {
        return Err(Error::Configuration {
            message: format!(
                "tag pattern '{}' must contain the '{}' placeholder",
                pattern, TAG_PLACEHOLDER
            ),
        });
    }
    Ok(pattern.replacen(TAG_PLACEHOLDER, &version.to_string(), 1))
}
