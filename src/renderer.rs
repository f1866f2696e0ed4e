//! # Template Rendering
//!
//! Binds a merged [`FileConfig`] and the run's [`RenderMetadata`] into a
//! template and writes the result into a module's working copy.
//!
//! Templates use the `minijinja` engine and see two variables:
//!
//! - `config`: the merged file configuration mapping.
//! - `metadata`: `module_name`, `namespace`, `workdir` and `target_file`.
//!
//! ```text
//! # {{ metadata.module_name }}
//! {% for owner in config.owners %}* {{ owner }}
//! {% endfor %}
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use minijinja::{context, Environment};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::settings::FileConfig;
use crate::templates::TemplateSource;

/// Run-scoped values exposed to every template as `metadata`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RenderMetadata {
    pub module_name: String,
    pub namespace: String,
    pub workdir: PathBuf,
    pub target_file: PathBuf,
}

/// A template loaded from disk and checked for syntax errors.
#[derive(Debug, Clone)]
pub enum CompiledTemplate {
    Jinja { name: String, source: String },
    /// Deprecated bare file, emitted verbatim.
    Literal { content: String },
}

fn environment<'source>() -> Environment<'source> {
    let mut env = Environment::new();
    env.set_keep_trailing_newline(true);
    env
}

/// Load and compile a template.
pub fn build(source: &TemplateSource) -> Result<CompiledTemplate> {
    let path = source.path();
    let content = fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => Error::TemplateNotFound {
            path: path.to_path_buf(),
        },
        _ => Error::Io(e),
    })?;

    match source {
        TemplateSource::Literal(_) => Ok(CompiledTemplate::Literal { content }),
        TemplateSource::Templated(_) => {
            let name = path.display().to_string();
            environment()
                .template_from_named_str(&name, &content)
                .map_err(|source| Error::Template {
                    template: name.clone(),
                    source,
                })?;
            Ok(CompiledTemplate::Jinja {
                name,
                source: content,
            })
        }
    }
}

/// Evaluate a compiled template.
pub fn render(
    compiled: &CompiledTemplate,
    config: &FileConfig,
    metadata: &RenderMetadata,
) -> Result<String> {
    match compiled {
        CompiledTemplate::Literal { content } => Ok(content.clone()),
        CompiledTemplate::Jinja { name, source } => environment()
            .render_named_str(name, source, context! { config => config, metadata => metadata })
            .map_err(|source| Error::Template {
                template: name.clone(),
                source,
            }),
    }
}

/// Write `text` to `target`, creating parent directories, then apply `mode`.
pub fn sync(text: &str, target: &Path, mode: Option<u32>) -> Result<()> {
    if let Some(parent) = target.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(target, text)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Some(mode) = mode {
            fs::set_permissions(target, fs::Permissions::from_mode(mode & 0o7777))?;
        }
    }
    #[cfg(not(unix))]
    let _ = mode;

    Ok(())
}

/// Delete `target` if it exists. Removing an absent file is not an error.
pub fn remove(target: &Path) -> Result<()> {
    match fs::remove_file(target) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Permission bits of a template file, to be restored onto its target.
pub fn source_mode(path: &Path) -> Result<Option<u32>> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        Ok(Some(fs::metadata(path)?.permissions().mode()))
    }
    #[cfg(not(unix))]
    {
        fs::metadata(path)?;
        Ok(None)
    }
}
