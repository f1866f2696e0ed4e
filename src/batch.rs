//! # Batch Operations
//!
//! The commands that act on every selected module without rendering
//! anything: `clone`, `reset`, `push` and `execute`. Modules are processed
//! sequentially in registry order.

use std::path::Path;
use std::process::Command;

use log::{error, info};
use regex::Regex;

use crate::error::{Error, Result};
use crate::modules::{self, ManagedModule};
use crate::options::RunOptions;
use crate::repository::{DefaultGitOperations, GitOperations, Repository};

/// Environment variables withheld from `execute` subprocesses.
const STRIPPED_ENV_PATTERN: &str = r"^(CARGO|RUSTUP|RUSTC|RUSTDOC|BUNDLE|GEM_)|RUBY|^SOURCE_DATE_EPOCH$";

/// Keep only the variables a user command should inherit.
pub fn sanitized_environment<I>(vars: I) -> Result<Vec<(String, String)>>
where
    I: IntoIterator<Item = (String, String)>,
{
    let stripped = Regex::new(STRIPPED_ENV_PATTERN)?;
    Ok(vars
        .into_iter()
        .filter(|(key, _)| !stripped.is_match(key))
        .collect())
}

pub struct BatchRunner<'a> {
    options: &'a RunOptions,
    git: Box<dyn GitOperations>,
}

impl<'a> BatchRunner<'a> {
    pub fn new(options: &'a RunOptions) -> Self {
        Self {
            options,
            git: Box::new(DefaultGitOperations),
        }
    }

    pub fn with_operations(options: &'a RunOptions, git: Box<dyn GitOperations>) -> Self {
        Self { options, git }
    }

    fn repository(&self, module: &ManagedModule) -> Repository<'_> {
        Repository::new(
            self.git.as_ref(),
            module.working_directory(self.options),
            module.remote_url(self.options),
        )
    }

    /// Clone every module that has no working copy yet. Returns the names of
    /// the modules that were cloned.
    pub fn clone_all(&self) -> Result<Vec<String>> {
        let mut cloned = Vec::new();
        for module in modules::load_managed_modules(self.options)? {
            let repo = self.repository(&module);
            if repo.is_cloned() {
                info!("{}: already cloned", module.given_name);
                continue;
            }
            repo.clone_repo()?;
            cloned.push(module.given_name);
        }
        Ok(cloned)
    }

    /// Reset every module to its remote branch (or `source_branch`) and
    /// remove untracked files.
    pub fn reset_all(&self) -> Result<()> {
        let options = self.options;
        let branch = options.require_branch("reset")?;
        for module in modules::load_managed_modules(options)? {
            info!("{}: resetting", module.given_name);
            self.repository(&module).reset_workspace(
                module.options.branch.as_deref().unwrap_or(branch),
                options.source_branch.as_deref(),
                options.default_branch.as_deref(),
                options.offline,
            )?;
        }
        Ok(())
    }

    /// Force-push the branch of every module.
    pub fn push_all(&self) -> Result<()> {
        let options = self.options;
        let branch = options.require_branch("push")?;
        for module in modules::load_managed_modules(options)? {
            let repo = self.repository(&module);
            let branch = module.options.branch.as_deref().unwrap_or(branch);
            repo.push(branch, options.remote_branch.as_deref())
                .map_err(|e| Error::Workspace {
                    path: repo.directory().to_path_buf(),
                    message: format!("Error while pushing '{}': {}", module.given_name, e),
                })?;
        }
        Ok(())
    }

    /// Run `command` in every module's working copy.
    ///
    /// Failures are collected and reported together at the end, unless
    /// `fail_fast` is set.
    pub fn execute(&self, command: &[String]) -> Result<()> {
        let options = self.options;
        let (program, args) = command.split_first().ok_or_else(|| Error::Configuration {
            message: "no command given to execute".to_string(),
        })?;
        let program = resolve_program(program)?;
        let environment = sanitized_environment(std::env::vars())?;
        let display = command.join(" ");

        let mut failures = Vec::new();
        for module in modules::load_managed_modules(options)? {
            let repo = self.repository(&module);
            if !repo.is_cloned() {
                repo.clone_repo()?;
            }
            repo.switch(module.branch(options), options.default_branch.as_deref())?;

            info!("{}: running '{}'", module.given_name, display);
            if let Err(err) = run_command(&program, args, repo.directory(), &environment, &display) {
                if options.fail_fast {
                    return Err(err);
                }
                error!("{}: {}", module.given_name, err);
                failures.push((module.given_name.clone(), err.to_string()));
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(Error::ExecuteFailures { failures })
        }
    }
}

/// An existing local file is run by absolute path; anything else is looked
/// up on `PATH` by the child.
fn resolve_program(program: &str) -> Result<String> {
    let path = Path::new(program);
    if path.is_file() {
        return Ok(std::path::absolute(path)?.to_string_lossy().into_owned());
    }
    Ok(program.to_string())
}

fn run_command(
    program: &str,
    args: &[String],
    workdir: &Path,
    environment: &[(String, String)],
    display: &str,
) -> Result<()> {
    let status = Command::new(program)
        .args(args)
        .current_dir(workdir)
        .env_clear()
        .envs(environment.iter().map(|(k, v)| (k, v)))
        .status()
        .map_err(|e| Error::Command {
            command: display.to_string(),
            message: e.to_string(),
        })?;

    if status.success() {
        Ok(())
    } else {
        Err(Error::Command {
            command: display.to_string(),
            message: status.to_string(),
        })
    }
}
