//! # Sync Orchestrator
//!
//! Drives `update` across the module registry. For each module, in registry
//! order:
//!
//! 1. prepare the working copy (clone or fetch and reset, then switch branch),
//!    skipped offline where the existing clone is used as is
//! 2. load `.sync.yml` and resolve [`Settings`]
//! 3. report unmanaged files
//! 4. render or remove every managed file
//! 5. either preview the changes (no-op), stop (offline), or commit and push,
//!    followed by the optional bump, tag and pull request
//!
//! Failures are caught at the module boundary and matched against the
//! skip-broken policy; one module's failure never leaves the others
//! unattempted when skipping is enabled.

use log::{error, info, warn};
use serde_yaml::Mapping;

use crate::config::{self, MODULE_CONFIG_FILE};
use crate::error::{Error, Result};
use crate::forge::{GhCliOpener, PullRequest, PullRequestOpener};
use crate::modules::{self, ManagedModule};
use crate::options::RunOptions;
use crate::renderer::{self, RenderMetadata};
use crate::repository::{ChangeReport, DefaultGitOperations, GitOperations, Repository, SubmitOptions};
use crate::settings::Settings;
use crate::templates::{TemplateSet, TEMPLATE_SUFFIX};

/// What happened to one module during `update`.
#[derive(Debug, Clone, PartialEq)]
pub enum ModuleOutcome {
    /// Committed and pushed.
    Pushed,
    /// Nothing to commit.
    Unchanged,
    /// No-op run; the changes that would have been committed.
    Previewed(ChangeReport),
    /// Offline run; files were rendered but nothing was committed.
    Offline,
    /// Failed and skipped under the skip-broken policy.
    Skipped(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModuleReport {
    pub name: String,
    pub outcome: ModuleOutcome,
    /// Candidates left untouched.
    pub unmanaged: Vec<String>,
}

/// Per-module results of one `update` run, in registry order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateSummary {
    pub modules: Vec<ModuleReport>,
}

impl UpdateSummary {
    pub fn skipped(&self) -> Vec<&str> {
        self.modules
            .iter()
            .filter(|m| matches!(m.outcome, ModuleOutcome::Skipped(_)))
            .map(|m| m.name.as_str())
            .collect()
    }

    /// Fail the run when modules were skipped and warnings are fatal.
    pub fn enforce(&self, fail_on_warnings: bool) -> Result<()> {
        let skipped = self.skipped();
        if fail_on_warnings && !skipped.is_empty() {
            return Err(Error::SkippedModules {
                count: skipped.len(),
                modules: skipped.into_iter().map(str::to_string).collect(),
            });
        }
        Ok(())
    }
}

/// Runs `update` for one set of run options.
pub struct Synchronizer<'a> {
    options: &'a RunOptions,
    git: Box<dyn GitOperations>,
    forge: Box<dyn PullRequestOpener>,
}

impl<'a> Synchronizer<'a> {
    pub fn new(options: &'a RunOptions) -> Self {
        Self {
            options,
            git: Box::new(DefaultGitOperations),
            forge: Box::new(GhCliOpener),
        }
    }

    /// Use custom git and forge implementations.
    pub fn with_operations(
        options: &'a RunOptions,
        git: Box<dyn GitOperations>,
        forge: Box<dyn PullRequestOpener>,
    ) -> Self {
        Self {
            options,
            git,
            forge,
        }
    }

    /// Sync every selected module.
    pub fn update(&self) -> Result<UpdateSummary> {
        let options = self.options;
        if !options.noop && !options.offline && options.message.is_none() {
            return Err(Error::Configuration {
                message: "a commit message is required (use --message), unless running with --noop or --offline".to_string(),
            });
        }

        let modules = modules::load_managed_modules(options)?;
        let defaults = config::parse_config(options.config_defaults_path())?;
        let templates = TemplateSet::discover(options.template_root())?;
        info!(
            "Syncing {} template(s) across {} module(s)",
            templates.len(),
            modules.len()
        );

        let mut summary = UpdateSummary::default();
        for module in &modules {
            match self.manage_module(module, &defaults, &templates) {
                Ok(report) => summary.modules.push(report),
                Err(err) => {
                    if err.is_domain() {
                        error!("{}: {}", module.given_name, err);
                    }
                    if !options.skip_broken {
                        return Err(err);
                    }
                    warn!("Skipping '{}' as update process failed", module.given_name);
                    summary.modules.push(ModuleReport {
                        name: module.given_name.clone(),
                        outcome: ModuleOutcome::Skipped(err.to_string()),
                        unmanaged: Vec::new(),
                    });
                }
            }
        }
        Ok(summary)
    }

    /// Process a single module end to end.
    pub fn manage_module(
        &self,
        module: &ManagedModule,
        defaults: &Mapping,
        templates: &TemplateSet,
    ) -> Result<ModuleReport> {
        let options = self.options;
        let workdir = module.working_directory(options);
        let repo = Repository::new(self.git.as_ref(), &workdir, module.remote_url(options));

        // Offline runs render into the working copy exactly as it is.
        let branch = if options.offline {
            if !repo.is_cloned() {
                return Err(Error::Workspace {
                    path: workdir,
                    message: "Unable to clone in offline mode.".to_string(),
                });
            }
            None
        } else {
            Some(repo.prepare_workspace(
                module.branch(options),
                options.default_branch.as_deref(),
                false,
            )?)
        };

        let module_configs = config::parse_config(workdir.join(MODULE_CONFIG_FILE))?;
        let settings = Settings::new(defaults.clone(), module_configs);

        let unmanaged: Vec<String> = settings.unmanaged_files(templates).into_iter().collect();
        for file in &unmanaged {
            info!("{}: Not managing '{}'", module.given_name, file);
        }

        let managed: Vec<String> = settings.managed_files(templates).into_iter().collect();
        for file in &managed {
            self.manage_file(module, &settings, templates, file)?;
        }

        let outcome = if options.noop {
            info!(
                "Using no-op. Files in '{}' may be changed but will not be committed.",
                module.given_name
            );
            let report = repo.show_changes()?;
            if report.has_changes() && options.pr {
                match &branch {
                    Some(branch) => self.open_pull_request(module, &repo, branch)?,
                    None => info!(
                        "{}: Not opening a pull request in offline mode",
                        module.given_name
                    ),
                }
            }
            ModuleOutcome::Previewed(report)
        } else if let Some(branch) = &branch {
            self.submit(module, &repo, branch, &managed)?
        } else {
            ModuleOutcome::Offline
        };

        Ok(ModuleReport {
            name: module.given_name.clone(),
            outcome,
            unmanaged,
        })
    }

    /// Render or remove one managed file in the module's working copy.
    pub fn manage_file(
        &self,
        module: &ManagedModule,
        settings: &Settings,
        templates: &TemplateSet,
        filename: &str,
    ) -> Result<()> {
        let options = self.options;
        if !config::is_contained_path(filename) {
            return Err(Error::Configuration {
                message: format!(
                    "'{}' in module '{}' is not a path inside the module",
                    filename, module.given_name
                ),
            });
        }
        let file_config = settings.build_file_configs(filename);
        let target = module.path(options, filename);

        if file_config.is_delete() {
            return renderer::remove(&target);
        }

        let source = templates
            .get(filename)
            .ok_or_else(|| Error::TemplateNotFound {
                path: templates
                    .root()
                    .join(format!("{}{}", filename, TEMPLATE_SUFFIX)),
            })?;

        let metadata = RenderMetadata {
            module_name: module.repository_name().to_string(),
            namespace: module.repository_namespace(options).to_string(),
            workdir: module.working_directory(options),
            target_file: target.clone(),
        };

        let text = renderer::build(source)
            .and_then(|compiled| renderer::render(&compiled, &file_config, &metadata))
            .inspect_err(|_| {
                error!(
                    "{}: Error while rendering file: '{}'",
                    module.given_name, filename
                )
            })?;

        renderer::sync(&text, &target, renderer::source_mode(source.path())?)
    }

    fn submit(
        &self,
        module: &ManagedModule,
        repo: &Repository<'_>,
        branch: &str,
        files: &[String],
    ) -> Result<ModuleOutcome> {
        let options = self.options;
        let message = options.message.as_deref().unwrap_or_default();
        let script = options.pre_commit_script_path();
        let submit_options = SubmitOptions {
            branch,
            message,
            remote_branch: options.remote_branch.as_deref(),
            default_branch: options.default_branch.as_deref(),
            amend: options.amend,
            force: options.force,
            pre_commit_script: script.as_deref(),
        };

        if !repo.submit_changes(files, &submit_options)? {
            return Ok(ModuleOutcome::Unchanged);
        }

        if options.bump {
            let version = repo.bump(message, options.changelog, &submit_options)?;
            if options.tag {
                repo.tag(&version, &options.tag_pattern)?;
            }
        }
        if options.pr {
            self.open_pull_request(module, repo, branch)?;
        }
        Ok(ModuleOutcome::Pushed)
    }

    fn open_pull_request(&self, module: &ManagedModule, repo: &Repository<'_>, branch: &str) -> Result<()> {
        let options = self.options;
        let message = options.message.clone().unwrap_or_default();
        let request = PullRequest {
            title: options
                .pr_title
                .clone()
                .unwrap_or_else(|| message.clone()),
            body: message,
            head_branch: options
                .remote_branch
                .clone()
                .unwrap_or_else(|| branch.to_string()),
            target_branch: options.pr_target_branch.clone(),
            labels: options.pr_labels.clone(),
        };
        info!(
            "{}: Opening pull request '{}' from '{}'",
            module.given_name, request.title, request.head_branch
        );
        self.forge.open(repo.directory(), &request)
    }
}
