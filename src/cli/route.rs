//! CLI route: single route table and run context. Dispatches to the
//! orchestrator, the cache and presentation.

use crate::cache::{CacheStore, SledCacheStore};
use crate::cli::parse::{Commands, OutputFormat};
use crate::cli::presentation::{format_run_summary, format_status_json, format_status_text};
use crate::config::{ConfigLoader, GenFastConfig};
use crate::error::RunError;
use crate::generation::{Orchestrator, ProcessRunner};
use crate::plugin::registry::Registry;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Rendered command result.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub text: String,
    /// False when the process should exit non-zero
    pub success: bool,
}

impl CommandOutput {
    fn ok(text: String) -> Self {
        Self {
            text,
            success: true,
        }
    }
}

/// Runtime context for CLI execution: workspace root and loaded config.
pub struct RunContext {
    workspace_root: PathBuf,
    config: GenFastConfig,
}

impl RunContext {
    /// Create run context from workspace root and optional config path. Uses ConfigLoader only.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, RunError> {
        let workspace_root = canonical(&workspace_root)?;
        let config = match config_path {
            Some(path) => ConfigLoader::load_from_file(&path)?,
            None => ConfigLoader::load(&workspace_root)?,
        };
        Ok(Self {
            workspace_root,
            config,
        })
    }

    pub fn from_config(workspace_root: PathBuf, config: GenFastConfig) -> Result<Self, RunError> {
        Ok(Self {
            workspace_root: canonical(&workspace_root)?,
            config,
        })
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    pub fn config(&self) -> &GenFastConfig {
        &self.config
    }

    /// Execute a CLI command via the single route table.
    pub fn execute(&self, command: &Commands) -> Result<CommandOutput, RunError> {
        match command {
            Commands::Run { paths, jobs, force } => self.handle_run(paths, *jobs, *force),
            Commands::Status { paths, format } => self.handle_status(paths, *format),
            Commands::Clean => self.handle_clean(),
            Commands::Config => self.handle_config(),
        }
    }

    fn roots(&self, paths: &[PathBuf]) -> Result<Vec<PathBuf>, RunError> {
        if paths.is_empty() {
            return Ok(vec![self.workspace_root.clone()]);
        }
        paths.iter().map(|p| canonical(p)).collect()
    }

    fn open_cache(&self) -> SledCacheStore {
        SledCacheStore::open(self.config.cache_path(&self.workspace_root))
    }

    fn orchestrator(&self, jobs: Option<usize>, force: bool) -> Result<Orchestrator, RunError> {
        let registry = Registry::with_builtins(&self.config.plugins.disabled)?;
        let mut options = self.config.orchestrator_options(force);
        if let Some(jobs) = jobs {
            if jobs == 0 {
                return Err(RunError::ConfigError(
                    "--jobs must be at least 1".to_string(),
                ));
            }
            options.scheduler.workers = jobs;
        }
        Ok(Orchestrator::new(
            Arc::new(registry),
            Arc::new(self.open_cache()),
            Arc::new(ProcessRunner::with_timeout(self.config.command_timeout())),
            options,
        ))
    }

    fn handle_run(
        &self,
        paths: &[PathBuf],
        jobs: Option<usize>,
        force: bool,
    ) -> Result<CommandOutput, RunError> {
        let roots = self.roots(paths)?;
        let orchestrator = self.orchestrator(jobs, force)?;
        let runtime = build_runtime()?;

        let cancel = orchestrator.cancellation_token();
        runtime.spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received; waiting for running generators to finish");
                cancel.cancel();
            }
        });

        info!(roots = roots.len(), force, "Starting run");
        let summary = runtime.block_on(orchestrator.run(&roots))?;
        Ok(CommandOutput {
            text: format_run_summary(&summary, &self.workspace_root),
            success: summary.is_success(),
        })
    }

    fn handle_status(
        &self,
        paths: &[PathBuf],
        format: OutputFormat,
    ) -> Result<CommandOutput, RunError> {
        let roots = self.roots(paths)?;
        let orchestrator = self.orchestrator(None, false)?;
        let report = build_runtime()?.block_on(orchestrator.status(&roots))?;
        let text = match format {
            OutputFormat::Text => format_status_text(&report, &self.workspace_root),
            OutputFormat::Json => format_status_json(&report, &self.workspace_root)?,
        };
        Ok(CommandOutput {
            text,
            success: report.failed() == 0,
        })
    }

    fn handle_clean(&self) -> Result<CommandOutput, RunError> {
        let cache = self.open_cache();
        let removed = cache.len();
        cache.clear()?;
        cache.flush().map_err(RunError::CacheWrite)?;
        Ok(CommandOutput::ok(format!(
            "Removed {} cache entries from {}",
            removed,
            cache.path().display()
        )))
    }

    fn handle_config(&self) -> Result<CommandOutput, RunError> {
        let text = toml::to_string_pretty(&self.config)
            .map_err(|e| RunError::ConfigError(format!("Failed to render configuration: {}", e)))?;
        Ok(CommandOutput::ok(text))
    }
}

fn canonical(path: &Path) -> Result<PathBuf, RunError> {
    dunce::canonicalize(path).map_err(|e| RunError::InvalidPath {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

fn build_runtime() -> Result<tokio::runtime::Runtime, RunError> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| RunError::Runtime(format!("Failed to start async runtime: {}", e)))
}
