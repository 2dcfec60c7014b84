//! Configuration System
//!
//! Layered configuration: built-in defaults, the global file, the workspace
//! file and `GENFAST__SECTION__KEY` environment variables, highest last.
//! Validation reports every problem at once.

use crate::generation::{OrchestratorOptions, SchedulerOptions};
use crate::logging::LoggingConfig;
use crate::scan::{ScanOptions, WalkerConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenFastConfig {
    #[serde(default)]
    pub scan: ScanConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub executor: ExecutorConfig,

    #[serde(default)]
    pub plugins: PluginsConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Directive discovery settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Generator families recognized as `//<family>:generate`
    #[serde(default = "default_families")]
    pub families: Vec<String>,

    /// Directory names skipped while walking
    #[serde(default = "default_ignore_patterns")]
    pub ignore_patterns: Vec<String>,

    #[serde(default)]
    pub follow_symlinks: bool,
}

fn default_families() -> Vec<String> {
    vec![crate::directive::GO_FAMILY.to_string()]
}

fn default_ignore_patterns() -> Vec<String> {
    WalkerConfig::default().ignore_patterns
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            families: default_families(),
            ignore_patterns: default_ignore_patterns(),
            follow_symlinks: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Cache database location, relative to the workspace root
    #[serde(default = "default_cache_path")]
    pub path: PathBuf,
}

fn default_cache_path() -> PathBuf {
    PathBuf::from(".genfast/cache")
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            path: default_cache_path(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Generator commands running at once
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Directives resolved at once
    #[serde(default = "default_workers")]
    pub resolve_workers: usize,

    /// Kill a generator after this many seconds (no limit when unset)
    #[serde(default)]
    pub command_timeout_secs: Option<u64>,
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            resolve_workers: default_workers(),
            command_timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PluginsConfig {
    /// Built-in plugins to leave unregistered
    #[serde(default)]
    pub disabled: Vec<String>,
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Scan(String),
    Cache(String),
    Executor(String),
    Logging(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Scan(msg) => write!(f, "scan: {}", msg),
            ValidationError::Cache(msg) => write!(f, "cache: {}", msg),
            ValidationError::Executor(msg) => write!(f, "executor: {}", msg),
            ValidationError::Logging(msg) => write!(f, "logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl GenFastConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.scan.families.is_empty() {
            errors.push(ValidationError::Scan(
                "at least one generator family is required".to_string(),
            ));
        }
        for family in &self.scan.families {
            if family.is_empty() || family.contains(|c: char| c.is_whitespace() || c == ':') {
                errors.push(ValidationError::Scan(format!(
                    "invalid generator family {:?}",
                    family
                )));
            }
        }

        if self.cache.path.as_os_str().is_empty() {
            errors.push(ValidationError::Cache(
                "cache path cannot be empty".to_string(),
            ));
        }

        if self.executor.workers == 0 {
            errors.push(ValidationError::Executor(
                "workers must be at least 1".to_string(),
            ));
        }
        if self.executor.resolve_workers == 0 {
            errors.push(ValidationError::Executor(
                "resolve_workers must be at least 1".to_string(),
            ));
        }
        if self.executor.command_timeout_secs == Some(0) {
            errors.push(ValidationError::Executor(
                "command_timeout_secs must be positive when set".to_string(),
            ));
        }

        if !matches!(self.logging.format.as_str(), "text" | "json") {
            errors.push(ValidationError::Logging(format!(
                "invalid format {:?}",
                self.logging.format
            )));
        }
        if !matches!(self.logging.output.as_str(), "stderr" | "stdout" | "file") {
            errors.push(ValidationError::Logging(format!(
                "invalid output {:?}",
                self.logging.output
            )));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Cache location, resolved against the workspace root when relative.
    pub fn cache_path(&self, workspace_root: &Path) -> PathBuf {
        if self.cache.path.is_absolute() {
            self.cache.path.clone()
        } else {
            workspace_root.join(&self.cache.path)
        }
    }

    pub fn command_timeout(&self) -> Option<Duration> {
        self.executor.command_timeout_secs.map(Duration::from_secs)
    }

    pub fn orchestrator_options(&self, force: bool) -> OrchestratorOptions {
        OrchestratorOptions {
            scan: ScanOptions {
                families: self.scan.families.clone(),
                walker: WalkerConfig {
                    follow_symlinks: self.scan.follow_symlinks,
                    ignore_patterns: self.scan.ignore_patterns.clone(),
                    ..WalkerConfig::default()
                },
            },
            resolve_workers: self.executor.resolve_workers,
            scheduler: SchedulerOptions {
                workers: self.executor.workers,
                force,
            },
        }
    }
}
