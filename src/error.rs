//! Error types for the genfast directive cache.
//!
//! Errors are split by the layer that produces them. Everything except
//! [`RunError`] is scoped to a single directive and is collected into the run
//! summary rather than aborting the run.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Malformed directive line found while scanning. Never fatal.
#[derive(Debug, Clone, Error)]
pub enum ScanWarning {
    #[error("{path}:{line}: malformed directive: {reason}")]
    Malformed {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("{path}: cannot read source file: {reason}")]
    Unreadable { path: PathBuf, reason: String },

    #[error("cannot walk {path}: {reason}")]
    Walk { path: PathBuf, reason: String },
}

/// Failure to compute a directive's inputs and outputs.
#[derive(Debug, Clone, Error)]
pub enum ResolveError {
    #[error("no registered plugin understands this directive")]
    NoMatchingPlugin,

    #[error("cannot read {path}: {reason}")]
    Unreadable { path: PathBuf, reason: String },

    #[error("scope {scope:?} is not supported, only the current package (.) is allowed")]
    UnsupportedScope { scope: String },

    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("cannot find declaration of {} in {}", names.join(", "), dir.display())]
    DeclarationNotFound { names: Vec<String>, dir: PathBuf },

    #[error("no Go package found in {0}")]
    NoPackage(PathBuf),

    #[error("cannot parse {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("input file {0} does not exist")]
    MissingInput(PathBuf),

    #[error("resolution task aborted: {0}")]
    SearchAborted(String),
}

/// Failure to run a directive's generator command.
#[derive(Debug, Clone, Error)]
pub enum ExecError {
    #[error("directive has no command")]
    EmptyCommand,

    #[error("cannot launch {program}: {reason}")]
    Launch { program: String, reason: String },

    #[error("{program} exited with {status}")]
    ExitStatus { program: String, status: String },

    #[error("{program} timed out after {limit:?}")]
    TimedOut { program: String, limit: Duration },

    #[error("execution task aborted: {0}")]
    Aborted(String),
}

/// Cache persistence errors.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache database error: {0}")]
    Database(#[from] sled::Error),

    #[error("cache encoding error: {0}")]
    Encoding(#[from] bincode::Error),

    #[error("cache is unavailable: {0}")]
    Unavailable(String),

    #[error("cache I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Plugin registry initialization errors.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("plugin {0:?} is registered twice")]
    Duplicate(String),

    #[error("unknown plugin {0:?} in plugins.disabled")]
    UnknownPlugin(String),
}

/// Fatal errors that abort a run.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Plugin registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Cannot write cache: {0}")]
    CacheWrite(#[source] CacheError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Cannot use path {path}: {reason}")]
    InvalidPath { path: PathBuf, reason: String },

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Runtime error: {0}")]
    Runtime(String),
}

impl From<config::ConfigError> for RunError {
    fn from(err: config::ConfigError) -> Self {
        RunError::ConfigError(err.to_string())
    }
}
