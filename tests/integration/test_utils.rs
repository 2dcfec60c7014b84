//! Shared test utilities for integration tests
//!
//! Workspace fixtures, a recording command runner and orchestrator builders
//! so each test only states what differs.

use async_trait::async_trait;
use genfast::cache::{CacheStore, SledCacheStore};
use genfast::error::ExecError;
use genfast::generation::{
    CommandRunner, GeneratorCommand, Orchestrator, OrchestratorOptions, SchedulerOptions,
};
use genfast::plugin::Registry;
use genfast::scan::ScanOptions;
use parking_lot::Mutex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// Temporary source tree with a canonical root.
pub struct Workspace {
    _dir: TempDir,
    pub root: PathBuf,
}

impl Workspace {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let root = dunce::canonicalize(dir.path()).unwrap();
        Self { _dir: dir, root }
    }

    /// Write `content` to `relative`, creating parent directories.
    pub fn write(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    pub fn cache_path(&self) -> PathBuf {
        self.root.join(".genfast").join("cache")
    }

    pub fn roots(&self) -> Vec<PathBuf> {
        vec![self.root.clone()]
    }
}

/// Runner that records every command instead of launching it.
///
/// Commands whose arguments contain a word listed in `failing` fail.
#[derive(Default)]
pub struct RecordingRunner {
    calls: Mutex<Vec<GeneratorCommand>>,
    failing: Mutex<Vec<String>>,
}

impl RecordingRunner {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_on(&self, word: &str) {
        self.failing.lock().push(word.to_string());
    }

    pub fn clear_failures(&self) {
        self.failing.lock().clear();
    }

    pub fn count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Recorded `(program, args)` pairs, then forget them.
    pub fn take(&self) -> Vec<(String, Vec<String>)> {
        self.calls
            .lock()
            .drain(..)
            .map(|c| (c.program, c.args))
            .collect()
    }
}

#[async_trait]
impl CommandRunner for RecordingRunner {
    async fn run(&self, command: &GeneratorCommand) -> Result<(), ExecError> {
        self.calls.lock().push(command.clone());
        let failing = self.failing.lock();
        if command.args.iter().any(|a| failing.contains(a)) {
            return Err(ExecError::ExitStatus {
                program: command.program.clone(),
                status: "exit status: 1".to_string(),
            });
        }
        Ok(())
    }
}

pub fn options(families: &[&str]) -> OrchestratorOptions {
    OrchestratorOptions {
        scan: ScanOptions {
            families: families.iter().map(|f| f.to_string()).collect(),
            ..ScanOptions::default()
        },
        resolve_workers: 4,
        scheduler: SchedulerOptions {
            workers: 4,
            force: false,
        },
    }
}

pub fn orchestrator(
    cache: Arc<dyn CacheStore>,
    runner: Arc<dyn CommandRunner>,
    options: OrchestratorOptions,
) -> Orchestrator {
    let registry = Arc::new(Registry::with_builtins(&[]).unwrap());
    Orchestrator::new(registry, cache, runner, options)
}

/// Orchestrator over a persistent cache in the workspace.
pub fn persistent(ws: &Workspace, runner: Arc<RecordingRunner>) -> (Orchestrator, Arc<SledCacheStore>) {
    let cache = Arc::new(SledCacheStore::open(ws.cache_path()));
    let orch = orchestrator(cache.clone(), runner, options(&["go", "counterfeiter"]));
    (orch, cache)
}

pub fn relative<'a>(ws: &Workspace, path: &'a Path) -> &'a Path {
    path.strip_prefix(&ws.root).unwrap()
}
