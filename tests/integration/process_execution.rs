//! Directives executed as real child processes

#![cfg(unix)]

use crate::integration::test_utils::{options, Workspace};
use async_trait::async_trait;
use genfast::cache::{CacheStore, SledCacheStore};
use genfast::directive::Directive;
use genfast::error::{ExecError, ResolveError};
use genfast::generation::{Orchestrator, Outcome, ProcessRunner};
use genfast::plugin::{InputOutputFiles, Plugin, Registry};
use std::fs;
use std::sync::Arc;

/// Treats `sh` directives as depending on their declaring file only.
struct ShellPlugin;

#[async_trait]
impl Plugin for ShellPlugin {
    fn name(&self) -> &'static str {
        "shell"
    }

    fn matches(&self, directive: &Directive) -> bool {
        directive.program() == Some("sh")
    }

    async fn resolve(&self, directive: &Directive) -> Result<InputOutputFiles, ResolveError> {
        let mut io = InputOutputFiles::new();
        io.inputs.insert(directive.path.clone());
        io.outputs.insert("*.out".to_string());
        Ok(io)
    }
}

fn shell_orchestrator(ws: &Workspace) -> (Orchestrator, Arc<SledCacheStore>) {
    let mut registry = Registry::new();
    registry.register(Arc::new(ShellPlugin)).unwrap();
    let cache = Arc::new(SledCacheStore::open(ws.cache_path()));
    let orch = Orchestrator::new(
        Arc::new(registry),
        cache.clone(),
        Arc::new(ProcessRunner::new()),
        options(&["go"]),
    );
    (orch, cache)
}

#[tokio::test]
async fn test_generator_runs_in_directive_dir_with_go_environment() {
    let ws = Workspace::new();
    ws.write(
        "gen/gen.go",
        "package gen\n\n//go:generate sh -c \"printf '%s %s %s' $GOFILE $GOLINE $GOPACKAGE > gen.out\"\n",
    );
    let (orch, _cache) = shell_orchestrator(&ws);

    let summary = orch.run(&ws.roots()).await.unwrap();
    assert!(summary.is_success(), "{:?}", summary.results);
    let written = fs::read_to_string(ws.path("gen/gen.out")).unwrap();
    assert_eq!(written, "gen.go 3 gen");
}

#[tokio::test]
async fn test_nonzero_exit_is_not_cached() {
    let ws = Workspace::new();
    ws.write(
        "gen/gen.go",
        "package gen\n\n//go:generate sh -c \"exit 2\"\n",
    );
    let (orch, cache) = shell_orchestrator(&ws);

    let first = orch.run(&ws.roots()).await.unwrap();
    assert_eq!(first.failed(), 1);
    assert!(matches!(
        first.results[0].outcome,
        Outcome::Failed(ExecError::ExitStatus { .. })
    ));
    assert!(cache.is_empty());

    let second = orch.run(&ws.roots()).await.unwrap();
    assert_eq!(second.failed(), 1);
    assert_eq!(second.skipped(), 0);
}

#[tokio::test]
async fn test_missing_program_fails_only_its_directive() {
    let ws = Workspace::new();
    ws.write(
        "gen/gen.go",
        "package gen\n\n//go:generate sh -c \"touch ok.out\"\n",
    );
    ws.write(
        "other/other.go",
        "package other\n\n//go:generate sh -c \"genfast-missing-tool\"\n",
    );
    let (orch, cache) = shell_orchestrator(&ws);

    let summary = orch.run(&ws.roots()).await.unwrap();
    assert_eq!(summary.succeeded(), 1);
    assert_eq!(summary.failed(), 1);
    assert!(ws.path("gen/ok.out").exists());
    assert_eq!(cache.len(), 1);
}

#[tokio::test]
async fn test_editing_declaring_file_reruns_generator() {
    let ws = Workspace::new();
    ws.write(
        "gen/gen.go",
        "package gen\n\n//go:generate sh -c \"echo run >> runs.out\"\n",
    );
    let (orch, _cache) = shell_orchestrator(&ws);

    orch.run(&ws.roots()).await.unwrap();
    orch.run(&ws.roots()).await.unwrap();
    ws.write(
        "gen/gen.go",
        "package gen\n\n//go:generate sh -c \"echo run >> runs.out\"\n\nconst X = 1\n",
    );
    orch.run(&ws.roots()).await.unwrap();

    let runs = fs::read_to_string(ws.path("gen/runs.out")).unwrap();
    assert_eq!(runs.lines().count(), 2);
}
