//! Cache behaviour across processes and on unusable storage

use crate::integration::test_utils::{options, orchestrator, persistent, RecordingRunner, Workspace};
use genfast::cache::{CacheStore, SledCacheStore};
use genfast::error::RunError;
use std::fs;
use std::sync::Arc;

fn stringer_package(ws: &Workspace) {
    ws.write(
        "color/color.go",
        "package color\n\n//go:generate stringer -type=Color\ntype Color int\n",
    );
}

#[tokio::test]
async fn test_entries_survive_reopening_the_cache() {
    let ws = Workspace::new();
    stringer_package(&ws);

    let runner = RecordingRunner::new();
    {
        let (orch, _cache) = persistent(&ws, runner.clone());
        assert_eq!(orch.run(&ws.roots()).await.unwrap().succeeded(), 1);
    }

    // A fresh store over the same directory sees the recorded run.
    let (orch, cache) = persistent(&ws, runner.clone());
    assert!(cache.is_persistent());
    assert_eq!(cache.len(), 1);
    let summary = orch.run(&ws.roots()).await.unwrap();
    assert_eq!(summary.skipped(), 1);
    assert_eq!(runner.count(), 1);
}

#[tokio::test]
async fn test_in_memory_cache_forgets_between_runs() {
    let ws = Workspace::new();
    stringer_package(&ws);
    let runner = RecordingRunner::new();

    for _ in 0..2 {
        let orch = orchestrator(
            Arc::new(SledCacheStore::in_memory()),
            runner.clone(),
            options(&["go"]),
        );
        assert_eq!(orch.run(&ws.roots()).await.unwrap().succeeded(), 1);
    }
    assert_eq!(runner.count(), 2);
}

#[tokio::test]
async fn test_unwritable_cache_fails_the_run() {
    let ws = Workspace::new();
    stringer_package(&ws);
    fs::create_dir_all(ws.path(".genfast")).unwrap();
    fs::write(ws.cache_path(), "not a database").unwrap();

    let runner = RecordingRunner::new();
    let (orch, cache) = persistent(&ws, runner.clone());
    assert!(!cache.is_persistent());

    let err = orch.run(&ws.roots()).await.unwrap_err();
    assert!(matches!(err, RunError::CacheWrite(_)));
    // Generators still ran; only the record of them was lost.
    assert_eq!(runner.count(), 1);
}

#[tokio::test]
async fn test_clear_forces_full_rerun() {
    let ws = Workspace::new();
    stringer_package(&ws);
    let runner = RecordingRunner::new();
    let (orch, cache) = persistent(&ws, runner.clone());

    orch.run(&ws.roots()).await.unwrap();
    cache.clear().unwrap();
    let summary = orch.run(&ws.roots()).await.unwrap();
    assert_eq!(summary.succeeded(), 1);
    assert_eq!(runner.count(), 2);
}
