//! End-to-end runs of the orchestrator over real source trees

use crate::integration::test_utils::{persistent, RecordingRunner, Workspace};
use genfast::cache::{CacheEntry, CacheStore, Staleness};
use genfast::directive::DirectiveKey;
use genfast::error::ResolveError;
use genfast::generation::Outcome;

const THING: &str = "package pkg\n\ntype Thing interface {\n\tDo() error\n}\n";

fn counterfeiter_package(ws: &Workspace) {
    ws.write(
        "pkg/a.go",
        "package pkg\n\n//counterfeiter:generate . Thing\n\nfunc helper() int { return 1 }\n",
    );
    ws.write("pkg/b.go", THING);
}

#[tokio::test]
async fn test_directive_lifecycle_example() {
    let ws = Workspace::new();
    counterfeiter_package(&ws);
    let runner = RecordingRunner::new();
    let (orch, cache) = persistent(&ws, runner.clone());

    // First run executes and records F1.
    let first = orch.run(&ws.roots()).await.unwrap();
    assert!(first.is_success());
    assert_eq!(first.succeeded(), 1);
    assert_eq!(
        runner.take(),
        vec![(
            "counterfeiter".to_string(),
            vec![".".to_string(), "Thing".to_string()]
        )]
    );

    let key = DirectiveKey {
        path: ws.path("pkg/a.go"),
        directive: "//counterfeiter:generate . Thing".to_string(),
    };
    let f1 = cache.lookup(&key).unwrap();
    assert_eq!(
        f1.output_patterns.iter().collect::<Vec<_>>(),
        vec!["pkgfakes/*.go"]
    );
    assert_eq!(f1.plugin, "counterfeiter");

    // Editing the declaring input re-executes with a new fingerprint F2.
    ws.write(
        "pkg/b.go",
        "package pkg\n\ntype Thing interface {\n\tDo() error\n\tUndo()\n}\n",
    );
    let second = orch.run(&ws.roots()).await.unwrap();
    assert_eq!(second.succeeded(), 1);
    assert_eq!(second.results[0].staleness, Some(Staleness::FingerprintChanged));
    let f2 = cache.lookup(&key).unwrap();
    assert_ne!(f1.fingerprint, f2.fingerprint);

    // Unrelated edits to the declaring file leave F2 in place.
    ws.write(
        "pkg/a.go",
        "package pkg\n\n//counterfeiter:generate . Thing\n\nfunc helper() int { return 2 }\n",
    );
    let third = orch.run(&ws.roots()).await.unwrap();
    assert_eq!(third.skipped(), 1);
    assert_eq!(cache.lookup(&key).unwrap().fingerprint, f2.fingerprint);
    assert_eq!(runner.count(), 1);
}

#[tokio::test]
async fn test_second_run_without_changes_executes_nothing() {
    let ws = Workspace::new();
    counterfeiter_package(&ws);
    ws.write(
        "color/color.go",
        "package color\n\n//go:generate stringer -type=Color\ntype Color int\n",
    );
    let runner = RecordingRunner::new();
    let (orch, _cache) = persistent(&ws, runner.clone());

    let first = orch.run(&ws.roots()).await.unwrap();
    assert_eq!(first.succeeded(), 2);
    let second = orch.run(&ws.roots()).await.unwrap();
    assert_eq!(second.skipped(), 2);
    assert_eq!(second.executed(), 0);
    assert_eq!(runner.count(), 2);
}

#[tokio::test]
async fn test_input_change_reruns_only_its_owner() {
    let ws = Workspace::new();
    counterfeiter_package(&ws);
    ws.write(
        "color/color.go",
        "package color\n\n//go:generate stringer -type=Color\n",
    );
    ws.write("color/types.go", "package color\n\ntype Color int\n");
    let runner = RecordingRunner::new();
    let (orch, _cache) = persistent(&ws, runner.clone());
    orch.run(&ws.roots()).await.unwrap();
    runner.take();

    ws.write("color/types.go", "package color\n\ntype Color uint8\n");
    let summary = orch.run(&ws.roots()).await.unwrap();

    assert_eq!(summary.succeeded(), 1);
    assert_eq!(summary.skipped(), 1);
    let calls = runner.take();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "stringer");
}

#[tokio::test]
async fn test_changed_output_patterns_force_rerun() {
    let ws = Workspace::new();
    counterfeiter_package(&ws);
    let runner = RecordingRunner::new();
    let (orch, cache) = persistent(&ws, runner.clone());
    orch.run(&ws.roots()).await.unwrap();

    // Same fingerprint, different recorded outputs.
    let key = DirectiveKey {
        path: ws.path("pkg/a.go"),
        directive: "//counterfeiter:generate . Thing".to_string(),
    };
    let recorded = cache.lookup(&key).unwrap();
    cache
        .put(
            &key,
            CacheEntry {
                output_patterns: ["mocks/*.go".to_string()].into_iter().collect(),
                ..recorded
            },
        )
        .unwrap();

    let summary = orch.run(&ws.roots()).await.unwrap();
    assert_eq!(summary.succeeded(), 1);
    assert_eq!(summary.results[0].staleness, Some(Staleness::OutputsChanged));
    assert_eq!(runner.count(), 2);
}

#[tokio::test]
async fn test_resolution_failure_is_isolated() {
    let ws = Workspace::new();
    counterfeiter_package(&ws);
    ws.write(
        "broken/broken.go",
        "package broken\n\n//go:generate counterfeiter . Missing\n//go:generate counterfeiter ../other Thing\n",
    );
    let runner = RecordingRunner::new();
    let (orch, cache) = persistent(&ws, runner.clone());

    let summary = orch.run(&ws.roots()).await.unwrap();
    assert!(!summary.is_success());
    assert_eq!(summary.succeeded(), 1);
    assert_eq!(summary.resolution_failed(), 2);
    assert_eq!(cache.len(), 1);

    let errors: Vec<&ResolveError> = summary
        .results
        .iter()
        .filter_map(|r| match &r.outcome {
            Outcome::ResolutionFailed(err) => Some(err),
            _ => None,
        })
        .collect();
    assert!(matches!(
        errors[0],
        ResolveError::DeclarationNotFound { names, .. } if names == &vec!["Missing".to_string()]
    ));
    assert!(matches!(errors[1], ResolveError::UnsupportedScope { scope } if scope == "../other"));
}

#[tokio::test]
async fn test_failed_command_is_retried_next_run() {
    let ws = Workspace::new();
    ws.write(
        "color/color.go",
        "package color\n\n//go:generate stringer -type=Color\n//go:generate stringer -type=Shade\ntype Color int\ntype Shade int\n",
    );
    let runner = RecordingRunner::new();
    runner.fail_on("-type=Shade");
    let (orch, cache) = persistent(&ws, runner.clone());

    let first = orch.run(&ws.roots()).await.unwrap();
    assert_eq!(first.succeeded(), 1);
    assert_eq!(first.failed(), 1);
    assert!(!first.is_success());
    assert_eq!(cache.len(), 1);

    runner.clear_failures();
    runner.take();
    let second = orch.run(&ws.roots()).await.unwrap();
    assert!(second.is_success());
    assert_eq!(second.skipped(), 1);
    assert_eq!(second.succeeded(), 1);
    assert_eq!(runner.take()[0].1, vec!["-type=Shade".to_string()]);
}

#[tokio::test]
async fn test_directive_reachable_twice_runs_once() {
    let ws = Workspace::new();
    counterfeiter_package(&ws);
    let runner = RecordingRunner::new();
    let (orch, _cache) = persistent(&ws, runner.clone());

    let roots = vec![ws.root.clone(), ws.path("pkg"), ws.path("pkg/a.go")];
    let summary = orch.run(&roots).await.unwrap();
    assert_eq!(summary.total(), 1);
    assert_eq!(runner.count(), 1);
}

#[cfg(unix)]
#[tokio::test]
async fn test_symlinked_alias_runs_once() {
    let ws = Workspace::new();
    counterfeiter_package(&ws);
    std::os::unix::fs::symlink(ws.path("pkg"), ws.path("alias")).unwrap();
    let runner = RecordingRunner::new();
    let (orch, _cache) = persistent(&ws, runner.clone());

    let summary = orch
        .run(&[ws.path("pkg"), ws.path("alias")])
        .await
        .unwrap();
    assert_eq!(summary.total(), 1);
    assert_eq!(runner.count(), 1);
}

#[tokio::test]
async fn test_reordering_directives_keeps_cache_entries() {
    let ws = Workspace::new();
    ws.write(
        "pkg/a.go",
        "package pkg\n\n//go:generate counterfeiter . Thing\n//go:generate counterfeiter . Other\n",
    );
    ws.write(
        "pkg/b.go",
        "package pkg\n\ntype Thing interface{ Do() }\ntype Other interface{ Go() }\n",
    );
    let runner = RecordingRunner::new();
    let (orch, _cache) = persistent(&ws, runner.clone());
    orch.run(&ws.roots()).await.unwrap();

    ws.write(
        "pkg/a.go",
        "package pkg\n\n//go:generate counterfeiter . Other\n\n//go:generate counterfeiter . Thing\n",
    );
    let summary = orch.run(&ws.roots()).await.unwrap();
    assert_eq!(summary.skipped(), 2);
    assert_eq!(runner.count(), 2);
}

#[tokio::test]
async fn test_constant_edits_in_sibling_files_rerun_stringer() {
    let ws = Workspace::new();
    ws.write(
        "pill/pill.go",
        "package pill\n\n//go:generate stringer -type=Pill\ntype Pill int\n",
    );
    ws.write(
        "pill/consts.go",
        "package pill\n\nconst (\n\tPlacebo Pill = iota\n\tAspirin\n)\n",
    );
    let runner = RecordingRunner::new();
    let (orch, _cache) = persistent(&ws, runner.clone());
    assert_eq!(orch.run(&ws.roots()).await.unwrap().succeeded(), 1);

    ws.write(
        "pill/consts.go",
        "package pill\n\nconst (\n\tPlacebo Pill = iota\n\tAspirin\n\tIbuprofen\n)\n",
    );
    let second = orch.run(&ws.roots()).await.unwrap();
    assert_eq!(second.succeeded(), 1);
    assert_eq!(second.skipped(), 0);
    assert_eq!(second.results[0].staleness, Some(Staleness::FingerprintChanged));
}

#[tokio::test]
async fn test_generated_output_does_not_invalidate_stringer() {
    let ws = Workspace::new();
    ws.write(
        "pill/pill.go",
        "package pill\n\n//go:generate stringer -type=Pill\ntype Pill int\n\nconst Placebo Pill = 0\n",
    );
    let runner = RecordingRunner::new();
    let (orch, _cache) = persistent(&ws, runner.clone());
    orch.run(&ws.roots()).await.unwrap();

    // What the generator would have written.
    ws.write(
        "pill/pill_string.go",
        "// Code generated by \"stringer -type=Pill\"; DO NOT EDIT.\n\npackage pill\n\nfunc (i Pill) String() string { return \"\" }\n",
    );
    let second = orch.run(&ws.roots()).await.unwrap();
    assert_eq!(second.skipped(), 1);
    assert_eq!(runner.count(), 1);
}

#[tokio::test]
async fn test_generate_mode_runs_each_fake_once() {
    let ws = Workspace::new();
    ws.write(
        "pkg/a.go",
        "package pkg\n\n//go:generate go run github.com/maxbrunsfeld/counterfeiter/v6 -generate\n\n//counterfeiter:generate . Thing\n",
    );
    ws.write("pkg/b.go", THING);
    let runner = RecordingRunner::new();
    let (orch, _cache) = persistent(&ws, runner.clone());

    let summary = orch.run(&ws.roots()).await.unwrap();
    assert_eq!(summary.total(), 1);
    assert_eq!(summary.succeeded(), 1);
    assert_eq!(
        runner.take(),
        vec![(
            "go".to_string(),
            vec![
                "run".to_string(),
                "github.com/maxbrunsfeld/counterfeiter/v6".to_string(),
                "-generate".to_string(),
            ]
        )]
    );
}
