//! Dry-run status over each built-in plugin

use crate::integration::test_utils::{persistent, relative, RecordingRunner, Workspace};
use genfast::cache::Staleness;
use genfast::error::ResolveError;
use genfast::generation::DirectiveState;
use std::path::Path;

fn mixed_workspace(ws: &Workspace) {
    ws.write(
        "color/color.go",
        "package color\n\n//go:generate stringer -type=Color -output=color_string.go\ntype Color int\n",
    );
    ws.write(
        "api/gen.go",
        "package api\n\n//go:generate protoc --go_out=. api.proto\n",
    );
    ws.write("api/api.proto", "syntax = \"proto3\";\npackage api;\n");
    ws.write(
        "store/store.go",
        "package store\n\n//go:generate go run github.com/maxbrunsfeld/counterfeiter/v6 -generate\n\n//counterfeiter:generate . Store\ntype Store interface {\n\tGet(key string) ([]byte, error)\n}\n",
    );
}

#[tokio::test]
async fn test_status_never_executes() {
    let ws = Workspace::new();
    mixed_workspace(&ws);
    let runner = RecordingRunner::new();
    let (orch, _cache) = persistent(&ws, runner.clone());

    // The `//counterfeiter:generate` line is run by the `-generate` directive.
    let report = orch.status(&ws.roots()).await.unwrap();
    assert_eq!(report.entries.len(), 3);
    assert_eq!(report.stale(), 3);
    assert_eq!(report.failed(), 0);
    assert_eq!(runner.count(), 0);

    let plugins: Vec<(&Path, Option<&str>)> = report
        .entries
        .iter()
        .map(|e| (relative(&ws, &e.directive.path), e.plugin.as_deref()))
        .collect();
    assert_eq!(
        plugins,
        vec![
            (Path::new("api/gen.go"), Some("protoc")),
            (Path::new("color/color.go"), Some("stringer")),
            (Path::new("store/store.go"), Some("counterfeiter")),
        ]
    );
}

#[tokio::test]
async fn test_status_after_run_tracks_edits() {
    let ws = Workspace::new();
    mixed_workspace(&ws);
    let runner = RecordingRunner::new();
    let (orch, _cache) = persistent(&ws, runner.clone());
    orch.run(&ws.roots()).await.unwrap();

    let report = orch.status(&ws.roots()).await.unwrap();
    assert_eq!(report.fresh(), 3);

    ws.write("api/api.proto", "syntax = \"proto3\";\npackage api;\nmessage Ping {}\n");
    let report = orch.status(&ws.roots()).await.unwrap();
    assert_eq!(report.fresh(), 2);
    let stale: Vec<_> = report
        .entries
        .iter()
        .filter(|e| matches!(e.state, DirectiveState::Stale(Staleness::FingerprintChanged)))
        .collect();
    assert_eq!(stale.len(), 1);
    assert_eq!(stale[0].plugin.as_deref(), Some("protoc"));
}

#[tokio::test]
async fn test_status_reports_unresolvable_directives() {
    let ws = Workspace::new();
    ws.write(
        "color/color.go",
        "package color\n\n//go:generate stringer -type=Colour\ntype Color int\n//go:generate go-bindata -o assets.go data/\n",
    );
    let runner = RecordingRunner::new();
    let (orch, _cache) = persistent(&ws, runner.clone());

    let report = orch.status(&ws.roots()).await.unwrap();
    assert_eq!(report.failed(), 2);
    assert!(matches!(
        &report.entries[0].state,
        DirectiveState::ResolutionFailed(ResolveError::DeclarationNotFound { .. })
    ));
    assert!(matches!(
        &report.entries[1].state,
        DirectiveState::ResolutionFailed(ResolveError::NoMatchingPlugin)
    ));
}

#[tokio::test]
async fn test_imported_proto_edit_marks_directive_stale() {
    let ws = Workspace::new();
    ws.write(
        "api/gen.go",
        "package api\n\n//go:generate protoc -I proto --go_out=. proto/api.proto\n",
    );
    ws.write(
        "api/proto/api.proto",
        "syntax = \"proto3\";\nimport \"common/ids.proto\";\n",
    );
    ws.write("api/proto/common/ids.proto", "syntax = \"proto3\";\n");
    let runner = RecordingRunner::new();
    let (orch, _cache) = persistent(&ws, runner.clone());
    orch.run(&ws.roots()).await.unwrap();

    ws.write(
        "api/proto/common/ids.proto",
        "syntax = \"proto3\";\nmessage Id { string value = 1; }\n",
    );
    let report = orch.status(&ws.roots()).await.unwrap();
    assert!(matches!(
        report.entries[0].state,
        DirectiveState::Stale(Staleness::FingerprintChanged)
    ));
}

#[tokio::test]
async fn test_mock_generators_resolve() {
    let ws = Workspace::new();
    ws.write("go.mod", "module example.com/shop\n\ngo 1.22\n");
    ws.write(
        "store/store.go",
        "package store\n\n//go:generate mockgen -source=store.go -destination=mocks/store.go\n//go:generate moq -out store_moq.go . Store\n//go:generate mockgen -destination=mocks/reflect.go example.com/shop/store Store\n\ntype Store interface{ Get() }\n",
    );
    let runner = RecordingRunner::new();
    let (orch, _cache) = persistent(&ws, runner.clone());

    let report = orch.status(&ws.roots()).await.unwrap();
    let plugins: Vec<Option<&str>> = report.entries.iter().map(|e| e.plugin.as_deref()).collect();
    assert_eq!(plugins, vec![Some("mockgen"), Some("moq"), Some("mockgen")]);
    assert_eq!(report.failed(), 0);
}
