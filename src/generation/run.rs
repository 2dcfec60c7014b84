//! Orchestrator: scan → resolve → diff against cache → execute → flush.

use crate::cache::{staleness, CacheStore, Staleness};
use crate::directive::Directive;
use crate::error::{ResolveError, RunError, ScanWarning};
use crate::generation::cancel::CancellationToken;
use crate::generation::executor::{Scheduler, SchedulerOptions};
use crate::generation::plan::{dedupe_directives, drop_covered, Resolution, RunSummary};
use crate::generation::resolve::resolve_all;
use crate::generation::runner::CommandRunner;
use crate::plugin::registry::Registry;
use crate::scan::{ScanOptions, Scanner};
use crate::types::Hash;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct OrchestratorOptions {
    pub scan: ScanOptions,
    /// Directives resolved concurrently
    pub resolve_workers: usize,
    pub scheduler: SchedulerOptions,
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        let scheduler = SchedulerOptions::default();
        Self {
            scan: ScanOptions::default(),
            resolve_workers: scheduler.workers,
            scheduler,
        }
    }
}

/// Dry-run state of one directive.
#[derive(Debug, Clone)]
pub enum DirectiveState {
    Fresh,
    Stale(Staleness),
    ResolutionFailed(ResolveError),
}

#[derive(Debug, Clone)]
pub struct StatusEntry {
    pub directive: Directive,
    pub plugin: Option<String>,
    pub state: DirectiveState,
    pub fingerprint: Option<Hash>,
}

#[derive(Debug, Clone, Default)]
pub struct StatusReport {
    /// Sorted by declaring file, then line
    pub entries: Vec<StatusEntry>,
    pub scan_warnings: Vec<ScanWarning>,
}

impl StatusReport {
    pub fn stale(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e.state, DirectiveState::Stale(_)))
            .count()
    }

    pub fn fresh(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e.state, DirectiveState::Fresh))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e.state, DirectiveState::ResolutionFailed(_)))
            .count()
    }
}

/// Owns the registry, cache and runner for a run.
pub struct Orchestrator {
    registry: Arc<Registry>,
    cache: Arc<dyn CacheStore>,
    runner: Arc<dyn CommandRunner>,
    options: OrchestratorOptions,
    cancel: CancellationToken,
}

impl Orchestrator {
    pub fn new(
        registry: Arc<Registry>,
        cache: Arc<dyn CacheStore>,
        runner: Arc<dyn CommandRunner>,
        options: OrchestratorOptions,
    ) -> Self {
        Self {
            registry,
            cache,
            runner,
            options,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Scan every root on a blocking thread and drop repeated directives.
    async fn discover(
        &self,
        roots: &[PathBuf],
    ) -> Result<(Vec<Directive>, Vec<ScanWarning>), RunError> {
        let scanner = Scanner::new(self.options.scan.clone());
        let roots = roots.to_vec();
        let (directives, warnings) = tokio::task::spawn_blocking(move || {
            let mut directives = Vec::new();
            let mut warnings = Vec::new();
            for root in &roots {
                let mut found = scanner.scan(root);
                directives.extend(found.by_ref());
                warnings.extend(found.into_warnings());
            }
            (directives, warnings)
        })
        .await
        .map_err(|e| RunError::Runtime(format!("scan task failed: {}", e)))?;

        let found = directives.len();
        let directives = dedupe_directives(directives);
        let unique = directives.len();
        let directives = drop_covered(&self.registry, directives);
        info!(
            directives = directives.len(),
            duplicates = found - unique,
            covered = unique - directives.len(),
            warnings = warnings.len(),
            "Scan complete"
        );
        Ok((directives, warnings))
    }

    async fn resolve(&self, directives: Vec<Directive>) -> Vec<Resolution> {
        resolve_all(&self.registry, directives, self.options.resolve_workers).await
    }

    /// Execute every stale directive under `roots` and persist the cache.
    ///
    /// Per-directive failures are collected into the summary. Only a cache
    /// that cannot be written is fatal.
    pub async fn run(&self, roots: &[PathBuf]) -> Result<RunSummary, RunError> {
        let started = Instant::now();
        let (directives, scan_warnings) = self.discover(roots).await?;
        let resolutions = self.resolve(directives).await;

        let scheduler = Scheduler::new(
            Arc::clone(&self.cache),
            Arc::clone(&self.runner),
            self.options.scheduler.clone(),
        )
        .with_cancellation(self.cancel.clone());
        let results = scheduler.execute(resolutions).await;

        self.cache.flush().map_err(RunError::CacheWrite)?;

        let summary = RunSummary {
            results,
            scan_warnings,
            cancelled: self.cancel.is_cancelled(),
        };
        info!(
            total = summary.total(),
            skipped = summary.skipped(),
            succeeded = summary.succeeded(),
            failed = summary.failed(),
            resolution_failed = summary.resolution_failed(),
            cancelled = summary.cancelled_count(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Run complete"
        );
        if summary.cancelled {
            warn!("Run was cancelled");
        }
        Ok(summary)
    }

    /// Report what `run` would execute without executing anything.
    pub async fn status(&self, roots: &[PathBuf]) -> Result<StatusReport, RunError> {
        let (directives, scan_warnings) = self.discover(roots).await?;
        let resolutions = self.resolve(directives).await;

        let mut entries: Vec<StatusEntry> = resolutions
            .into_iter()
            .map(|resolution| match resolution {
                Resolution::Resolved(resolved) => {
                    let entry = self.cache.lookup(&resolved.directive.key());
                    let state = match staleness(
                        entry.as_ref(),
                        &resolved.fingerprint,
                        &resolved.io.outputs,
                    )
                    .forced_if(self.options.scheduler.force)
                    {
                        Staleness::Fresh => DirectiveState::Fresh,
                        stale => DirectiveState::Stale(stale),
                    };
                    StatusEntry {
                        directive: resolved.directive,
                        plugin: Some(resolved.plugin),
                        state,
                        fingerprint: Some(resolved.fingerprint),
                    }
                }
                Resolution::Failed {
                    directive,
                    plugin,
                    error,
                } => StatusEntry {
                    directive,
                    plugin,
                    state: DirectiveState::ResolutionFailed(error),
                    fingerprint: None,
                },
            })
            .collect();
        entries.sort_by(|a, b| {
            (&a.directive.path, a.directive.line).cmp(&(&b.directive.path, b.directive.line))
        });

        Ok(StatusReport {
            entries,
            scan_warnings,
        })
    }
}
