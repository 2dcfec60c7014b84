//! Scheduler: partitions resolved directives into fresh and stale, then runs
//! the stale ones on a bounded worker pool.

use crate::cache::{staleness, CacheEntry, CacheStore, Staleness};
use crate::directive::DirectiveKey;
use crate::error::ExecError;
use crate::generation::cancel::CancellationToken;
use crate::generation::plan::{
    sort_results, ExecutionResult, Outcome, Resolution, ResolvedDirective,
};
use crate::generation::runner::{CommandRunner, GeneratorCommand};
use chrono::Utc;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone)]
pub struct SchedulerOptions {
    /// Maximum number of commands running at once
    pub workers: usize,
    /// Treat every resolved directive as stale
    pub force: bool,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self {
            workers: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
            force: false,
        }
    }
}

/// A stale directive waiting for a worker.
struct Job {
    resolved: ResolvedDirective,
    staleness: Staleness,
}

pub struct Scheduler {
    cache: Arc<dyn CacheStore>,
    runner: Arc<dyn CommandRunner>,
    options: SchedulerOptions,
    cancel: CancellationToken,
}

impl Scheduler {
    pub fn new(
        cache: Arc<dyn CacheStore>,
        runner: Arc<dyn CommandRunner>,
        options: SchedulerOptions,
    ) -> Self {
        Self {
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

    /// Run every stale directive exactly once and report one result per
    /// unique directive, sorted by file and line.
    ///
    /// A failing command never stops its siblings. After cancellation no
    /// new command starts; commands already running are awaited.
    pub async fn execute(&self, resolutions: Vec<Resolution>) -> Vec<ExecutionResult> {
        let mut results = Vec::with_capacity(resolutions.len());
        let mut queue = VecDeque::new();
        let mut seen = HashSet::new();

        for resolution in resolutions {
            if !seen.insert(resolution.directive().key()) {
                debug!(directive = %resolution.directive(), "Duplicate directive dropped before dispatch");
                continue;
            }
            match resolution {
                Resolution::Failed {
                    directive,
                    plugin,
                    error,
                } => {
                    error!(directive = %directive, error = %error, "Cannot resolve directive");
                    results.push(ExecutionResult::from_resolution_failure(
                        directive, plugin, error,
                    ));
                }
                Resolution::Resolved(resolved) => {
                    let entry = self.cache.lookup(&resolved.directive.key());
                    let state =
                        staleness(entry.as_ref(), &resolved.fingerprint, &resolved.io.outputs)
                            .forced_if(self.options.force);
                    if state.is_stale() {
                        debug!(directive = %resolved.directive, reason = state.describe(), "Directive is stale");
                        queue.push_back(Job {
                            resolved,
                            staleness: state,
                        });
                    } else {
                        debug!(directive = %resolved.directive, "Directive is up to date");
                        results.push(ExecutionResult::skipped(resolved));
                    }
                }
            }
        }

        info!(
            stale = queue.len(),
            fresh = results.len(),
            workers = self.options.workers,
            "Dispatching stale directives"
        );

        let semaphore = Arc::new(Semaphore::new(self.options.workers.max(1)));
        let mut tasks = JoinSet::new();
        let mut dispatched: HashMap<DirectiveKey, ResolvedDirective> = HashMap::new();

        while let Some(job) = queue.pop_front() {
            let permit = match Arc::clone(&semaphore).acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    queue.push_front(job);
                    break;
                }
            };
            if self.cancel.is_cancelled() {
                queue.push_front(job);
                break;
            }
            dispatched.insert(job.resolved.directive.key(), job.resolved.clone());
            let runner = Arc::clone(&self.runner);
            let cache = Arc::clone(&self.cache);
            tasks.spawn(async move {
                let _permit = permit;
                run_job(runner.as_ref(), cache.as_ref(), job).await
            });
        }

        if !queue.is_empty() {
            warn!(count = queue.len(), "Run cancelled; remaining directives not started");
            results.extend(
                queue
                    .drain(..)
                    .map(|job| ExecutionResult::cancelled(job.resolved, job.staleness)),
            );
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(result) => {
                    dispatched.remove(&result.directive.key());
                    results.push(result);
                }
                Err(e) => error!(error = %e, "Generator task aborted"),
            }
        }

        // Tasks that died without reporting still get a result.
        for (_, resolved) in dispatched {
            results.push(ExecutionResult {
                plugin: Some(resolved.plugin),
                outcome: Outcome::Failed(ExecError::Aborted(
                    "task ended without a result".to_string(),
                )),
                staleness: None,
                fingerprint: Some(resolved.fingerprint),
                elapsed: None,
                cache_error: None,
                directive: resolved.directive,
            });
        }

        sort_results(&mut results);
        results
    }
}

async fn run_job(runner: &dyn CommandRunner, cache: &dyn CacheStore, job: Job) -> ExecutionResult {
    let Job {
        resolved,
        staleness,
    } = job;
    let started = Instant::now();
    info!(directive = %resolved.directive, reason = staleness.describe(), "Running generator");

    let ran = match GeneratorCommand::for_directive(&resolved.directive) {
        Ok(command) => runner.run(&command).await,
        Err(e) => Err(e),
    };
    let elapsed = started.elapsed();

    let (outcome, cache_error) = match ran {
        Ok(()) => {
            let entry = CacheEntry {
                fingerprint: resolved.fingerprint,
                output_patterns: resolved.io.outputs.clone(),
                plugin: resolved.plugin.clone(),
                last_success: Utc::now(),
            };
            let cache_error = match cache.put(&resolved.directive.key(), entry) {
                Ok(()) => None,
                Err(e) => {
                    warn!(directive = %resolved.directive, error = %e, "Failed to record cache entry");
                    Some(e.to_string())
                }
            };
            debug!(directive = %resolved.directive, elapsed_ms = elapsed.as_millis() as u64, "Generator succeeded");
            (Outcome::Succeeded, cache_error)
        }
        Err(e) => {
            error!(directive = %resolved.directive, error = %e, "Generator failed");
            (Outcome::Failed(e), None)
        }
    };

    ExecutionResult {
        directive: resolved.directive,
        plugin: Some(resolved.plugin),
        outcome,
        staleness: Some(staleness),
        fingerprint: Some(resolved.fingerprint),
        elapsed: Some(elapsed),
        cache_error,
    }
}
