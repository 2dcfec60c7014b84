use crate::cache::Staleness;
use crate::directive::Directive;
use crate::error::{ExecError, ResolveError, ScanWarning};
use crate::plugin::registry::Registry;
use crate::plugin::InputOutputFiles;
use crate::types::Hash;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// A directive whose inputs, outputs and fingerprint are known.
#[derive(Debug, Clone)]
pub struct ResolvedDirective {
    pub directive: Directive,
    pub plugin: String,
    pub io: InputOutputFiles,
    pub fingerprint: Hash,
}

/// Result of resolving one directive.
#[derive(Debug, Clone)]
pub enum Resolution {
    Resolved(ResolvedDirective),
    Failed {
        directive: Directive,
        plugin: Option<String>,
        error: ResolveError,
    },
}

impl Resolution {
    pub fn directive(&self) -> &Directive {
        match self {
            Resolution::Resolved(resolved) => &resolved.directive,
            Resolution::Failed { directive, .. } => directive,
        }
    }
}

/// Terminal state of a directive in one run.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// Fingerprint and outputs unchanged
    Skipped,
    /// Command ran and exited successfully
    Succeeded,
    Failed(ExecError),
    ResolutionFailed(ResolveError),
    /// Never dispatched because the run was cancelled
    Cancelled,
}

impl Outcome {
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Skipped => "skipped",
            Outcome::Succeeded => "succeeded",
            Outcome::Failed(_) => "failed",
            Outcome::ResolutionFailed(_) => "resolution failed",
            Outcome::Cancelled => "cancelled",
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Outcome::Failed(_) | Outcome::ResolutionFailed(_) | Outcome::Cancelled
        )
    }

    /// Diagnostic for failed outcomes.
    pub fn error_message(&self) -> Option<String> {
        match self {
            Outcome::Failed(err) => Some(err.to_string()),
            Outcome::ResolutionFailed(err) => Some(err.to_string()),
            Outcome::Cancelled => Some("run cancelled before dispatch".to_string()),
            Outcome::Skipped | Outcome::Succeeded => None,
        }
    }
}

/// Per-directive outcome of a run.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub directive: Directive,
    pub plugin: Option<String>,
    pub outcome: Outcome,
    /// Why the directive was executed, if it was considered at all
    pub staleness: Option<Staleness>,
    pub fingerprint: Option<Hash>,
    pub elapsed: Option<Duration>,
    /// Set when the command succeeded but its cache entry could not be written
    pub cache_error: Option<String>,
}

impl ExecutionResult {
    pub fn skipped(resolved: ResolvedDirective) -> Self {
        Self {
            directive: resolved.directive,
            plugin: Some(resolved.plugin),
            outcome: Outcome::Skipped,
            staleness: Some(Staleness::Fresh),
            fingerprint: Some(resolved.fingerprint),
            elapsed: None,
            cache_error: None,
        }
    }

    pub fn from_resolution_failure(
        directive: Directive,
        plugin: Option<String>,
        error: ResolveError,
    ) -> Self {
        Self {
            directive,
            plugin,
            outcome: Outcome::ResolutionFailed(error),
            staleness: None,
            fingerprint: None,
            elapsed: None,
            cache_error: None,
        }
    }

    pub fn cancelled(resolved: ResolvedDirective, staleness: Staleness) -> Self {
        Self {
            directive: resolved.directive,
            plugin: Some(resolved.plugin),
            outcome: Outcome::Cancelled,
            staleness: Some(staleness),
            fingerprint: Some(resolved.fingerprint),
            elapsed: None,
            cache_error: None,
        }
    }
}

/// Aggregated outcome of one orchestration run.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Sorted by declaring file, then line
    pub results: Vec<ExecutionResult>,
    pub scan_warnings: Vec<ScanWarning>,
    pub cancelled: bool,
}

impl RunSummary {
    fn count(&self, pred: impl Fn(&Outcome) -> bool) -> usize {
        self.results.iter().filter(|r| pred(&r.outcome)).count()
    }

    pub fn total(&self) -> usize {
        self.results.len()
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Skipped))
    }

    pub fn succeeded(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Succeeded))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Failed(_)))
    }

    pub fn resolution_failed(&self) -> usize {
        self.count(|o| matches!(o, Outcome::ResolutionFailed(_)))
    }

    pub fn cancelled_count(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Cancelled))
    }

    pub fn cache_errors(&self) -> usize {
        self.results.iter().filter(|r| r.cache_error.is_some()).count()
    }

    /// Directives that ran their command.
    pub fn executed(&self) -> usize {
        self.succeeded() + self.failed()
    }

    pub fn failures(&self) -> impl Iterator<Item = &ExecutionResult> {
        self.results
            .iter()
            .filter(|r| r.outcome.is_failure() || r.cache_error.is_some())
    }

    pub fn is_success(&self) -> bool {
        !self.cancelled && self.failures().next().is_none()
    }
}

/// Drop repeated directives, keeping the first occurrence of each key.
pub fn dedupe_directives<I>(directives: I) -> Vec<Directive>
where
    I: IntoIterator<Item = Directive>,
{
    let mut seen = HashSet::new();
    directives
        .into_iter()
        .filter(|directive| {
            let fresh = seen.insert(directive.key());
            if !fresh {
                debug!(directive = %directive, "Ignoring duplicate directive");
            }
            fresh
        })
        .collect()
}

/// Drop directives whose work another directive of the same file already
/// does, as reported by the owning plugin's [`covers`].
///
/// [`covers`]: crate::plugin::Plugin::covers
pub fn drop_covered(registry: &Registry, directives: Vec<Directive>) -> Vec<Directive> {
    let mut by_file: BTreeMap<&Path, Vec<&Directive>> = BTreeMap::new();
    for directive in &directives {
        by_file.entry(directive.path.as_path()).or_default().push(directive);
    }

    let mut covered = HashSet::new();
    for siblings in by_file.values().filter(|s| s.len() > 1) {
        for directive in siblings {
            let Some(plugin) = registry.owner(directive) else {
                continue;
            };
            for other in siblings {
                if other.key() != directive.key() && plugin.covers(directive, other) {
                    info!(
                        directive = %other,
                        covered_by = %directive.raw,
                        "Skipping directive already run by another directive"
                    );
                    covered.insert(other.key());
                }
            }
        }
    }

    if covered.is_empty() {
        return directives;
    }
    directives
        .into_iter()
        .filter(|directive| !covered.contains(&directive.key()))
        .collect()
}

/// Order results by declaring file, then line.
pub fn sort_results(results: &mut [ExecutionResult]) {
    results.sort_by(|a, b| {
        (&a.directive.path, a.directive.line).cmp(&(&b.directive.path, b.directive.line))
    });
}
