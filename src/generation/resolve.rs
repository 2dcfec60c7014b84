//! Directive resolution: plugin lookup, input/output inference and
//! fingerprinting, parallel across directives.

use crate::directive::Directive;
use crate::error::ResolveError;
use crate::fingerprint::compute_fingerprint;
use crate::generation::plan::{Resolution, ResolvedDirective};
use crate::plugin::registry::Registry;
use futures::stream::{self, StreamExt};
use tracing::debug;

/// Resolve one directive. Failures are scoped to the directive.
pub async fn resolve_directive(registry: &Registry, directive: Directive) -> Resolution {
    let Some(plugin) = registry.lookup(&directive) else {
        return Resolution::Failed {
            directive,
            plugin: None,
            error: ResolveError::NoMatchingPlugin,
        };
    };
    let name = plugin.name();

    let io = match plugin.resolve(&directive).await {
        Ok(io) => io,
        Err(error) => {
            debug!(directive = %directive, plugin = name, error = %error, "Resolution failed");
            return Resolution::Failed {
                directive,
                plugin: Some(name.to_string()),
                error,
            };
        }
    };

    let hashed = {
        let directive = directive.clone();
        let io = io.clone();
        tokio::task::spawn_blocking(move || compute_fingerprint(name, &directive, &io)).await
    };
    let fingerprint = match hashed {
        Ok(Ok(fingerprint)) => fingerprint,
        Ok(Err((path, err))) => {
            return Resolution::Failed {
                directive,
                plugin: Some(name.to_string()),
                error: ResolveError::Unreadable {
                    path,
                    reason: err.to_string(),
                },
            };
        }
        Err(join_err) => {
            return Resolution::Failed {
                directive,
                plugin: Some(name.to_string()),
                error: ResolveError::SearchAborted(join_err.to_string()),
            };
        }
    };

    debug!(
        directive = %directive,
        plugin = name,
        inputs = io.inputs.len(),
        outputs = io.outputs.len(),
        fingerprint = %crate::types::short_hex(&fingerprint),
        "Directive resolved"
    );
    Resolution::Resolved(ResolvedDirective {
        directive,
        plugin: name.to_string(),
        io,
        fingerprint,
    })
}

/// Resolve every directive with at most `parallelism` resolutions in flight.
///
/// Completion order is arbitrary; callers sort the results they report.
pub async fn resolve_all(
    registry: &Registry,
    directives: Vec<Directive>,
    parallelism: usize,
) -> Vec<Resolution> {
    stream::iter(directives)
        .map(|directive| resolve_directive(registry, directive))
        .buffer_unordered(parallelism.max(1))
        .collect()
        .await
}
