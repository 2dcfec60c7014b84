//! CLI presentation: text and json formatters for run summaries and status
//! reports.

use crate::error::RunError;
use crate::generation::{DirectiveState, ExecutionResult, Outcome, RunSummary, StatusReport};
use crate::types::short_hex;
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;
use serde::Serialize;
use std::path::Path;

fn display_path(path: &Path, root: &Path) -> String {
    path.strip_prefix(root).unwrap_or(path).display().to_string()
}

fn outcome_cell(outcome: &Outcome) -> String {
    match outcome {
        Outcome::Skipped => outcome.label().dimmed().to_string(),
        Outcome::Succeeded => outcome.label().green().to_string(),
        Outcome::Failed(_) | Outcome::ResolutionFailed(_) => outcome.label().red().to_string(),
        Outcome::Cancelled => outcome.label().yellow().to_string(),
    }
}

fn location(result: &ExecutionResult, root: &Path) -> String {
    format!(
        "{}:{}",
        display_path(&result.directive.path, root),
        result.directive.line
    )
}

/// Summary of a `run`: executed directives, totals, then every failure.
pub fn format_run_summary(summary: &RunSummary, root: &Path) -> String {
    let mut out = String::new();

    let executed: Vec<&ExecutionResult> = summary
        .results
        .iter()
        .filter(|r| !matches!(r.outcome, Outcome::Skipped))
        .collect();
    if !executed.is_empty() {
        let mut table = Table::new();
        table.load_preset(UTF8_BORDERS_ONLY);
        table.set_header(vec!["Directive", "Plugin", "Outcome", "Reason", "Time"]);
        for result in executed {
            table.add_row(vec![
                location(result, root),
                result.plugin.clone().unwrap_or_else(|| "-".to_string()),
                outcome_cell(&result.outcome),
                result
                    .staleness
                    .map(|s| s.describe().to_string())
                    .unwrap_or_else(|| "-".to_string()),
                result
                    .elapsed
                    .map(|d| format!("{:.2}s", d.as_secs_f64()))
                    .unwrap_or_else(|| "-".to_string()),
            ]);
        }
        out.push_str(&table.to_string());
        out.push('\n');
    }

    out.push_str(&format!(
        "{} directives: {} skipped, {} succeeded, {} failed, {} unresolved",
        summary.total(),
        summary.skipped(),
        summary.succeeded(),
        summary.failed(),
        summary.resolution_failed(),
    ));
    if summary.cancelled_count() > 0 {
        out.push_str(&format!(", {} cancelled", summary.cancelled_count()));
    }

    if !summary.scan_warnings.is_empty() {
        out.push_str(&format!(
            "\n\n{} ({}):",
            "Warnings".yellow().bold(),
            summary.scan_warnings.len()
        ));
        for warning in &summary.scan_warnings {
            out.push_str(&format!("\n  - {}", warning));
        }
    }

    let failures: Vec<&ExecutionResult> = summary.failures().collect();
    if !failures.is_empty() {
        out.push_str(&format!(
            "\n\n{} ({}):",
            "Failures".red().bold(),
            failures.len()
        ));
        for result in failures {
            out.push_str(&format!(
                "\n  {}: {}",
                location(result, root),
                result.directive.raw
            ));
            if let Some(message) = result.outcome.error_message() {
                out.push_str(&format!("\n      {}: {}", result.outcome.label(), message));
            }
            if let Some(cache_error) = &result.cache_error {
                out.push_str(&format!("\n      cache not updated: {}", cache_error));
            }
        }
    }

    out
}

fn state_label(state: &DirectiveState) -> String {
    match state {
        DirectiveState::Fresh => "fresh".to_string(),
        DirectiveState::Stale(reason) => format!("stale ({})", reason.describe()),
        DirectiveState::ResolutionFailed(_) => "unresolved".to_string(),
    }
}

/// Text report for `status`.
pub fn format_status_text(report: &StatusReport, root: &Path) -> String {
    if report.entries.is_empty() {
        return "No directives found.".to_string();
    }

    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Directive", "Plugin", "State", "Fingerprint"]);
    for entry in &report.entries {
        let label = state_label(&entry.state);
        let state = match entry.state {
            DirectiveState::Fresh => label.green().to_string(),
            DirectiveState::Stale(_) => label.yellow().to_string(),
            DirectiveState::ResolutionFailed(_) => label.red().to_string(),
        };
        table.add_row(vec![
            format!(
                "{}:{}",
                display_path(&entry.directive.path, root),
                entry.directive.line
            ),
            entry.plugin.clone().unwrap_or_else(|| "-".to_string()),
            state,
            entry
                .fingerprint
                .as_ref()
                .map(short_hex)
                .unwrap_or_else(|| "-".to_string()),
        ]);
    }

    let mut out = table.to_string();
    out.push_str(&format!(
        "\n{} fresh, {} stale, {} unresolved",
        report.fresh(),
        report.stale(),
        report.failed()
    ));

    for entry in &report.entries {
        if let DirectiveState::ResolutionFailed(err) = &entry.state {
            out.push_str(&format!(
                "\n  {}:{}: {}",
                display_path(&entry.directive.path, root),
                entry.directive.line,
                err
            ));
        }
    }
    for warning in &report.scan_warnings {
        out.push_str(&format!("\n  warning: {}", warning));
    }
    out
}

#[derive(Serialize)]
struct StatusRow {
    path: String,
    line: usize,
    directive: String,
    plugin: Option<String>,
    state: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fingerprint: Option<String>,
}

/// JSON report for `status`.
pub fn format_status_json(report: &StatusReport, root: &Path) -> Result<String, RunError> {
    let rows: Vec<StatusRow> = report
        .entries
        .iter()
        .map(|entry| {
            let (state, reason) = match &entry.state {
                DirectiveState::Fresh => ("fresh", None),
                DirectiveState::Stale(reason) => ("stale", Some(reason.describe().to_string())),
                DirectiveState::ResolutionFailed(err) => ("unresolved", Some(err.to_string())),
            };
            StatusRow {
                path: display_path(&entry.directive.path, root),
                line: entry.directive.line,
                directive: entry.directive.raw.clone(),
                plugin: entry.plugin.clone(),
                state,
                reason,
                fingerprint: entry.fingerprint.as_ref().map(hex::encode),
            }
        })
        .collect();
    let warnings: Vec<String> = report.scan_warnings.iter().map(|w| w.to_string()).collect();

    serde_json::to_string_pretty(&serde_json::json!({
        "directives": rows,
        "warnings": warnings,
    }))
    .map_err(|e| RunError::Runtime(format!("Failed to encode status: {}", e)))
}
