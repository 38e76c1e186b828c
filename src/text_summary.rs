//! Text report for `runs launch --text`.
//!
//! Reuses the comparison and attempt feed formatting so the report reads like the dashboard.

use crate::comparison::{self, TABLE_HEADERS};
use crate::dashboard::run_stats;
use crate::feed;
use crate::model::RunBundle;

/// Pre-formatted lines for text output.
pub(crate) struct TextSummary {
    pub lines: Vec<String>,
}

pub(crate) fn build_text_summary(bundle: &RunBundle) -> TextSummary {
    let mut lines = Vec::new();
    let stats = run_stats(bundle);

    lines.push(format!(
        "Run {} ({}): {}",
        stats.short_id, bundle.run.correlation_id, stats.status
    ));
    lines.push(format!(
        "Attempts: {}  Top model: {}  Duration: {}",
        stats.attempts, stats.top_model, stats.duration
    ));
    if let Some(err) = bundle.run.error_message.as_deref() {
        lines.push(format!("Error: {err}"));
    }
    if let Some(summary) = bundle.summary.as_ref() {
        lines.push(format!(
            "Failure ratio: {:.1}% (threshold {:.1}%)",
            summary.failure_ratio * 100.0,
            summary.failure_threshold * 100.0
        ));
    }

    lines.push(String::new());
    let rows = bundle
        .summary
        .as_ref()
        .map(|s| s.models.as_slice())
        .unwrap_or(&[]);
    if rows.is_empty() {
        lines.push(comparison::EMPTY_SUMMARY.to_string());
    } else {
        let table = comparison::table_rows(rows);
        let width = table
            .iter()
            .map(|r| r.model.chars().count())
            .chain(std::iter::once(TABLE_HEADERS[0].len()))
            .max()
            .unwrap_or(0);
        lines.push(format!(
            "{:<width$}  {:>8}  {:>9}  {:>16}  {:>11}  {:>6}",
            TABLE_HEADERS[0],
            TABLE_HEADERS[1],
            TABLE_HEADERS[2],
            TABLE_HEADERS[3],
            TABLE_HEADERS[4],
            TABLE_HEADERS[5],
        ));
        for r in table {
            lines.push(format!(
                "{:<width$}  {:>8}  {:>9}  {:>16}  {:>11}  {:>6}",
                r.model, r.quality, r.pass_rate, r.latency, r.cost, r.errors
            ));
        }
    }

    lines.push(String::new());
    lines.push(format!("Attempts ({})", bundle.attempts.len()));
    for entry in feed::feed_entries(&bundle.attempts) {
        lines.push(format!(
            "  {}  {} · {}  {}",
            entry.arm,
            entry.latency,
            entry.cost,
            entry.body.replace('\n', " ")
        ));
    }

    TextSummary { lines }
}
