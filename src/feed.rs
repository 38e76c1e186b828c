//! Attempt feed rows.

use crate::model::Attempt;

pub const BODY_LIMIT: usize = 220;
pub const NO_OUTPUT: &str = "No output";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedEntry {
    pub arm: String,
    pub latency: String,
    pub cost: String,
    pub body: String,
}

pub fn feed_entry(attempt: &Attempt) -> FeedEntry {
    // Cost text that does not parse renders as NaN rather than being hidden.
    let cost = attempt.cost_usd.trim().parse::<f64>().unwrap_or(f64::NAN);
    FeedEntry {
        arm: attempt.model_arm_id.chars().take(8).collect(),
        latency: format!("{} ms", attempt.latency_ms),
        cost: format!("${cost:.6}"),
        body: attempt_body(attempt),
    }
}

/// Raw output (truncated), else the error message, else a fixed placeholder.
/// Empty strings fall through to the next source.
pub fn attempt_body(attempt: &Attempt) -> String {
    let raw = attempt
        .raw_output
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(|s| s.chars().take(BODY_LIMIT).collect::<String>());
    raw.or_else(|| attempt.error_message.clone().filter(|s| !s.is_empty()))
        .unwrap_or_else(|| NO_OUTPUT.to_string())
}

pub fn feed_entries(attempts: &[Attempt]) -> Vec<FeedEntry> {
    attempts.iter().map(feed_entry).collect()
}
