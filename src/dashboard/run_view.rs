use super::composer::{coerce_float, coerce_int};
use crate::model::{LaunchRequest, Run, RunBundle, RunPhase, SummaryModel};
use std::time::Duration;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// Run seed and failure threshold inputs, kept as typed text.
#[derive(Debug, Clone, PartialEq)]
pub struct LaunchControls {
    pub seed: String,
    pub failure_threshold: String,
}

impl Default for LaunchControls {
    fn default() -> Self {
        Self {
            seed: "42".into(),
            failure_threshold: "0.5".into(),
        }
    }
}

impl LaunchControls {
    pub fn to_request(&self) -> LaunchRequest {
        LaunchRequest {
            seed: coerce_int(&self.seed),
            failure_threshold: coerce_float(&self.failure_threshold),
        }
    }
}

/// Orchestrator-owned slice of the dashboard: phase of the current launch and the last
/// committed bundle. The bundle is only ever replaced whole.
#[derive(Debug, Default)]
pub struct RunView {
    generation: u64,
    phase: RunPhase,
    committed: Option<RunBundle>,
    pub feed_scroll: usize,
}

impl RunView {
    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn committed(&self) -> Option<&RunBundle> {
        self.committed.as_ref()
    }

    /// Summary rows of the committed bundle, empty when there is none.
    pub fn summary_rows(&self) -> &[SummaryModel] {
        self.committed
            .as_ref()
            .and_then(|b| b.summary.as_ref())
            .map(|s| s.models.as_slice())
            .unwrap_or(&[])
    }

    /// Start a new launch and return its generation.
    pub fn begin(&mut self) -> u64 {
        self.generation += 1;
        self.phase = RunPhase::Launching;
        self.generation
    }

    pub fn is_current(&self, generation: u64) -> bool {
        generation == self.generation
    }

    pub fn advance(&mut self, generation: u64, phase: RunPhase) -> bool {
        if !self.is_current(generation) {
            return false;
        }
        self.phase = phase;
        true
    }

    pub fn commit(&mut self, generation: u64, bundle: RunBundle) -> bool {
        if !self.is_current(generation) {
            return false;
        }
        self.committed = Some(bundle);
        self.phase = RunPhase::Ready;
        self.feed_scroll = 0;
        true
    }

    /// Mark the current launch failed. The committed bundle is left untouched.
    pub fn fail(&mut self, generation: u64) -> bool {
        if !self.is_current(generation) {
            return false;
        }
        self.phase = RunPhase::Error;
        true
    }
}

/// Headline values shown above the comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunStats {
    pub status: String,
    pub short_id: String,
    pub attempts: u64,
    pub top_model: String,
    pub duration: String,
}

pub fn run_stats(bundle: &RunBundle) -> RunStats {
    let summary = bundle.summary.as_ref();
    RunStats {
        status: bundle.run.status.as_str().to_string(),
        short_id: bundle.run.id.chars().take(8).collect(),
        attempts: summary.map(|s| s.total_attempts).unwrap_or(0),
        // Backend ranks rows best-first.
        top_model: summary
            .and_then(|s| s.models.first())
            .map(|m| m.display_name.clone())
            .unwrap_or_else(|| "n/a".into()),
        duration: run_duration(&bundle.run)
            .map(|d| humantime::format_duration(d).to_string())
            .unwrap_or_else(|| "-".into()),
    }
}

/// Wall time between start and completion, when both timestamps parse.
pub fn run_duration(run: &Run) -> Option<Duration> {
    let parse = |s: &Option<String>| {
        s.as_deref()
            .and_then(|v| OffsetDateTime::parse(v, &Rfc3339).ok())
    };
    let started = parse(&run.started_at)?;
    let completed = parse(&run.completed_at)?;
    let elapsed = completed - started;
    if elapsed.is_negative() {
        return None;
    }
    Duration::try_from(elapsed).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{bundle, run};

    #[test]
    fn test_commit_replaces_bundle_and_readies() {
        let mut view = RunView::default();
        let g = view.begin();
        assert_eq!(view.phase(), RunPhase::Launching);
        assert!(view.advance(g, RunPhase::FetchingSummary));
        assert!(view.commit(g, bundle("run-1")));
        assert_eq!(view.phase(), RunPhase::Ready);
        assert_eq!(view.summary_rows().len(), 2);
    }

    #[test]
    fn test_failure_keeps_previous_bundle() {
        let mut view = RunView::default();
        let g1 = view.begin();
        view.commit(g1, bundle("run-1"));

        let g2 = view.begin();
        assert!(view.fail(g2));
        assert_eq!(view.phase(), RunPhase::Error);
        assert_eq!(view.committed().unwrap().run.id, "run-1");
    }

    #[test]
    fn test_stale_generation_is_ignored() {
        let mut view = RunView::default();
        let old = view.begin();
        let current = view.begin();

        assert!(!view.commit(old, bundle("old-run")));
        assert!(!view.advance(old, RunPhase::FetchingAttempts));
        assert!(!view.fail(old));
        assert!(view.committed().is_none());
        assert_eq!(view.phase(), RunPhase::Launching);

        assert!(view.commit(current, bundle("new-run")));
        assert_eq!(view.committed().unwrap().run.id, "new-run");
    }

    #[test]
    fn test_launch_controls_coerce() {
        let controls = LaunchControls::default();
        let req = controls.to_request();
        assert_eq!(req.seed, Some(42));
        assert_eq!(req.failure_threshold, Some(0.5));

        let bad = LaunchControls {
            seed: "x".into(),
            failure_threshold: "".into(),
        };
        let req = bad.to_request();
        assert_eq!(req.seed, None);
        assert_eq!(req.failure_threshold, None);
    }

    #[test]
    fn test_run_stats_from_bundle() {
        let b = bundle("0123456789abcdef");
        let stats = run_stats(&b);
        assert_eq!(stats.status, "succeeded");
        assert_eq!(stats.short_id, "01234567");
        assert_eq!(stats.attempts, 6);
        assert_eq!(stats.top_model, "OpenAI GPT-4o-mini");
        assert_eq!(stats.duration, "1m 3s");
    }

    #[test]
    fn test_run_stats_without_summary() {
        let mut b = bundle("run-1");
        b.summary = None;
        b.run.completed_at = None;
        let stats = run_stats(&b);
        assert_eq!(stats.attempts, 0);
        assert_eq!(stats.top_model, "n/a");
        assert_eq!(stats.duration, "-");
    }

    #[test]
    fn test_duration_ignores_unparseable_timestamps() {
        let mut r = run("r", "succeeded");
        r.started_at = Some("yesterday".into());
        assert_eq!(run_duration(&r), None);
    }
}
