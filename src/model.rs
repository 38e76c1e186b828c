use serde::{Deserialize, Serialize};

pub type ConfigMap = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    Openai,
    Anthropic,
    Mock,
}

impl Provider {
    pub fn as_str(self) -> &'static str {
        match self {
            Provider::Openai => "openai",
            Provider::Anthropic => "anthropic",
            Provider::Mock => "mock",
        }
    }

    /// Next provider in selector order, wrapping around.
    pub fn cycle(self) -> Self {
        match self {
            Provider::Openai => Provider::Anthropic,
            Provider::Anthropic => Provider::Mock,
            Provider::Mock => Provider::Openai,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkloadType {
    PrReview,
    CiTriage,
}

impl WorkloadType {
    pub fn as_str(self) -> &'static str {
        match self {
            WorkloadType::PrReview => "pr_review",
            WorkloadType::CiTriage => "ci_triage",
        }
    }

    /// Dataset reference a fresh draft points at for this workload.
    pub fn default_dataset_ref(self) -> &'static str {
        match self {
            WorkloadType::PrReview => "pr_review/v1.jsonl",
            WorkloadType::CiTriage => "ci_triage/v1.jsonl",
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            WorkloadType::PrReview => WorkloadType::CiTriage,
            WorkloadType::CiTriage => WorkloadType::PrReview,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    Running,
    Succeeded,
    Failed,
}

impl RunStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RunStatus::Queued => "queued",
            RunStatus::Running => "running",
            RunStatus::Succeeded => "succeeded",
            RunStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, RunStatus::Succeeded | RunStatus::Failed)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArm {
    /// Assigned by the backend once the experiment is persisted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub provider: Provider,
    pub model_name: String,
    pub display_name: String,
    #[serde(default)]
    pub config: ConfigMap,
}

fn default_max_tasks() -> u32 {
    20
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sampling {
    #[serde(default = "default_max_tasks")]
    pub max_tasks: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Experiment {
    pub id: String,
    pub organization_id: String,
    pub name: String,
    pub workload_type: WorkloadType,
    pub dataset_ref: String,
    #[serde(default)]
    pub dataset_hash: Option<String>,
    pub sampling: Sampling,
    #[serde(with = "decimal_string")]
    pub budget_usd: String,
    pub seed: i64,
    pub model_arms: Vec<ModelArm>,
    pub created_at: String,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    pub id: String,
    pub experiment_id: String,
    pub status: RunStatus,
    pub seed: i64,
    pub failure_threshold: f64,
    pub correlation_id: String,
    #[serde(default)]
    pub error_message: Option<String>,
    pub created_at: String,
    #[serde(default)]
    pub started_at: Option<String>,
    #[serde(default)]
    pub completed_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attempt {
    pub id: String,
    pub run_id: String,
    pub task_instance_id: String,
    pub model_arm_id: String,
    #[serde(default)]
    pub raw_output: Option<String>,
    #[serde(default)]
    pub usage_prompt_tokens: u64,
    #[serde(default)]
    pub usage_completion_tokens: u64,
    #[serde(default)]
    pub usage_total_tokens: u64,
    #[serde(default)]
    pub latency_ms: u64,
    #[serde(with = "decimal_string")]
    pub cost_usd: String,
    #[serde(default)]
    pub error_message: Option<String>,
    pub created_at: String,
}

/// Per-arm aggregate row. The backend delivers these best-first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryModel {
    pub model_arm_id: String,
    pub display_name: String,
    pub provider: String,
    pub model_name: String,
    pub quality_avg: f64,
    pub pass_rate: f64,
    pub attempt_count: u64,
    pub error_count: u64,
    pub latency_p50_ms: f64,
    pub latency_p95_ms: f64,
    pub total_cost_usd: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: String,
    #[serde(default)]
    pub models: Vec<SummaryModel>,
    pub failure_ratio: f64,
    pub failure_threshold: f64,
    pub total_attempts: u64,
    pub total_errors: u64,
}

/// Body of `GET /runs/{id}/summary`; `summary` stays null until aggregation finishes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummaryEnvelope {
    pub run_id: String,
    pub status: RunStatus,
    #[serde(default)]
    pub summary: Option<RunSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplingPayload {
    pub max_tasks: Option<i64>,
}

/// Body of `POST /experiments`. Numeric fields are `None` when the draft input did not parse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentCreate {
    pub name: String,
    pub workload_type: WorkloadType,
    pub dataset_ref: String,
    pub budget_usd: String,
    pub sampling: SamplingPayload,
    pub seed: Option<i64>,
    pub model_arms: Vec<ModelArm>,
}

/// Body of `PATCH /experiments/{id}`; absent fields are left unchanged server-side.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExperimentUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workload_type: Option<WorkloadType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sampling: Option<Sampling>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget_usd: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_arms: Option<Vec<ModelArm>>,
}

/// Body of `POST /experiments/{id}/runs`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LaunchRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<i64>,
    pub failure_threshold: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    pub status: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub commit: Option<String>,
}

/// Everything one launch chain fetched, committed to the view as a single unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunBundle {
    pub run: Run,
    /// Status reported alongside the summary, which can be newer than `run.status`.
    pub summary_status: RunStatus,
    pub summary: Option<RunSummary>,
    pub attempts: Vec<Attempt>,
}

/// Run orchestrator states. Success path runs top to bottom; `Error` is reachable from
/// every in-flight state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RunPhase {
    #[default]
    Idle,
    Launching,
    FetchingRunDetail,
    FetchingSummary,
    FetchingAttempts,
    Ready,
    Error,
}

impl RunPhase {
    /// Only settled states accept a new launch.
    pub fn can_launch(self) -> bool {
        matches!(self, RunPhase::Idle | RunPhase::Ready | RunPhase::Error)
    }

    pub fn label(self) -> &'static str {
        match self {
            RunPhase::Idle => "idle",
            RunPhase::Launching => "launching run",
            RunPhase::FetchingRunDetail => "fetching run detail",
            RunPhase::FetchingSummary => "fetching summary",
            RunPhase::FetchingAttempts => "fetching attempts",
            RunPhase::Ready => "ready",
            RunPhase::Error => "error",
        }
    }
}

/// Result of a composer submission: the new record plus the refreshed catalog.
#[derive(Debug, Clone)]
pub struct CreatedExperiment {
    pub created: Experiment,
    pub experiments: Vec<Experiment>,
}

/// Outcomes reported by the controller to the dashboard state.
///
/// Failures carry the rendered error message; the dashboard only ever displays it.
#[derive(Debug, Clone)]
pub enum AppEvent {
    ExperimentsLoaded(Result<Vec<Experiment>, String>),
    ExperimentLoaded {
        id: String,
        generation: u64,
        result: Result<Experiment, String>,
    },
    ExperimentCreated(Result<CreatedExperiment, String>),
    RunProgress {
        generation: u64,
        phase: RunPhase,
    },
    RunFinished {
        generation: u64,
        // Box to keep AppEvent small; bundles carry the whole attempt list.
        result: Result<Box<RunBundle>, String>,
    },
}

/// Decimal amounts travel as strings, but some serializers emit bare numbers.
mod decimal_string {
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Wire {
        Text(String),
        Number(serde_json::Number),
    }

    pub fn serialize<S: Serializer>(value: &str, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        Ok(match Wire::deserialize(deserializer)? {
            Wire::Text(s) => s,
            Wire::Number(n) => n.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_experiment_accepts_numeric_budget() {
        let json = r#"{
            "id": "exp-1",
            "organization_id": "org-1",
            "name": "Nightly",
            "workload_type": "ci_triage",
            "dataset_ref": "ci_triage/v1.jsonl",
            "dataset_hash": null,
            "sampling": {"max_tasks": 5},
            "budget_usd": 12.5,
            "seed": 7,
            "model_arms": [
                {"id": "arm-1", "provider": "mock", "model_name": "m", "display_name": "Mock", "config": {}}
            ],
            "created_at": "2024-05-01T10:00:00Z"
        }"#;
        let exp: Experiment = serde_json::from_str(json).unwrap();
        assert_eq!(exp.budget_usd, "12.5");
        assert_eq!(exp.workload_type, WorkloadType::CiTriage);
        assert_eq!(exp.model_arms[0].provider, Provider::Mock);
        assert!(exp.updated_at.is_none());
    }

    #[test]
    fn test_attempt_keeps_decimal_cost_text() {
        let json = r#"{
            "id": "a1", "run_id": "r1", "task_instance_id": "t1", "model_arm_id": "arm",
            "raw_output": null, "usage_prompt_tokens": 10, "usage_completion_tokens": 5,
            "usage_total_tokens": 15, "latency_ms": 120, "cost_usd": "0.000150",
            "error_message": "timeout", "created_at": "2024-05-01T10:00:00Z"
        }"#;
        let attempt: Attempt = serde_json::from_str(json).unwrap();
        assert_eq!(attempt.cost_usd, "0.000150");
        assert_eq!(attempt.error_message.as_deref(), Some("timeout"));
    }

    #[test]
    fn test_launch_request_omits_missing_seed() {
        let body = serde_json::to_value(LaunchRequest {
            seed: None,
            failure_threshold: Some(0.5),
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"failure_threshold": 0.5}));
    }

    #[test]
    fn test_create_payload_sends_null_for_unparsed_numbers() {
        let payload = ExperimentCreate {
            name: "x".into(),
            workload_type: WorkloadType::PrReview,
            dataset_ref: "pr_review/v1.jsonl".into(),
            budget_usd: "25.00".into(),
            sampling: SamplingPayload { max_tasks: None },
            seed: None,
            model_arms: vec![],
        };
        let body = serde_json::to_value(&payload).unwrap();
        assert!(body["sampling"]["max_tasks"].is_null());
        assert!(body["seed"].is_null());
        assert_eq!(body["workload_type"], "pr_review");
    }

    #[test]
    fn test_provider_cycle_wraps() {
        assert_eq!(Provider::Mock.cycle(), Provider::Openai);
        assert_eq!(Provider::Openai.cycle().cycle(), Provider::Mock);
    }
}
