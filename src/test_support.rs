//! JSON fixtures shaped like backend responses.

use crate::model::{Attempt, Experiment, Run, RunBundle, RunStatus, RunSummary, SummaryModel};
use serde_json::{json, Value};

pub fn experiment_json(id: &str, name: &str) -> Value {
    json!({
        "id": id,
        "organization_id": "org-default",
        "name": name,
        "workload_type": "pr_review",
        "dataset_ref": "pr_review/v1.jsonl",
        "dataset_hash": "abc123",
        "sampling": {"max_tasks": 3},
        "budget_usd": "25.00",
        "seed": 42,
        "model_arms": [
            {
                "id": "arm-anthropic-0001",
                "provider": "anthropic",
                "model_name": "claude-3-5-haiku-latest",
                "display_name": "Anthropic Haiku",
                "config": {"temperature": 0}
            },
            {
                "id": "arm-openai-00000001",
                "provider": "openai",
                "model_name": "gpt-4o-mini",
                "display_name": "OpenAI GPT-4o-mini",
                "config": {"temperature": 0}
            }
        ],
        "created_at": "2024-05-01T10:00:00Z",
        "updated_at": null
    })
}

pub fn experiment(id: &str, name: &str) -> Experiment {
    serde_json::from_value(experiment_json(id, name)).unwrap()
}

pub fn run_json(id: &str, experiment_id: &str, status: &str) -> Value {
    json!({
        "id": id,
        "experiment_id": experiment_id,
        "status": status,
        "seed": 42,
        "failure_threshold": 0.5,
        "correlation_id": format!("corr-{id}"),
        "error_message": null,
        "created_at": "2024-05-01T10:00:00Z",
        "started_at": "2024-05-01T10:00:01Z",
        "completed_at": "2024-05-01T10:01:04Z"
    })
}

pub fn run(id: &str, status: &str) -> Run {
    serde_json::from_value(run_json(id, "exp-1", status)).unwrap()
}

pub fn summary_row(arm: &str, name: &str, quality: f64, cost: f64) -> SummaryModel {
    SummaryModel {
        model_arm_id: arm.to_string(),
        display_name: name.to_string(),
        provider: "mock".into(),
        model_name: name.to_lowercase(),
        quality_avg: quality,
        pass_rate: quality,
        attempt_count: 3,
        error_count: 0,
        latency_p50_ms: 120.0,
        latency_p95_ms: 480.0,
        total_cost_usd: cost,
    }
}

pub fn summary_json(run_id: &str) -> Value {
    json!({
        "run_id": run_id,
        "status": "succeeded",
        "summary": {
            "run_id": run_id,
            "models": [
                serde_json::to_value(summary_row("arm-openai-00000001", "OpenAI GPT-4o-mini", 0.9, 0.00042)).unwrap(),
                serde_json::to_value(summary_row("arm-anthropic-0001", "Anthropic Haiku", 0.8, 0.0011)).unwrap()
            ],
            "failure_ratio": 0.0,
            "failure_threshold": 0.5,
            "total_attempts": 6,
            "total_errors": 0
        }
    })
}

pub fn attempt_json(id: &str, run_id: &str, arm: &str) -> Value {
    json!({
        "id": id,
        "run_id": run_id,
        "task_instance_id": format!("task-{id}"),
        "model_arm_id": arm,
        "raw_output": "{\"verdict\": \"approve\"}",
        "usage_prompt_tokens": 120,
        "usage_completion_tokens": 30,
        "usage_total_tokens": 150,
        "latency_ms": 240,
        "cost_usd": "0.000036",
        "error_message": null,
        "created_at": "2024-05-01T10:00:02Z"
    })
}

pub fn attempt(id: &str, raw_output: Option<&str>, error_message: Option<&str>) -> Attempt {
    let mut value = attempt_json(id, "run-1", "arm-openai-00000001");
    value["raw_output"] = json!(raw_output);
    value["error_message"] = json!(error_message);
    serde_json::from_value(value).unwrap()
}

pub fn bundle(run_id: &str) -> RunBundle {
    let summary: RunSummary =
        serde_json::from_value(summary_json(run_id)["summary"].clone()).unwrap();
    RunBundle {
        run: run(run_id, "succeeded"),
        summary_status: RunStatus::Succeeded,
        summary: Some(summary),
        attempts: vec![attempt("a1", Some("ok"), None)],
    }
}
