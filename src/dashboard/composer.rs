use crate::model::{ExperimentCreate, ModelArm, Provider, SamplingPayload, WorkloadType};
use serde_json::json;

/// Editable fields of the draft, in form order. Arm fields carry the arm's list index,
/// which is only an editing handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftField {
    Name,
    Workload,
    Dataset,
    Budget,
    MaxTasks,
    Seed,
    ArmProvider(usize),
    ArmModel(usize),
    ArmDisplay(usize),
}

impl DraftField {
    pub fn label(self) -> String {
        match self {
            DraftField::Name => "Name".into(),
            DraftField::Workload => "Workload".into(),
            DraftField::Dataset => "Dataset".into(),
            DraftField::Budget => "Budget (USD)".into(),
            DraftField::MaxTasks => "Max Tasks".into(),
            DraftField::Seed => "Seed".into(),
            DraftField::ArmProvider(i) => format!("Arm {} Provider", i + 1),
            DraftField::ArmModel(i) => format!("Arm {} Model Name", i + 1),
            DraftField::ArmDisplay(i) => format!("Arm {} Display Name", i + 1),
        }
    }

    /// Selector fields cycle through fixed values instead of taking text.
    pub fn is_selector(self) -> bool {
        matches!(self, DraftField::Workload | DraftField::ArmProvider(_))
    }
}

/// Experiment creation form state. Numeric inputs stay as typed text until submission.
#[derive(Debug, Clone, PartialEq)]
pub struct ComposerDraft {
    pub name: String,
    pub workload_type: WorkloadType,
    pub dataset_ref: String,
    pub budget_usd: String,
    pub max_tasks: String,
    pub seed: String,
    pub model_arms: Vec<ModelArm>,
}

fn starter_arm(
    provider: Provider,
    model_name: &str,
    display_name: &str,
    input_cost_per_1k: f64,
    output_cost_per_1k: f64,
) -> ModelArm {
    let config = json!({
        "temperature": 0,
        "input_cost_per_1k": input_cost_per_1k,
        "output_cost_per_1k": output_cost_per_1k,
    });
    ModelArm {
        id: None,
        provider,
        model_name: model_name.into(),
        display_name: display_name.into(),
        config: config.as_object().cloned().unwrap_or_default(),
    }
}

impl Default for ComposerDraft {
    fn default() -> Self {
        let workload_type = WorkloadType::PrReview;
        Self {
            name: "Phase1 Evaluation".into(),
            workload_type,
            dataset_ref: workload_type.default_dataset_ref().into(),
            budget_usd: "25.00".into(),
            max_tasks: "3".into(),
            seed: "42".into(),
            model_arms: vec![
                starter_arm(
                    Provider::Openai,
                    "gpt-4o-mini",
                    "OpenAI GPT-4o-mini",
                    0.00015,
                    0.0006,
                ),
                starter_arm(
                    Provider::Anthropic,
                    "claude-3-5-haiku-latest",
                    "Anthropic Haiku",
                    0.00025,
                    0.00125,
                ),
            ],
        }
    }
}

impl ComposerDraft {
    pub fn fields(&self) -> Vec<DraftField> {
        let mut fields = vec![
            DraftField::Name,
            DraftField::Workload,
            DraftField::Dataset,
            DraftField::Budget,
            DraftField::MaxTasks,
            DraftField::Seed,
        ];
        for i in 0..self.model_arms.len() {
            fields.extend([
                DraftField::ArmProvider(i),
                DraftField::ArmModel(i),
                DraftField::ArmDisplay(i),
            ]);
        }
        fields
    }

    pub fn value(&self, field: DraftField) -> String {
        match field {
            DraftField::Name => self.name.clone(),
            DraftField::Workload => self.workload_type.as_str().into(),
            DraftField::Dataset => self.dataset_ref.clone(),
            DraftField::Budget => self.budget_usd.clone(),
            DraftField::MaxTasks => self.max_tasks.clone(),
            DraftField::Seed => self.seed.clone(),
            DraftField::ArmProvider(i) => self
                .model_arms
                .get(i)
                .map(|a| a.provider.as_str().to_string())
                .unwrap_or_default(),
            DraftField::ArmModel(i) => self
                .model_arms
                .get(i)
                .map(|a| a.model_name.clone())
                .unwrap_or_default(),
            DraftField::ArmDisplay(i) => self
                .model_arms
                .get(i)
                .map(|a| a.display_name.clone())
                .unwrap_or_default(),
        }
    }

    /// Store typed text into a text field. Selector fields and unknown arm indexes are ignored.
    pub fn set_text(&mut self, field: DraftField, value: String) -> bool {
        match field {
            DraftField::Name => self.name = value,
            DraftField::Dataset => self.dataset_ref = value,
            DraftField::Budget => self.budget_usd = value,
            DraftField::MaxTasks => self.max_tasks = value,
            DraftField::Seed => self.seed = value,
            DraftField::ArmModel(i) => match self.model_arms.get_mut(i) {
                Some(arm) => arm.model_name = value,
                None => return false,
            },
            DraftField::ArmDisplay(i) => match self.model_arms.get_mut(i) {
                Some(arm) => arm.display_name = value,
                None => return false,
            },
            DraftField::Workload | DraftField::ArmProvider(_) => return false,
        }
        true
    }

    /// Advance a selector field to its next value.
    pub fn cycle(&mut self, field: DraftField) -> bool {
        match field {
            DraftField::Workload => {
                self.set_workload(self.workload_type.toggle());
                true
            }
            DraftField::ArmProvider(i) => match self.model_arms.get_mut(i) {
                Some(arm) => {
                    arm.provider = arm.provider.cycle();
                    true
                }
                None => false,
            },
            _ => false,
        }
    }

    /// Changing the workload points the dataset back at that workload's default.
    pub fn set_workload(&mut self, workload: WorkloadType) {
        self.workload_type = workload;
        self.dataset_ref = workload.default_dataset_ref().into();
    }

    pub fn to_payload(&self) -> ExperimentCreate {
        ExperimentCreate {
            name: self.name.clone(),
            workload_type: self.workload_type,
            dataset_ref: self.dataset_ref.clone(),
            budget_usd: self.budget_usd.clone(),
            sampling: SamplingPayload {
                max_tasks: coerce_int(&self.max_tasks),
            },
            seed: coerce_int(&self.seed),
            model_arms: self.model_arms.clone(),
        }
    }
}

/// Numeric text as typed by the user; anything that does not parse goes out as null.
pub fn coerce_int(input: &str) -> Option<i64> {
    input.trim().parse().ok()
}

pub fn coerce_float(input: &str) -> Option<f64> {
    input
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_payload_shape() {
        let payload = serde_json::to_value(ComposerDraft::default().to_payload()).unwrap();
        assert_eq!(payload["name"], "Phase1 Evaluation");
        assert_eq!(payload["workload_type"], "pr_review");
        assert_eq!(payload["dataset_ref"], "pr_review/v1.jsonl");
        assert_eq!(payload["budget_usd"], "25.00");
        assert_eq!(payload["sampling"]["max_tasks"], 3);
        assert_eq!(payload["seed"], 42);
        let arms = payload["model_arms"].as_array().unwrap();
        assert_eq!(arms.len(), 2);
        assert_eq!(arms[0]["provider"], "openai");
        assert_eq!(arms[1]["model_name"], "claude-3-5-haiku-latest");
        assert_eq!(arms[1]["config"]["output_cost_per_1k"], 0.00125);
        assert!(arms[0].get("id").is_none());
    }

    #[test]
    fn test_workload_change_resets_dataset() {
        let mut draft = ComposerDraft::default();
        draft.set_text(DraftField::Dataset, "custom.jsonl".into());
        assert!(draft.cycle(DraftField::Workload));
        assert_eq!(draft.workload_type, WorkloadType::CiTriage);
        assert_eq!(draft.dataset_ref, "ci_triage/v1.jsonl");
        draft.cycle(DraftField::Workload);
        assert_eq!(draft.dataset_ref, "pr_review/v1.jsonl");
    }

    #[test]
    fn test_malformed_numbers_pass_through_as_null() {
        let mut draft = ComposerDraft::default();
        draft.set_text(DraftField::MaxTasks, "three".into());
        draft.set_text(DraftField::Seed, "".into());
        draft.set_text(DraftField::Budget, "abc".into());
        let payload = draft.to_payload();
        assert_eq!(payload.sampling.max_tasks, None);
        assert_eq!(payload.seed, None);
        // Budget is never interpreted client-side.
        assert_eq!(payload.budget_usd, "abc");
    }

    #[test]
    fn test_arm_edits_by_index() {
        let mut draft = ComposerDraft::default();
        assert!(draft.set_text(DraftField::ArmModel(1), "claude-3-5-sonnet-latest".into()));
        assert!(draft.cycle(DraftField::ArmProvider(0)));
        assert!(!draft.set_text(DraftField::ArmDisplay(5), "nope".into()));
        assert_eq!(draft.model_arms[1].model_name, "claude-3-5-sonnet-latest");
        assert_eq!(draft.model_arms[0].provider, Provider::Anthropic);
        // Config survives field edits.
        assert_eq!(draft.model_arms[1].config["input_cost_per_1k"], 0.00025);
    }

    #[test]
    fn test_fields_follow_arm_count() {
        let draft = ComposerDraft::default();
        let fields = draft.fields();
        assert_eq!(fields.len(), 6 + 3 * 2);
        assert_eq!(fields.last(), Some(&DraftField::ArmDisplay(1)));
        assert_eq!(draft.value(DraftField::ArmProvider(1)), "anthropic");
    }

    #[test]
    fn test_coerce_float_rejects_non_finite() {
        assert_eq!(coerce_float(" 0.25 "), Some(0.25));
        assert_eq!(coerce_float("NaN"), None);
        assert_eq!(coerce_float("inf"), None);
        assert_eq!(coerce_int("4.5"), None);
    }
}
