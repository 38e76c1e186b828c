//! Dashboard state container.
//!
//! One owner per field: the catalog owns the experiment list and selection, the composer owns
//! the draft, the run view owns the committed run bundle. The shared `error`, `info` and loading
//! fields are last-writer-wins. Every change driven by a network outcome goes through
//! [`DashboardState::apply`].

mod catalog;
mod composer;
mod run_view;

pub use composer::{ComposerDraft, DraftField};
pub use run_view::run_stats;

use catalog::Catalog;
use run_view::{LaunchControls, RunView};

use crate::model::AppEvent;
use crate::orchestrator::UiCommand;

#[derive(Debug, Default)]
pub struct DashboardState {
    pub catalog: Catalog,
    pub composer: ComposerDraft,
    pub launch: LaunchControls,
    pub run: RunView,
    error: Option<String>,
    info: Option<String>,
    // Outstanding select/submit/launch operations.
    outstanding: usize,
}

impl DashboardState {
    pub fn is_loading(&self) -> bool {
        self.outstanding > 0
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn info(&self) -> Option<&str> {
        self.info.as_deref()
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    pub fn set_info(&mut self, msg: impl Into<String>) {
        self.info = Some(msg.into());
    }

    fn acquire(&mut self) {
        self.outstanding += 1;
    }

    fn release(&mut self) {
        self.outstanding = self.outstanding.saturating_sub(1);
    }

    pub fn refresh(&mut self) -> Vec<UiCommand> {
        vec![UiCommand::RefreshExperiments]
    }

    /// Select an experiment and request its detail. The previous detail stays visible
    /// until the new one arrives.
    pub fn select_experiment(&mut self, id: String) -> Vec<UiCommand> {
        let generation = self.catalog.select(id.clone());
        self.acquire();
        vec![UiCommand::LoadExperiment { id, generation }]
    }

    /// Move the selection by `offset` rows.
    pub fn select_relative(&mut self, offset: isize) -> Vec<UiCommand> {
        match self.catalog.neighbor_id(offset) {
            Some(id) => self.select_experiment(id),
            None => Vec::new(),
        }
    }

    pub fn submit_draft(&mut self) -> Vec<UiCommand> {
        if self.is_loading() {
            self.info = Some("Busy; wait for the current action to finish".into());
            return Vec::new();
        }
        self.error = None;
        self.acquire();
        vec![UiCommand::CreateExperiment {
            payload: Box::new(self.composer.to_payload()),
        }]
    }

    /// Launch a run for the selected experiment with the current launch controls.
    /// Refused until that experiment's detail has loaded.
    pub fn launch(&mut self) -> Vec<UiCommand> {
        let Some(experiment_id) = self.catalog.selected_detail().map(|e| e.id.clone()) else {
            self.info = Some(match self.catalog.selected_id() {
                Some(id) => format!("Details for {id} are not loaded; reselect to retry"),
                None => "Select an experiment before launching".into(),
            });
            return Vec::new();
        };
        if self.is_loading() || !self.run.phase().can_launch() {
            self.info = Some("Busy; wait for the current action to finish".into());
            return Vec::new();
        }
        self.error = None;
        self.info = None;
        self.acquire();
        let generation = self.run.begin();
        tracing::info!(%experiment_id, generation, "launch requested");
        vec![UiCommand::LaunchRun {
            experiment_id,
            request: self.launch.to_request(),
            generation,
        }]
    }

    /// Apply one controller outcome. Returns follow-up commands to dispatch.
    pub fn apply(&mut self, event: AppEvent) -> Vec<UiCommand> {
        match event {
            AppEvent::ExperimentsLoaded(Ok(rows)) => {
                tracing::debug!(count = rows.len(), "experiments loaded");
                self.info = None;
                match self.catalog.replace_experiments(rows) {
                    Some(first) => self.select_experiment(first),
                    None => Vec::new(),
                }
            }
            AppEvent::ExperimentsLoaded(Err(e)) => {
                self.info = None;
                self.error = Some(e);
                Vec::new()
            }
            AppEvent::ExperimentLoaded {
                id,
                generation,
                result,
            } => {
                self.release();
                if !self.catalog.is_current(&id, generation) {
                    tracing::warn!(%id, generation, "discarding stale experiment detail");
                    return Vec::new();
                }
                match result {
                    Ok(experiment) => {
                        self.launch.seed = experiment.seed.to_string();
                        self.catalog.commit_detail(&id, generation, experiment);
                    }
                    Err(e) => self.error = Some(e),
                }
                Vec::new()
            }
            AppEvent::ExperimentCreated(Ok(created)) => {
                self.release();
                self.catalog.replace_experiments(created.experiments);
                self.info = Some(format!("Created experiment {}", created.created.name));
                self.select_experiment(created.created.id)
            }
            AppEvent::ExperimentCreated(Err(e)) => {
                self.release();
                self.error = Some(e);
                Vec::new()
            }
            AppEvent::RunProgress { generation, phase } => {
                if !self.run.advance(generation, phase) {
                    tracing::warn!(generation, phase = phase.label(), "discarding stale progress");
                }
                Vec::new()
            }
            AppEvent::RunFinished { generation, result } => {
                self.release();
                if !self.run.is_current(generation) {
                    tracing::warn!(generation, "discarding stale run result");
                    return Vec::new();
                }
                match result {
                    Ok(bundle) => {
                        let bundle = *bundle;
                        if bundle.summary.is_none() && !bundle.summary_status.is_terminal() {
                            self.info = Some(format!(
                                "Summary still pending (run {})",
                                bundle.summary_status.as_str()
                            ));
                        }
                        tracing::info!(run_id = %bundle.run.id, generation, "run committed");
                        self.run.commit(generation, bundle);
                    }
                    Err(e) => {
                        self.run.fail(generation);
                        self.error = Some(e);
                    }
                }
                Vec::new()
            }
        }
    }
}
