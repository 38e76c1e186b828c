//! Action controller.
//!
//! Receives commands from the dashboard and runs each one as its own task. Tasks are never
//! cancelled; every task reports exactly one terminal event, even when it panics, so the
//! dashboard can always release the loading state it acquired.

use super::run_chain::launch_and_collect;
use crate::api::ApiClient;
use crate::model::{AppEvent, CreatedExperiment, ExperimentCreate, LaunchRequest};
use anyhow::Result;
use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

/// Commands emitted by UI layers.
#[derive(Debug, Clone)]
pub(crate) enum UiCommand {
    RefreshExperiments,
    LoadExperiment {
        id: String,
        generation: u64,
    },
    CreateExperiment {
        payload: Box<ExperimentCreate>,
    },
    LaunchRun {
        experiment_id: String,
        request: LaunchRequest,
        generation: u64,
    },
    Quit,
}

/// Dispatch UI commands until `Quit` arrives or the UI side hangs up.
pub(crate) async fn run_controller(
    client: ApiClient,
    event_tx: UnboundedSender<AppEvent>,
    mut cmd_rx: UnboundedReceiver<UiCommand>,
) -> Result<()> {
    while let Some(cmd) = cmd_rx.recv().await {
        if matches!(cmd, UiCommand::Quit) {
            break;
        }
        dispatch(&client, &event_tx, cmd);
    }
    tracing::debug!("controller stopped");
    Ok(())
}

fn dispatch(client: &ApiClient, event_tx: &UnboundedSender<AppEvent>, cmd: UiCommand) {
    let client = client.clone();
    match cmd {
        UiCommand::RefreshExperiments => {
            let work = async move {
                AppEvent::ExperimentsLoaded(
                    client.list_experiments().await.map_err(|e| e.to_string()),
                )
            };
            spawn_guarded(
                event_tx.clone(),
                work,
                AppEvent::ExperimentsLoaded(Err(panicked("refresh"))),
            );
        }
        UiCommand::LoadExperiment { id, generation } => {
            let on_panic = AppEvent::ExperimentLoaded {
                id: id.clone(),
                generation,
                result: Err(panicked("experiment load")),
            };
            let work = async move {
                let result = client.get_experiment(&id).await.map_err(|e| e.to_string());
                AppEvent::ExperimentLoaded {
                    id,
                    generation,
                    result,
                }
            };
            spawn_guarded(event_tx.clone(), work, on_panic);
        }
        UiCommand::CreateExperiment { payload } => {
            let work = async move {
                let result = async {
                    let created = client.create_experiment(&payload).await?;
                    tracing::info!(experiment_id = %created.id, "experiment created");
                    let experiments = client.list_experiments().await?;
                    Ok::<_, crate::api::TransportError>(CreatedExperiment {
                        created,
                        experiments,
                    })
                }
                .await;
                AppEvent::ExperimentCreated(result.map_err(|e| e.to_string()))
            };
            spawn_guarded(
                event_tx.clone(),
                work,
                AppEvent::ExperimentCreated(Err(panicked("experiment create"))),
            );
        }
        UiCommand::LaunchRun {
            experiment_id,
            request,
            generation,
        } => {
            let progress_tx = event_tx.clone();
            let work = async move {
                let result = launch_and_collect(&client, &experiment_id, &request, |phase| {
                    let _ = progress_tx.send(AppEvent::RunProgress { generation, phase });
                })
                .await;
                if let Err(e) = &result {
                    tracing::warn!(generation, error = %e, "launch chain aborted");
                }
                AppEvent::RunFinished {
                    generation,
                    result: result.map(Box::new).map_err(|e| e.to_string()),
                }
            };
            spawn_guarded(
                event_tx.clone(),
                work,
                AppEvent::RunFinished {
                    generation,
                    result: Err(panicked("launch")),
                },
            );
        }
        UiCommand::Quit => {}
    }
}

fn panicked(action: &str) -> String {
    format!("{action} task panicked")
}

/// Spawn `work` and forward its event; a panic forwards `on_panic` instead.
fn spawn_guarded<F>(event_tx: UnboundedSender<AppEvent>, work: F, on_panic: AppEvent)
where
    F: Future<Output = AppEvent> + Send + 'static,
{
    tokio::spawn(async move {
        let ev = match AssertUnwindSafe(work).catch_unwind().await {
            Ok(ev) => ev,
            Err(_) => {
                tracing::error!("action task panicked");
                on_panic
            }
        };
        let _ = event_tx.send(ev);
    });
}
