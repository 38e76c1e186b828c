//! Launch-and-fetch chain for a single run.
//!
//! Steps run strictly in order and the first failure aborts the rest. Nothing is
//! committed here; the caller receives either the complete bundle or the error.

use crate::api::{ApiClient, TransportError};
use crate::model::{LaunchRequest, RunBundle, RunPhase};

/// Launch a run under `experiment_id`, then fetch its detail, summary and attempts.
///
/// `on_phase` is invoked before each network step.
pub(crate) async fn launch_and_collect<F>(
    client: &ApiClient,
    experiment_id: &str,
    request: &LaunchRequest,
    mut on_phase: F,
) -> Result<RunBundle, TransportError>
where
    F: FnMut(RunPhase),
{
    on_phase(RunPhase::Launching);
    let launched = client.launch_run(experiment_id, request).await?;
    tracing::info!(
        experiment_id,
        run_id = %launched.id,
        status = launched.status.as_str(),
        correlation_id = %launched.correlation_id,
        "run launched"
    );

    on_phase(RunPhase::FetchingRunDetail);
    let run = client.get_run(&launched.id).await?;

    on_phase(RunPhase::FetchingSummary);
    let envelope = client.get_run_summary(&launched.id).await?;
    if envelope.summary.is_none() {
        tracing::info!(run_id = %launched.id, status = envelope.status.as_str(), "summary not available");
    }

    on_phase(RunPhase::FetchingAttempts);
    let attempts = client.list_attempts(&launched.id, None).await?;

    Ok(RunBundle {
        run,
        summary_status: envelope.status,
        summary: envelope.summary,
        attempts,
    })
}
