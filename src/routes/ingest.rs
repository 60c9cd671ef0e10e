use axum::extract::State;
use axum::Json;
use serde_json::json;

use crate::error::AppError;
use crate::ingest::EventOutcome;
use crate::state::SharedState;

/// Run one ingest cycle out of band. Safe to overlap with the poll loop.
pub async fn ingest_now(
    State(state): State<SharedState>,
) -> Result<Json<serde_json::Value>, AppError> {
    let report = state.ingestor.ingest().await?;

    let failures: Vec<serde_json::Value> = report
        .outcomes
        .iter()
        .filter_map(|(provider_id, outcome)| {
            let error = match outcome {
                EventOutcome::ExistenceCheckFailed(e)
                | EventOutcome::StoreFailed(e)
                | EventOutcome::DetectionFailed(e) => e,
                EventOutcome::Stored { .. } | EventOutcome::Duplicate => return None,
            };
            Some(json!({ "event_id": provider_id, "error": error }))
        })
        .collect();

    Ok(Json(json!({
        "status": "success",
        "fetched": report.fetched,
        "stored": report.stored(),
        "duplicates": report.duplicates(),
        "alerts": report.alerts(),
        "failures": failures,
    })))
}
