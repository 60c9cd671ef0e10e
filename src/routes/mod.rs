pub mod alerts;
pub mod events;
pub mod ingest;
pub mod rules;

use axum::routing::{get, patch, post};
use axum::Router;

use crate::state::SharedState;

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        // Alerts
        .route("/api/v1/alerts", get(alerts::list))
        .route("/api/v1/alerts/{id}", get(alerts::get))
        .route("/api/v1/alerts/{id}/status", patch(alerts::update_status))
        .route("/api/v1/alerts/{id}/remediate", post(alerts::remediate))
        .route("/api/v1/alerts/{id}/remediations", get(alerts::remediations))
        // Events
        .route("/api/v1/events", get(events::list))
        .route("/api/v1/events/{id}", get(events::get))
        // Pipeline
        .route("/api/v1/ingest/now", post(ingest::ingest_now))
        .route("/api/v1/rules", get(rules::list_rules))
}
