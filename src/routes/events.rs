use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::Event;
use crate::state::SharedState;
use crate::store::EventFilter;

#[derive(Deserialize)]
pub struct ListParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub event_type: Option<String>,
    pub actor: Option<String>,
}

pub async fn list(
    State(state): State<SharedState>,
    Query(params): Query<ListParams>,
) -> Result<Json<serde_json::Value>, AppError> {
    let filter = EventFilter {
        limit: params.limit.unwrap_or(50).clamp(1, 500),
        offset: params.offset.unwrap_or(0).max(0),
        event_type: params.event_type.filter(|t| !t.is_empty()),
        actor: params.actor.filter(|a| !a.is_empty()),
    };

    let events = state.events.list_events(&filter).await?;

    Ok(Json(json!({
        "events": events,
        "count": events.len(),
        "limit": filter.limit,
        "offset": filter.offset,
    })))
}

pub async fn get(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Event>, AppError> {
    let event = state.events.get_event(id).await?;
    Ok(Json(event))
}
