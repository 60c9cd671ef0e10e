use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{ActionType, Alert, AlertStatus, RemediationLog, Severity};
use crate::state::SharedState;
use crate::store::AlertFilter;

const DEFAULT_LIMIT: i64 = 50;
const MAX_LIMIT: i64 = 500;

#[derive(Deserialize)]
pub struct ListParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub severity: Option<String>,
    pub status: Option<String>,
    pub user_id: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateStatus {
    pub status: String,
}

#[derive(Deserialize)]
pub struct RemediateRequest {
    pub action: String,
    #[serde(default)]
    pub reason: String,
}

pub async fn list(
    State(state): State<SharedState>,
    Query(params): Query<ListParams>,
) -> Result<Json<serde_json::Value>, AppError> {
    let severity = params
        .severity
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(str::parse::<Severity>)
        .transpose()
        .map_err(AppError::BadRequest)?;
    let status = params
        .status
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(str::parse::<AlertStatus>)
        .transpose()
        .map_err(AppError::BadRequest)?;

    let filter = AlertFilter {
        limit: params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT),
        offset: params.offset.unwrap_or(0).max(0),
        severity,
        status,
        user_id: params.user_id.filter(|u| !u.is_empty()),
    };

    let alerts = state.alerts.list_alerts(&filter).await?;

    Ok(Json(json!({
        "alerts": alerts,
        "count": alerts.len(),
        "limit": filter.limit,
        "offset": filter.offset,
    })))
}

pub async fn get(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Alert>, AppError> {
    let alert = state.alerts.get_alert(id).await?;
    Ok(Json(alert))
}

pub async fn update_status(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateStatus>,
) -> Result<Json<Alert>, AppError> {
    let next: AlertStatus = req.status.parse().map_err(AppError::BadRequest)?;

    let current = state.alerts.get_alert(id).await?;
    if !current.status.can_transition_to(next) {
        // Operators may reopen or relabel closed alerts.
        tracing::warn!(
            "Alert {id} moved {} -> {next} outside the normal lifecycle",
            current.status
        );
    }

    state.alerts.update_alert_status(id, next).await?;
    let alert = state.alerts.get_alert(id).await?;
    Ok(Json(alert))
}

pub async fn remediate(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<RemediateRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let action: ActionType = req.action.parse().map_err(AppError::BadRequest)?;

    state
        .remediation
        .remediate_alert(id, action, "api", &req.reason)
        .await?;

    Ok(Json(json!({ "status": "success", "alert_id": id, "action": action })))
}

pub async fn remediations(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<RemediationLog>>, AppError> {
    state.alerts.get_alert(id).await?;
    let logs = state.remediation_logs.list_for_alert(id).await?;
    Ok(Json(logs))
}
