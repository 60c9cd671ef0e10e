use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Alert, AlertStatus, Severity};

pub async fn create(pool: &PgPool, alert: &Alert) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO alerts (id, event_refs, alert_type, severity, user_id, description, status, evidence, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
    )
    .bind(alert.id)
    .bind(&alert.event_refs)
    .bind(&alert.alert_type)
    .bind(alert.severity)
    .bind(&alert.user_id)
    .bind(&alert.description)
    .bind(alert.status)
    .bind(&alert.evidence)
    .bind(alert.created_at)
    .bind(alert.updated_at)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Alert>, sqlx::Error> {
    sqlx::query_as::<_, Alert>("SELECT * FROM alerts WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub struct ListParams<'a> {
    pub limit: i64,
    pub offset: i64,
    pub severity: Option<Severity>,
    pub status: Option<AlertStatus>,
    pub user_id: Option<&'a str>,
}

pub async fn list(pool: &PgPool, params: &ListParams<'_>) -> Result<Vec<Alert>, sqlx::Error> {
    sqlx::query_as::<_, Alert>(
        "SELECT * FROM alerts
         WHERE ($1::alert_severity IS NULL OR severity = $1)
           AND ($2::alert_status IS NULL OR status = $2)
           AND ($3::text IS NULL OR user_id = $3)
         ORDER BY created_at DESC LIMIT $4 OFFSET $5",
    )
    .bind(params.severity)
    .bind(params.status)
    .bind(params.user_id)
    .bind(params.limit)
    .bind(params.offset)
    .fetch_all(pool)
    .await
}

/// Returns the number of rows touched; zero means the alert does not exist.
pub async fn update_status(
    pool: &PgPool,
    id: Uuid,
    status: AlertStatus,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("UPDATE alerts SET status = $2, updated_at = now() WHERE id = $1")
        .bind(id)
        .bind(status)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

pub async fn last_created_at(
    pool: &PgPool,
    alert_type: &str,
    user_id: &str,
) -> Result<Option<DateTime<Utc>>, sqlx::Error> {
    sqlx::query_scalar::<_, Option<DateTime<Utc>>>(
        "SELECT MAX(created_at) FROM alerts WHERE alert_type = $1 AND user_id = $2",
    )
    .bind(alert_type)
    .bind(user_id)
    .fetch_one(pool)
    .await
}
