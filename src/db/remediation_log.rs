use sqlx::PgPool;
use uuid::Uuid;

use crate::models::RemediationLog;

pub async fn create(pool: &PgPool, entry: &RemediationLog) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO remediation_logs (id, alert_id, actor_user, action_type, payload, result, timestamp)
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(entry.id)
    .bind(entry.alert_id)
    .bind(&entry.actor_user)
    .bind(entry.action_type)
    .bind(&entry.payload)
    .bind(&entry.result)
    .bind(entry.timestamp)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn list_by_alert(
    pool: &PgPool,
    alert_id: Uuid,
) -> Result<Vec<RemediationLog>, sqlx::Error> {
    sqlx::query_as::<_, RemediationLog>(
        "SELECT * FROM remediation_logs WHERE alert_id = $1 ORDER BY timestamp DESC",
    )
    .bind(alert_id)
    .fetch_all(pool)
    .await
}
