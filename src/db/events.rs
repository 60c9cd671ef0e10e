use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Event;

/// Insert unless the provider event id is already stored. Returns the stored
/// row, or `None` when another row already holds that `event_id`.
pub async fn insert(pool: &PgPool, event: &Event) -> Result<Option<Event>, sqlx::Error> {
    sqlx::query_as::<_, Event>(
        "INSERT INTO events (id, event_id, event_type, actor, resource, ip, region, timestamp, raw, ingest_failed)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
         ON CONFLICT (event_id) DO NOTHING
         RETURNING *",
    )
    .bind(event.id)
    .bind(&event.event_id)
    .bind(&event.event_type)
    .bind(&event.actor)
    .bind(&event.resource)
    .bind(&event.ip)
    .bind(&event.region)
    .bind(event.timestamp)
    .bind(&event.raw)
    .bind(event.ingest_failed)
    .fetch_optional(pool)
    .await
}

pub async fn exists(pool: &PgPool, event_id: &str) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM events WHERE event_id = $1)")
        .bind(event_id)
        .fetch_one(pool)
        .await
}

pub async fn last_timestamp(pool: &PgPool) -> Result<Option<DateTime<Utc>>, sqlx::Error> {
    sqlx::query_scalar::<_, Option<DateTime<Utc>>>("SELECT MAX(timestamp) FROM events")
        .fetch_one(pool)
        .await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Event>, sqlx::Error> {
    sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub struct ListParams<'a> {
    pub limit: i64,
    pub offset: i64,
    pub event_type: Option<&'a str>,
    pub actor: Option<&'a str>,
}

pub async fn list(pool: &PgPool, params: &ListParams<'_>) -> Result<Vec<Event>, sqlx::Error> {
    sqlx::query_as::<_, Event>(
        "SELECT * FROM events
         WHERE ($1::text IS NULL OR event_type = $1)
           AND ($2::text IS NULL OR actor = $2)
         ORDER BY timestamp DESC LIMIT $3 OFFSET $4",
    )
    .bind(params.event_type)
    .bind(params.actor)
    .bind(params.limit)
    .bind(params.offset)
    .fetch_all(pool)
    .await
}

/// Events of one type for one actor with `from < timestamp <= to`, oldest first.
pub async fn list_for_actor(
    pool: &PgPool,
    actor: &str,
    event_type: &str,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Result<Vec<Event>, sqlx::Error> {
    sqlx::query_as::<_, Event>(
        "SELECT * FROM events
         WHERE actor = $1 AND event_type = $2
           AND timestamp > $3 AND timestamp <= $4
         ORDER BY timestamp ASC",
    )
    .bind(actor)
    .bind(event_type)
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await
}
