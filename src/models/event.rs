use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A normalized audit or authentication record.
///
/// `event_id` is the provider's id and the natural key for dedup; `id` is ours.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub event_id: String,
    pub event_type: String,
    pub actor: String,
    pub resource: String,
    pub ip: String,
    pub region: String,
    pub timestamp: DateTime<Utc>,
    pub raw: serde_json::Value,
    pub ingest_failed: bool,
    pub created_at: DateTime<Utc>,
}

impl Event {
    /// String field from the raw provider payload, if present.
    pub fn raw_str(&self, key: &str) -> Option<&str> {
        self.raw.get(key).and_then(|v| v.as_str())
    }
}
