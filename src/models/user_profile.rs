use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Per-identity risk state. Reserved for stateful rules; nothing writes it yet.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub provider_user_id: String,
    pub last_seen_ip: String,
    pub last_seen_region: String,
    pub risk_score: i32,
    pub locked: bool,
    pub updated_at: DateTime<Utc>,
}
