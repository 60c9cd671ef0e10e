//! Storage contracts consumed by the pipeline.
//!
//! Each component receives only the trait it needs. `postgres` is the
//! production backend; `memory` backs tests and local runs.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{Alert, AlertStatus, Event, RemediationLog, Severity};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    pub limit: i64,
    pub offset: i64,
    pub event_type: Option<String>,
    pub actor: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct AlertFilter {
    pub limit: i64,
    pub offset: i64,
    pub severity: Option<Severity>,
    pub status: Option<AlertStatus>,
    pub user_id: Option<String>,
}

#[async_trait]
pub trait EventStore: Send + Sync {
    /// Insert-if-absent keyed by `event.event_id`. Returns the stored event, or
    /// `None` if that provider id was already present. Must be atomic per id.
    async fn store_event(&self, event: Event) -> Result<Option<Event>, StoreError>;

    async fn event_exists(&self, provider_id: &str) -> Result<bool, StoreError>;

    /// Most recent provider timestamp in the store (the ingest watermark).
    async fn last_event_timestamp(&self) -> Result<Option<DateTime<Utc>>, StoreError>;

    /// Newest first.
    async fn list_events(&self, filter: &EventFilter) -> Result<Vec<Event>, StoreError>;

    async fn get_event(&self, id: Uuid) -> Result<Event, StoreError>;

    /// Events of `event_type` for `actor` with `from < timestamp <= to`, oldest first.
    async fn actor_events(
        &self,
        actor: &str,
        event_type: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Event>, StoreError>;
}

#[async_trait]
pub trait AlertStore: Send + Sync {
    async fn store_alert(&self, alert: &Alert) -> Result<(), StoreError>;

    async fn get_alert(&self, id: Uuid) -> Result<Alert, StoreError>;

    /// Newest first.
    async fn list_alerts(&self, filter: &AlertFilter) -> Result<Vec<Alert>, StoreError>;

    /// Unconditional status set; lifecycle rules are not enforced here.
    async fn update_alert_status(&self, id: Uuid, status: AlertStatus) -> Result<(), StoreError>;

    async fn last_alert_at(
        &self,
        alert_type: &str,
        user_id: &str,
    ) -> Result<Option<DateTime<Utc>>, StoreError>;
}

#[async_trait]
pub trait RemediationLogStore: Send + Sync {
    async fn log_remediation(&self, entry: &RemediationLog) -> Result<(), StoreError>;

    async fn list_for_alert(&self, alert_id: Uuid) -> Result<Vec<RemediationLog>, StoreError>;
}
