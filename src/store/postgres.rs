use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{AlertFilter, AlertStore, EventFilter, EventStore, RemediationLogStore, StoreError};
use crate::db;
use crate::models::{Alert, AlertStatus, Event, RemediationLog};

/// All three stores over one connection pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl EventStore for PgStore {
    async fn store_event(&self, event: Event) -> Result<Option<Event>, StoreError> {
        Ok(db::events::insert(&self.pool, &event).await?)
    }

    async fn event_exists(&self, provider_id: &str) -> Result<bool, StoreError> {
        Ok(db::events::exists(&self.pool, provider_id).await?)
    }

    async fn last_event_timestamp(&self) -> Result<Option<DateTime<Utc>>, StoreError> {
        Ok(db::events::last_timestamp(&self.pool).await?)
    }

    async fn list_events(&self, filter: &EventFilter) -> Result<Vec<Event>, StoreError> {
        let params = db::events::ListParams {
            limit: filter.limit,
            offset: filter.offset,
            event_type: filter.event_type.as_deref(),
            actor: filter.actor.as_deref(),
        };
        Ok(db::events::list(&self.pool, &params).await?)
    }

    async fn get_event(&self, id: Uuid) -> Result<Event, StoreError> {
        db::events::find_by_id(&self.pool, id)
            .await?
            .ok_or(StoreError::NotFound)
    }

    async fn actor_events(
        &self,
        actor: &str,
        event_type: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Event>, StoreError> {
        Ok(db::events::list_for_actor(&self.pool, actor, event_type, from, to).await?)
    }
}

#[async_trait]
impl AlertStore for PgStore {
    async fn store_alert(&self, alert: &Alert) -> Result<(), StoreError> {
        Ok(db::alerts::create(&self.pool, alert).await?)
    }

    async fn get_alert(&self, id: Uuid) -> Result<Alert, StoreError> {
        db::alerts::find_by_id(&self.pool, id)
            .await?
            .ok_or(StoreError::NotFound)
    }

    async fn list_alerts(&self, filter: &AlertFilter) -> Result<Vec<Alert>, StoreError> {
        let params = db::alerts::ListParams {
            limit: filter.limit,
            offset: filter.offset,
            severity: filter.severity,
            status: filter.status,
            user_id: filter.user_id.as_deref(),
        };
        Ok(db::alerts::list(&self.pool, &params).await?)
    }

    async fn update_alert_status(&self, id: Uuid, status: AlertStatus) -> Result<(), StoreError> {
        match db::alerts::update_status(&self.pool, id, status).await? {
            0 => Err(StoreError::NotFound),
            _ => Ok(()),
        }
    }

    async fn last_alert_at(
        &self,
        alert_type: &str,
        user_id: &str,
    ) -> Result<Option<DateTime<Utc>>, StoreError> {
        Ok(db::alerts::last_created_at(&self.pool, alert_type, user_id).await?)
    }
}

#[async_trait]
impl RemediationLogStore for PgStore {
    async fn log_remediation(&self, entry: &RemediationLog) -> Result<(), StoreError> {
        Ok(db::remediation_log::create(&self.pool, entry).await?)
    }

    async fn list_for_alert(&self, alert_id: Uuid) -> Result<Vec<RemediationLog>, StoreError> {
        Ok(db::remediation_log::list_by_alert(&self.pool, alert_id).await?)
    }
}
