use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use uuid::Uuid;

use super::{AlertFilter, AlertStore, EventFilter, EventStore, RemediationLogStore, StoreError};
use crate::models::{Alert, AlertStatus, Event, RemediationLog};

/// In-process store. Dedup goes through the `by_provider_id` entry lock, so two
/// concurrent inserts of one provider id cannot both succeed.
#[derive(Default)]
pub struct MemoryStore {
    events: DashMap<Uuid, Event>,
    by_provider_id: DashMap<String, Uuid>,
    alerts: DashMap<Uuid, Alert>,
    remediations: DashMap<Uuid, RemediationLog>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every remediation log entry, oldest first.
    pub fn remediation_logs(&self) -> Vec<RemediationLog> {
        let mut logs: Vec<RemediationLog> =
            self.remediations.iter().map(|e| e.value().clone()).collect();
        logs.sort_by_key(|l| l.timestamp);
        logs
    }
}

fn page<T>(items: Vec<T>, limit: i64, offset: i64) -> Vec<T> {
    let offset = offset.max(0) as usize;
    let limit = if limit <= 0 { usize::MAX } else { limit as usize };
    items.into_iter().skip(offset).take(limit).collect()
}

#[async_trait]
impl EventStore for MemoryStore {
    async fn store_event(&self, mut event: Event) -> Result<Option<Event>, StoreError> {
        match self.by_provider_id.entry(event.event_id.clone()) {
            Entry::Occupied(_) => Ok(None),
            Entry::Vacant(slot) => {
                event.created_at = Utc::now();
                self.events.insert(event.id, event.clone());
                slot.insert(event.id);
                Ok(Some(event))
            }
        }
    }

    async fn event_exists(&self, provider_id: &str) -> Result<bool, StoreError> {
        Ok(self.by_provider_id.contains_key(provider_id))
    }

    async fn last_event_timestamp(&self) -> Result<Option<DateTime<Utc>>, StoreError> {
        Ok(self.events.iter().map(|e| e.timestamp).max())
    }

    async fn list_events(&self, filter: &EventFilter) -> Result<Vec<Event>, StoreError> {
        let mut events: Vec<Event> = self
            .events
            .iter()
            .filter(|e| filter.event_type.as_ref().is_none_or(|t| &e.event_type == t))
            .filter(|e| filter.actor.as_ref().is_none_or(|a| &e.actor == a))
            .map(|e| e.value().clone())
            .collect();
        events.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(page(events, filter.limit, filter.offset))
    }

    async fn get_event(&self, id: Uuid) -> Result<Event, StoreError> {
        self.events
            .get(&id)
            .map(|e| e.value().clone())
            .ok_or(StoreError::NotFound)
    }

    async fn actor_events(
        &self,
        actor: &str,
        event_type: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Event>, StoreError> {
        let mut events: Vec<Event> = self
            .events
            .iter()
            .filter(|e| e.actor == actor && e.event_type == event_type)
            .filter(|e| e.timestamp > from && e.timestamp <= to)
            .map(|e| e.value().clone())
            .collect();
        events.sort_by_key(|e| e.timestamp);
        Ok(events)
    }
}

#[async_trait]
impl AlertStore for MemoryStore {
    async fn store_alert(&self, alert: &Alert) -> Result<(), StoreError> {
        self.alerts.insert(alert.id, alert.clone());
        Ok(())
    }

    async fn get_alert(&self, id: Uuid) -> Result<Alert, StoreError> {
        self.alerts
            .get(&id)
            .map(|a| a.value().clone())
            .ok_or(StoreError::NotFound)
    }

    async fn list_alerts(&self, filter: &AlertFilter) -> Result<Vec<Alert>, StoreError> {
        let mut alerts: Vec<Alert> = self
            .alerts
            .iter()
            .filter(|a| filter.severity.is_none_or(|s| a.severity == s))
            .filter(|a| filter.status.is_none_or(|s| a.status == s))
            .filter(|a| filter.user_id.as_ref().is_none_or(|u| &a.user_id == u))
            .map(|a| a.value().clone())
            .collect();
        alerts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(page(alerts, filter.limit, filter.offset))
    }

    async fn update_alert_status(&self, id: Uuid, status: AlertStatus) -> Result<(), StoreError> {
        let mut alert = self.alerts.get_mut(&id).ok_or(StoreError::NotFound)?;
        alert.status = status;
        alert.updated_at = Utc::now();
        Ok(())
    }

    async fn last_alert_at(
        &self,
        alert_type: &str,
        user_id: &str,
    ) -> Result<Option<DateTime<Utc>>, StoreError> {
        Ok(self
            .alerts
            .iter()
            .filter(|a| a.alert_type == alert_type && a.user_id == user_id)
            .map(|a| a.created_at)
            .max())
    }
}

#[async_trait]
impl RemediationLogStore for MemoryStore {
    async fn log_remediation(&self, entry: &RemediationLog) -> Result<(), StoreError> {
        self.remediations.insert(entry.id, entry.clone());
        Ok(())
    }

    async fn list_for_alert(&self, alert_id: Uuid) -> Result<Vec<RemediationLog>, StoreError> {
        let mut logs: Vec<RemediationLog> = self
            .remediations
            .iter()
            .filter(|l| l.alert_id == Some(alert_id))
            .map(|l| l.value().clone())
            .collect();
        logs.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(logs)
    }
}
