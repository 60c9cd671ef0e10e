//! One ingestion cycle: fetch both feeds since the watermark, persist new
//! events, and hand each newly stored event to detection.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::detection::EventProcessor;
use crate::models::Event;
use crate::source::{AuditSource, Feed, RawEvent, SourceError};
use crate::store::EventStore;

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("failed to fetch {} events: {source}", .feed.tag())]
    Fetch {
        feed: Feed,
        #[source]
        source: SourceError,
    },
}

/// What happened to a single fetched record.
#[derive(Debug, Clone, PartialEq)]
pub enum EventOutcome {
    Stored { event_id: Uuid, alerts: usize },
    Duplicate,
    ExistenceCheckFailed(String),
    StoreFailed(String),
    DetectionFailed(String),
}

#[derive(Debug, Clone, Default)]
pub struct IngestReport {
    pub fetched: usize,
    pub outcomes: Vec<(String, EventOutcome)>,
}

impl IngestReport {
    pub fn stored(&self) -> usize {
        self.count(|o| matches!(o, EventOutcome::Stored { .. } | EventOutcome::DetectionFailed(_)))
    }

    pub fn duplicates(&self) -> usize {
        self.count(|o| matches!(o, EventOutcome::Duplicate))
    }

    pub fn failures(&self) -> usize {
        self.count(|o| {
            matches!(
                o,
                EventOutcome::ExistenceCheckFailed(_)
                    | EventOutcome::StoreFailed(_)
                    | EventOutcome::DetectionFailed(_)
            )
        })
    }

    pub fn alerts(&self) -> usize {
        self.outcomes
            .iter()
            .map(|(_, o)| match o {
                EventOutcome::Stored { alerts, .. } => *alerts,
                _ => 0,
            })
            .sum()
    }

    fn count(&self, pred: impl Fn(&EventOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|(_, o)| pred(o)).count()
    }
}

pub struct Ingestor {
    source: Arc<dyn AuditSource>,
    events: Arc<dyn EventStore>,
    processor: Arc<dyn EventProcessor>,
}

impl Ingestor {
    pub fn new(
        source: Arc<dyn AuditSource>,
        events: Arc<dyn EventStore>,
        processor: Arc<dyn EventProcessor>,
    ) -> Self {
        Self {
            source,
            events,
            processor,
        }
    }

    /// Run one cycle. Only a failed feed fetch aborts the cycle; per-event
    /// failures are recorded in the report and skipped.
    pub async fn ingest(&self) -> Result<IngestReport, IngestError> {
        let since = match self.events.last_event_timestamp().await {
            Ok(since) => since,
            Err(e) => {
                tracing::warn!("Could not read ingest watermark, fetching from the beginning: {e}");
                None
            }
        };

        let audit = self
            .source
            .fetch_audit_events(since)
            .await
            .map_err(|source| IngestError::Fetch {
                feed: Feed::Audit,
                source,
            })?;
        let authentication = self
            .source
            .fetch_authentication_events(since)
            .await
            .map_err(|source| IngestError::Fetch {
                feed: Feed::Authentication,
                source,
            })?;

        let mut report = IngestReport {
            fetched: audit.len() + authentication.len(),
            outcomes: Vec::with_capacity(audit.len() + authentication.len()),
        };
        if report.fetched == 0 {
            tracing::debug!("No new events");
            return Ok(report);
        }

        for raw in audit.into_iter().chain(authentication) {
            let provider_id = raw.provider_id.clone();
            let outcome = self.ingest_one(raw).await;
            report.outcomes.push((provider_id, outcome));
        }

        tracing::info!(
            "Ingest cycle: fetched={} stored={} duplicates={} failures={} alerts={}",
            report.fetched,
            report.stored(),
            report.duplicates(),
            report.failures(),
            report.alerts()
        );

        Ok(report)
    }

    async fn ingest_one(&self, raw: RawEvent) -> EventOutcome {
        match self.events.event_exists(&raw.provider_id).await {
            Ok(true) => return EventOutcome::Duplicate,
            Ok(false) => {}
            Err(e) => {
                tracing::warn!("Existence check failed for {}: {e}", raw.provider_id);
                return EventOutcome::ExistenceCheckFailed(e.to_string());
            }
        }

        let provider_id = raw.provider_id.clone();
        let stored = match self.events.store_event(to_event(raw)).await {
            Ok(Some(stored)) => stored,
            // Lost an insert race with a concurrent cycle.
            Ok(None) => return EventOutcome::Duplicate,
            Err(e) => {
                tracing::error!("Failed to store event {provider_id}: {e}");
                return EventOutcome::StoreFailed(e.to_string());
            }
        };

        match self.processor.process_event(&stored).await {
            Ok(report) => EventOutcome::Stored {
                event_id: stored.id,
                alerts: report.alerts_stored(),
            },
            Err(e) => {
                tracing::error!("Detection failed for event {provider_id}: {e}");
                EventOutcome::DetectionFailed(e.to_string())
            }
        }
    }
}

fn to_event(raw: RawEvent) -> Event {
    let now = Utc::now();
    Event {
        id: Uuid::now_v7(),
        event_id: raw.provider_id,
        event_type: raw.event_type,
        actor: raw.actor,
        resource: raw.resource,
        ip: raw.ip,
        region: raw.region,
        timestamp: raw.timestamp,
        raw: serde_json::Value::Object(raw.raw),
        ingest_failed: false,
        created_at: now,
    }
}
