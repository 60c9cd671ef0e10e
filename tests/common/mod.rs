#![allow(dead_code)]

use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde_json::{Map, Value, json};
use uuid::Uuid;

use auditwarden::config::{Config, DetectionConfig, IngestionConfig, ProviderConfig};
use auditwarden::detection::{DetectionError, DetectionReport, EventProcessor};
use auditwarden::models::{Alert, AlertStatus, Event, RemediationLog};
use auditwarden::source::{AuditSource, ControlPlane, Feed, ProviderClient, RawEvent, SourceError};
use auditwarden::state::SharedState;
use auditwarden::store::{
    AlertFilter, AlertStore, EventFilter, EventStore, MemoryStore, RemediationLogStore, StoreError,
};
use auditwarden::Backends;

pub fn test_config() -> Config {
    Config {
        database_url: "postgres://unused".to_string(),
        host: "127.0.0.1".parse().unwrap(),
        port: 0,
        api_token: None,
        log_level: "warn".to_string(),
        provider: ProviderConfig::default(),
        ingestion: IngestionConfig::default(),
        detection: DetectionConfig::default(),
    }
}

pub fn raw_event(provider_id: &str, event_type: &str, actor: &str, at: DateTime<Utc>) -> RawEvent {
    RawEvent {
        provider_id: provider_id.to_string(),
        event_type: event_type.to_string(),
        actor: actor.to_string(),
        resource: "iam".to_string(),
        ip: "203.0.113.1".to_string(),
        region: "fr-par".to_string(),
        timestamp: at,
        source: Feed::Audit,
        raw: Map::new(),
    }
}

/// Provider double. Serves its feeds verbatim (ignoring `since`) and records
/// every control-plane call.
#[derive(Default)]
pub struct FakeProvider {
    pub audit: Mutex<Vec<RawEvent>>,
    pub authentication: Mutex<Vec<RawEvent>>,
    pub fail_audit: AtomicBool,
    pub fail_authentication: AtomicBool,
    pub fail_control: AtomicBool,
    pub seen_since: Mutex<Vec<Option<DateTime<Utc>>>>,
    pub control_calls: Mutex<Vec<(String, String)>>,
}

impl FakeProvider {
    pub fn with_audit(events: Vec<RawEvent>) -> Self {
        let provider = Self::default();
        *provider.audit.lock().unwrap() = events;
        provider
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.control_calls.lock().unwrap().clone()
    }

    fn upstream_error(context: &str) -> SourceError {
        SourceError::Status {
            context: context.to_string(),
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: "upstream down".to_string(),
        }
    }

    fn control(&self, op: &str, subject: &str) -> Result<(), SourceError> {
        if self.fail_control.load(Ordering::SeqCst) {
            return Err(SourceError::Authentication(StatusCode::FORBIDDEN));
        }
        self.control_calls
            .lock()
            .unwrap()
            .push((op.to_string(), subject.to_string()));
        Ok(())
    }
}

#[async_trait]
impl AuditSource for FakeProvider {
    async fn fetch_audit_events(
        &self,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<RawEvent>, SourceError> {
        self.seen_since.lock().unwrap().push(since);
        if self.fail_audit.load(Ordering::SeqCst) {
            return Err(Self::upstream_error("audit"));
        }
        Ok(self.audit.lock().unwrap().clone())
    }

    async fn fetch_authentication_events(
        &self,
        _since: Option<DateTime<Utc>>,
    ) -> Result<Vec<RawEvent>, SourceError> {
        if self.fail_authentication.load(Ordering::SeqCst) {
            return Err(Self::upstream_error("authentication"));
        }
        Ok(self.authentication.lock().unwrap().clone())
    }
}

#[async_trait]
impl ControlPlane for FakeProvider {
    async fn lock_identity(&self, user_id: &str) -> Result<(), SourceError> {
        self.control("lock", user_id)
    }

    async fn unlock_identity(&self, user_id: &str) -> Result<(), SourceError> {
        self.control("unlock", user_id)
    }

    async fn revoke_credential(&self, key_id: &str) -> Result<(), SourceError> {
        self.control("revoke", key_id)
    }
}

/// Memory store with switchable failures.
#[derive(Default)]
pub struct FlakyStore {
    pub inner: MemoryStore,
    pub fail_store_for: Mutex<HashSet<String>>,
    pub fail_watermark: AtomicBool,
    pub fail_exists: AtomicBool,
    pub fail_alerts: AtomicBool,
    pub fail_logs: AtomicBool,
}

fn unavailable() -> StoreError {
    StoreError::Unavailable("injected failure".to_string())
}

#[async_trait]
impl EventStore for FlakyStore {
    async fn store_event(&self, event: Event) -> Result<Option<Event>, StoreError> {
        if self.fail_store_for.lock().unwrap().contains(&event.event_id) {
            return Err(unavailable());
        }
        self.inner.store_event(event).await
    }

    async fn event_exists(&self, provider_id: &str) -> Result<bool, StoreError> {
        if self.fail_exists.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        self.inner.event_exists(provider_id).await
    }

    async fn last_event_timestamp(&self) -> Result<Option<DateTime<Utc>>, StoreError> {
        if self.fail_watermark.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        self.inner.last_event_timestamp().await
    }

    async fn list_events(&self, filter: &EventFilter) -> Result<Vec<Event>, StoreError> {
        self.inner.list_events(filter).await
    }

    async fn get_event(&self, id: Uuid) -> Result<Event, StoreError> {
        self.inner.get_event(id).await
    }

    async fn actor_events(
        &self,
        actor: &str,
        event_type: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Event>, StoreError> {
        self.inner.actor_events(actor, event_type, from, to).await
    }
}

#[async_trait]
impl AlertStore for FlakyStore {
    async fn store_alert(&self, alert: &Alert) -> Result<(), StoreError> {
        if self.fail_alerts.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        self.inner.store_alert(alert).await
    }

    async fn get_alert(&self, id: Uuid) -> Result<Alert, StoreError> {
        self.inner.get_alert(id).await
    }

    async fn list_alerts(&self, filter: &AlertFilter) -> Result<Vec<Alert>, StoreError> {
        self.inner.list_alerts(filter).await
    }

    async fn update_alert_status(&self, id: Uuid, status: AlertStatus) -> Result<(), StoreError> {
        self.inner.update_alert_status(id, status).await
    }

    async fn last_alert_at(
        &self,
        alert_type: &str,
        user_id: &str,
    ) -> Result<Option<DateTime<Utc>>, StoreError> {
        self.inner.last_alert_at(alert_type, user_id).await
    }
}

#[async_trait]
impl RemediationLogStore for FlakyStore {
    async fn log_remediation(&self, entry: &RemediationLog) -> Result<(), StoreError> {
        if self.fail_logs.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        self.inner.log_remediation(entry).await
    }

    async fn list_for_alert(&self, alert_id: Uuid) -> Result<Vec<RemediationLog>, StoreError> {
        self.inner.list_for_alert(alert_id).await
    }
}

/// Processor double that records which provider ids it was handed.
#[derive(Default)]
pub struct RecordingProcessor {
    pub seen: Mutex<Vec<String>>,
    pub fail: AtomicBool,
}

impl RecordingProcessor {
    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventProcessor for RecordingProcessor {
    async fn process_event(&self, event: &Event) -> Result<DetectionReport, DetectionError> {
        self.seen.lock().unwrap().push(event.event_id.clone());
        if self.fail.load(Ordering::SeqCst) {
            return Err(DetectionError("injected failure".to_string()));
        }
        Ok(DetectionReport::default())
    }
}

/// Full pipeline over one in-memory store: synthetic source feed, fake control plane.
pub struct Pipeline {
    pub store: Arc<MemoryStore>,
    pub control: Arc<FakeProvider>,
    pub state: SharedState,
}

pub fn synthetic_pipeline(config: Config) -> Pipeline {
    let store = Arc::new(MemoryStore::new());
    let control = Arc::new(FakeProvider::default());
    let source = Arc::new(ProviderClient::new(&config.provider).unwrap());

    let backends = Backends {
        events: store.clone(),
        alerts: store.clone(),
        remediation_logs: store.clone(),
        source,
        control: control.clone(),
    };

    let state = auditwarden::build_state(config, backends);
    Pipeline {
        store,
        control,
        state,
    }
}

/// A running HTTP server over a [`synthetic_pipeline`].
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub pipeline: Pipeline,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn get(&self, path: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("get request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn post(&self, path: &str, body: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("post request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn patch(&self, path: &str, body: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .patch(self.url(path))
            .json(body)
            .send()
            .await
            .expect("patch request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// Run one ingest cycle through the API and return its summary.
    pub async fn ingest_now(&self) -> Value {
        let (body, status) = self.post("/api/v1/ingest/now", &json!({})).await;
        assert_eq!(status, StatusCode::OK, "ingest failed: {body}");
        body
    }

    /// The alert of `alert_type`, which must exist exactly once.
    pub async fn single_alert(&self, alert_type: &str) -> Value {
        let (body, status) = self.get("/api/v1/alerts?limit=100").await;
        assert_eq!(status, StatusCode::OK);
        let matching: Vec<&Value> = body["alerts"]
            .as_array()
            .unwrap()
            .iter()
            .filter(|a| a["alert_type"] == alert_type)
            .collect();
        assert_eq!(matching.len(), 1, "expected one {alert_type} alert: {body}");
        matching[0].clone()
    }
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(test_config()).await
}

pub async fn spawn_app_with(config: Config) -> TestApp {
    let pipeline = synthetic_pipeline(config);
    let app = auditwarden::build_app(pipeline.state.clone());

    // Bind to random port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server failed");
    });

    TestApp {
        addr,
        client: Client::new(),
        pipeline,
    }
}
