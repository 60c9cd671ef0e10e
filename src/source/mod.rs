//! Provider audit feeds and control-plane calls.

pub mod client;
pub mod normalize;
pub mod synthetic;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub use client::ProviderClient;

/// Provider event in canonical shape, before it is assigned an internal id.
#[derive(Debug, Clone, PartialEq)]
pub struct RawEvent {
    pub provider_id: String,
    pub event_type: String,
    pub actor: String,
    pub resource: String,
    pub ip: String,
    pub region: String,
    pub timestamp: DateTime<Utc>,
    pub source: Feed,
    pub raw: serde_json::Map<String, serde_json::Value>,
}

/// The two logical feeds the provider exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feed {
    Audit,
    Authentication,
}

impl Feed {
    pub fn path(&self) -> &'static str {
        match self {
            Feed::Audit => "/audit/v1alpha1/events",
            Feed::Authentication => "/iam/v1alpha1/login-logs",
        }
    }

    /// Envelope key the feed lists its records under.
    pub fn list_key(&self) -> &'static str {
        match self {
            Feed::Audit => "events",
            Feed::Authentication => "login_logs",
        }
    }

    /// Tag written into the raw payload's `source` field.
    pub fn tag(&self) -> &'static str {
        match self {
            Feed::Audit => "audit",
            Feed::Authentication => "authentication",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("provider credentials are not configured")]
    MissingCredentials,
    #[error("provider API authentication failed: {0}")]
    Authentication(reqwest::StatusCode),
    #[error("provider API error ({context}): {status} - {body}")]
    Status {
        context: String,
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("provider request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("failed to decode provider response: {0}")]
    Decode(String),
}

/// Incremental event fetch. Implementations return only events strictly newer
/// than `since`, oldest first.
#[async_trait]
pub trait AuditSource: Send + Sync {
    async fn fetch_audit_events(
        &self,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<RawEvent>, SourceError>;

    async fn fetch_authentication_events(
        &self,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<RawEvent>, SourceError>;
}

/// Mutating identity operations used by remediation.
#[async_trait]
pub trait ControlPlane: Send + Sync {
    async fn lock_identity(&self, user_id: &str) -> Result<(), SourceError>;
    async fn unlock_identity(&self, user_id: &str) -> Result<(), SourceError>;
    async fn revoke_credential(&self, key_id: &str) -> Result<(), SourceError>;
}
