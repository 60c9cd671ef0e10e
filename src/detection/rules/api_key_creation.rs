use async_trait::async_trait;
use chrono::SecondsFormat;
use serde_json::json;

use crate::detection::{Rule, RuleError};
use crate::models::{Alert, Event, Severity};

const NAME: &str = "api_key_creation";

/// Flags every new API key. No suppression.
pub struct ApiKeyCreationRule;

#[async_trait]
impl Rule for ApiKeyCreationRule {
    fn name(&self) -> &str {
        NAME
    }

    fn is_active(&self) -> bool {
        true
    }

    async fn evaluate(&self, event: &Event) -> Result<Vec<Alert>, RuleError> {
        if event.event_type != "apiKey.create" {
            return Ok(vec![]);
        }

        Ok(vec![Alert::open(
            NAME,
            Severity::High,
            &event.actor,
            format!("New API key created by {}", event.actor),
            vec![event.id],
            json!({
                "key_id": event.raw_str("key_id").unwrap_or_default(),
                "key_name": event.raw_str("key_name").unwrap_or_default(),
                "ip_address": event.ip,
                "timestamp": event.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
                "raw_event": event.raw,
            }),
        )])
    }
}
