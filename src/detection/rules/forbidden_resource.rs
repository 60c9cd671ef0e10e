use async_trait::async_trait;
use chrono::SecondsFormat;
use serde_json::json;

use crate::detection::{Rule, RuleError};
use crate::models::{Alert, Event, Severity};

const NAME: &str = "forbidden_sensitive_resource";

/// Checked in order; the first hit names the category.
const SENSITIVE: &[&str] = &["iam", "secrets", "kms", "secret"];

/// Denied access to IAM, secrets, or KMS resources.
pub struct ForbiddenResourceRule;

impl ForbiddenResourceRule {
    fn sensitive_category(event: &Event) -> Option<&'static str> {
        let resource = event.resource.to_lowercase();
        let raw_resource = event.raw_str("resource").map(str::to_lowercase);

        SENSITIVE.iter().copied().find(|category| {
            (!resource.is_empty() && resource.contains(category))
                || raw_resource.as_deref().is_some_and(|r| r.contains(category))
        })
    }
}

#[async_trait]
impl Rule for ForbiddenResourceRule {
    fn name(&self) -> &str {
        NAME
    }

    fn is_active(&self) -> bool {
        true
    }

    async fn evaluate(&self, event: &Event) -> Result<Vec<Alert>, RuleError> {
        if event.event_type != "forbidden" {
            return Ok(vec![]);
        }

        let Some(category) = Self::sensitive_category(event) else {
            return Ok(vec![]);
        };

        Ok(vec![Alert::open(
            NAME,
            Severity::Critical,
            &event.actor,
            format!(
                "Forbidden access attempt to sensitive resource ({category}) by {}",
                event.actor
            ),
            vec![event.id],
            json!({
                "resource_type": category,
                "resource": event.resource,
                "ip_address": event.ip,
                "timestamp": event.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
                "raw_event": event.raw,
            }),
        )])
    }
}
