use chrono::{DateTime, Duration, SubsecRound, Utc};
use serde_json::{Map, Value, json};

use super::{Feed, RawEvent};

struct Sample {
    suffix: &'static str,
    event_type: &'static str,
    actor: &'static str,
    resource: &'static str,
    ip: &'static str,
    minutes_ago: i64,
}

const fn sample(
    suffix: &'static str,
    event_type: &'static str,
    actor: &'static str,
    resource: &'static str,
    ip: &'static str,
    minutes_ago: i64,
) -> Sample {
    Sample {
        suffix,
        event_type,
        actor,
        resource,
        ip,
        minutes_ago,
    }
}

const SAMPLES: &[Sample] = &[
    sample("001", "auth.failed", "user@example.com", "iam", "203.0.113.1", 10),
    sample("002", "auth.failed", "user@example.com", "iam", "203.0.113.1", 8),
    sample("003", "auth.failed", "user@example.com", "iam", "203.0.113.2", 5),
    sample("006", "auth.failed", "user@example.com", "iam", "203.0.113.1", 4),
    sample("007", "auth.failed", "user@example.com", "iam", "203.0.113.3", 2),
    sample("004", "apiKey.create", "admin@example.com", "iam", "198.51.100.1", 3),
    sample("005", "forbidden", "attacker@example.com", "secrets", "192.0.2.1", 1),
];

/// Fixed demo feed served when no provider credentials are configured.
///
/// Ids and timestamps derive from one anchor taken at construction, so repeated
/// fetches return the same events and re-ingestion dedups cleanly.
#[derive(Debug, Clone)]
pub struct SyntheticFeed {
    anchor: DateTime<Utc>,
}

impl SyntheticFeed {
    pub fn new() -> Self {
        Self::anchored_at(Utc::now())
    }

    pub fn anchored_at(anchor: DateTime<Utc>) -> Self {
        Self {
            anchor: anchor.trunc_subsecs(0),
        }
    }

    pub fn anchor(&self) -> DateTime<Utc> {
        self.anchor
    }

    pub fn events(&self, feed: Feed, since: Option<DateTime<Utc>>) -> Vec<RawEvent> {
        SAMPLES
            .iter()
            .map(|sample| self.build(sample, feed))
            .filter(|event| since.is_none_or(|since| event.timestamp > since))
            .collect()
    }

    fn build(&self, sample: &Sample, feed: Feed) -> RawEvent {
        let provider_id = format!("evt_mock_{}_{}", self.anchor.timestamp(), sample.suffix);

        let mut raw = Map::new();
        raw.insert("event_id".into(), json!(provider_id));
        raw.insert("type".into(), json!(sample.event_type));
        raw.insert("actor".into(), json!(sample.actor));
        match sample.event_type {
            "auth.failed" => {
                raw.insert("reason".into(), json!("invalid_credentials"));
            }
            "apiKey.create" => {
                raw.insert("key_id".into(), json!("key_abc123"));
                raw.insert("key_name".into(), json!("Production API Key"));
            }
            "forbidden" => {
                raw.insert("resource".into(), json!("secrets/database-password"));
                raw.insert("action".into(), json!("read"));
            }
            _ => {}
        }
        raw.insert("source".into(), Value::String(feed.tag().to_string()));

        RawEvent {
            provider_id,
            event_type: sample.event_type.to_string(),
            actor: sample.actor.to_string(),
            resource: sample.resource.to_string(),
            ip: sample.ip.to_string(),
            region: String::new(),
            timestamp: self.anchor - Duration::minutes(sample.minutes_ago),
            source: feed,
            raw,
        }
    }
}

impl Default for SyntheticFeed {
    fn default() -> Self {
        Self::new()
    }
}
