use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use super::{Feed, RawEvent, SourceError};

type Record = Map<String, Value>;

const ID_KEYS: &[&str] = &["id", "event_id", "uuid", "log_id"];
const TYPE_KEYS: &[&str] = &["event_type", "type", "category", "action"];
const ACTOR_KEYS: &[&str] = &["actor", "user", "user_email", "principal", "identity"];
const RESOURCE_KEYS: &[&str] = &["resource", "resource_name", "target", "service_name"];
const IP_KEYS: &[&str] = &["ip", "ip_address", "source_ip", "client_ip"];
const REGION_KEYS: &[&str] = &["region", "zone", "locality"];
const TIMESTAMP_KEYS: &[&str] = &[
    "timestamp",
    "occurred_at",
    "created_at",
    "time",
    "last_login_at",
];

/// Pull the record list out of a page body. The feed's own key wins, then the
/// generic envelope keys.
pub fn extract_items(body: &[u8], list_key: &str) -> Result<Vec<Record>, SourceError> {
    let envelope: Map<String, Value> =
        serde_json::from_slice(body).map_err(|e| SourceError::Decode(e.to_string()))?;

    for key in [list_key, "events", "items", "data", "logs"] {
        if let Some(list) = envelope.get(key) {
            let items = list
                .as_array()
                .ok_or_else(|| SourceError::Decode(format!("\"{key}\" is not a list")))?;
            return Ok(items
                .iter()
                .filter_map(|item| item.as_object().cloned())
                .collect());
        }
    }

    Err(SourceError::Decode("no events found in response".to_string()))
}

/// Map one provider record to the canonical shape. Returns `None` when the
/// record carries no recognised id.
pub fn normalize(record: &Record, feed: Feed) -> Option<RawEvent> {
    let provider_id = first_string(record, ID_KEYS).filter(|id| !id.is_empty())?;

    let event_type = first_string(record, TYPE_KEYS)
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| "unknown".to_string());

    let timestamp = first_string(record, TIMESTAMP_KEYS)
        .and_then(|ts| DateTime::parse_from_rfc3339(&ts).ok())
        .map(|ts| ts.with_timezone(&Utc))
        .unwrap_or_else(Utc::now);

    let mut raw = record.clone();
    raw.insert("source".to_string(), Value::String(feed.tag().to_string()));

    Some(RawEvent {
        provider_id,
        event_type,
        actor: first_string(record, ACTOR_KEYS).unwrap_or_default(),
        resource: first_string(record, RESOURCE_KEYS).unwrap_or_default(),
        ip: first_string(record, IP_KEYS).unwrap_or_default(),
        region: first_string(record, REGION_KEYS).unwrap_or_default(),
        timestamp,
        source: feed,
        raw,
    })
}

/// First candidate key holding a string or number.
fn first_string(record: &Record, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match record.get(*key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn maps_field_variants_first_match_wins() {
        let r = record(json!({
            "uuid": "from-uuid",
            "event_id": "from-event-id",
            "category": "auth.failed",
            "user_email": "a@example.com",
            "principal": "someone-else",
            "target": "iam",
            "client_ip": "10.0.0.1",
            "zone": "fr-par-1",
            "occurred_at": "2025-01-01T10:00:00Z"
        }));

        let event = normalize(&r, Feed::Authentication).unwrap();
        assert_eq!(event.provider_id, "from-event-id");
        assert_eq!(event.event_type, "auth.failed");
        assert_eq!(event.actor, "a@example.com");
        assert_eq!(event.resource, "iam");
        assert_eq!(event.ip, "10.0.0.1");
        assert_eq!(event.region, "fr-par-1");
        assert_eq!(event.timestamp.to_rfc3339(), "2025-01-01T10:00:00+00:00");
        assert_eq!(event.raw["source"], json!("authentication"));
        assert_eq!(event.raw["principal"], json!("someone-else"));
    }

    #[test]
    fn numeric_ids_are_stringified() {
        let event = normalize(&record(json!({ "id": 42, "type": "login" })), Feed::Audit).unwrap();
        assert_eq!(event.provider_id, "42");
        assert_eq!(event.raw["source"], json!("audit"));
    }

    #[test]
    fn missing_id_is_dropped() {
        assert!(normalize(&record(json!({ "type": "auth.failed" })), Feed::Audit).is_none());
        assert!(normalize(&record(json!({ "id": "" })), Feed::Audit).is_none());
    }

    #[test]
    fn missing_type_and_timestamp_get_defaults() {
        let before = Utc::now();
        let event = normalize(&record(json!({ "id": "x", "time": "not a date" })), Feed::Audit)
            .unwrap();
        assert_eq!(event.event_type, "unknown");
        assert!(event.timestamp >= before);
        assert_eq!(event.actor, "");
    }

    #[test]
    fn extracts_from_feed_key_then_fallbacks() {
        let body = br#"{"login_logs": [{"id": "1"}, "junk", {"id": "2"}]}"#;
        assert_eq!(extract_items(body, "login_logs").unwrap().len(), 2);

        let body = br#"{"items": [{"id": "1"}]}"#;
        assert_eq!(extract_items(body, "events").unwrap().len(), 1);

        let body = br#"{"total_count": 0}"#;
        assert!(matches!(
            extract_items(body, "events"),
            Err(SourceError::Decode(_))
        ));
    }
}
