use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, SecondsFormat, Utc};
use serde_json::json;

use crate::config::DetectionConfig;
use crate::detection::{Rule, RuleError};
use crate::models::{Alert, Event, Severity};
use crate::store::{AlertStore, EventStore};

const NAME: &str = "failed_login_spike";
const EVENT_TYPE: &str = "auth.failed";

/// Brute-force detector: `threshold` or more `auth.failed` events for one actor
/// within `(ts - window, ts]` of the triggering event.
///
/// Every qualifying event past the threshold raises a new alert unless a
/// cool-down is configured.
pub struct FailedLoginRule {
    events: Arc<dyn EventStore>,
    alerts: Arc<dyn AlertStore>,
    window_min: i64,
    threshold: usize,
    cooldown_secs: i64,
}

impl FailedLoginRule {
    pub fn new(
        config: &DetectionConfig,
        events: Arc<dyn EventStore>,
        alerts: Arc<dyn AlertStore>,
    ) -> Self {
        Self {
            events,
            alerts,
            window_min: config.failed_login_window_min,
            threshold: config.failed_login_threshold,
            cooldown_secs: config.failed_login_cooldown_secs,
        }
    }

    async fn cooling_down(&self, actor: &str) -> Result<bool, RuleError> {
        if self.cooldown_secs <= 0 {
            return Ok(false);
        }
        let cooldown = Duration::try_seconds(self.cooldown_secs).ok_or_else(|| {
            RuleError(format!("cool-down out of range: {}s", self.cooldown_secs))
        })?;
        let last = self.alerts.last_alert_at(NAME, actor).await?;
        Ok(last.is_some_and(|last| Utc::now() - last < cooldown))
    }
}

#[async_trait]
impl Rule for FailedLoginRule {
    fn name(&self) -> &str {
        NAME
    }

    fn is_active(&self) -> bool {
        true
    }

    async fn evaluate(&self, event: &Event) -> Result<Vec<Alert>, RuleError> {
        if event.event_type != EVENT_TYPE || event.actor.is_empty() {
            return Ok(vec![]);
        }

        let from = Duration::try_minutes(self.window_min)
            .filter(|window| *window > Duration::zero())
            .and_then(|window| event.timestamp.checked_sub_signed(window))
            .ok_or_else(|| RuleError(format!("window out of range: {} min", self.window_min)))?;
        let attempts = self
            .events
            .actor_events(&event.actor, EVENT_TYPE, from, event.timestamp)
            .await?;

        let count = attempts.len();
        if count < self.threshold {
            return Ok(vec![]);
        }

        if self.cooling_down(&event.actor).await? {
            tracing::debug!("Suppressing {NAME} for {} during cool-down", event.actor);
            return Ok(vec![]);
        }

        let mut ip_addresses: Vec<&str> = Vec::new();
        for attempt in &attempts {
            if !attempt.ip.is_empty() && !ip_addresses.contains(&attempt.ip.as_str()) {
                ip_addresses.push(&attempt.ip);
            }
        }

        let first = attempts.first().map_or(event.timestamp, |e| e.timestamp);
        let last = attempts.last().map_or(event.timestamp, |e| e.timestamp);

        let alert = Alert::open(
            NAME,
            Severity::High,
            &event.actor,
            format!(
                "Detected {count} failed login attempts for user {} within {} minutes (threshold: {})",
                event.actor, self.window_min, self.threshold
            ),
            attempts.iter().map(|e| e.id).collect(),
            json!({
                "failed_attempts": count,
                "window_minutes": self.window_min,
                "threshold": self.threshold,
                "ip_addresses": ip_addresses,
                "first_attempt": first.to_rfc3339_opts(SecondsFormat::Secs, true),
                "last_attempt": last.to_rfc3339_opts(SecondsFormat::Secs, true),
            }),
        );

        Ok(vec![alert])
    }
}
