//! Rule evaluation over freshly ingested events.
//!
//! The [`Engine`] walks a fixed, ordered [`RuleRegistry`]. Every rule fails on
//! its own: a rule error or an alert that cannot be stored is recorded in the
//! [`DetectionReport`] and evaluation moves on to the next rule.

pub mod rules;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::DetectionConfig;
use crate::models::{Alert, Event};
use crate::store::{AlertStore, EventStore, StoreError};

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct RuleError(pub String);

impl From<StoreError> for RuleError {
    fn from(err: StoreError) -> Self {
        RuleError(err.to_string())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("detection failed: {0}")]
pub struct DetectionError(pub String);

#[async_trait]
pub trait Rule: Send + Sync {
    fn name(&self) -> &str;
    fn is_active(&self) -> bool;
    async fn evaluate(&self, event: &Event) -> Result<Vec<Alert>, RuleError>;
}

/// Receives each newly stored event from the ingestor.
#[async_trait]
pub trait EventProcessor: Send + Sync {
    async fn process_event(&self, event: &Event) -> Result<DetectionReport, DetectionError>;
}

/// Rules in registration order.
#[derive(Default)]
pub struct RuleRegistry {
    rules: Vec<Arc<dyn Rule>>,
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, rule: Arc<dyn Rule>) {
        self.rules.push(rule);
    }

    pub fn list(&self) -> &[Arc<dyn Rule>] {
        &self.rules
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RuleOutcome {
    Skipped,
    Evaluated {
        alerts_stored: usize,
        store_failures: usize,
    },
    Failed(String),
}

#[derive(Debug, Clone, Default)]
pub struct DetectionReport {
    pub outcomes: Vec<(String, RuleOutcome)>,
}

impl DetectionReport {
    pub fn alerts_stored(&self) -> usize {
        self.outcomes
            .iter()
            .map(|(_, outcome)| match outcome {
                RuleOutcome::Evaluated { alerts_stored, .. } => *alerts_stored,
                _ => 0,
            })
            .sum()
    }

    pub fn outcome(&self, rule: &str) -> Option<&RuleOutcome> {
        self.outcomes
            .iter()
            .find(|(name, _)| name == rule)
            .map(|(_, outcome)| outcome)
    }
}

pub struct Engine {
    rules: RuleRegistry,
    alerts: Arc<dyn AlertStore>,
}

impl Engine {
    pub fn new(rules: RuleRegistry, alerts: Arc<dyn AlertStore>) -> Self {
        Self { rules, alerts }
    }

    /// Engine with the built-in rule set.
    pub fn with_default_rules(
        config: &DetectionConfig,
        events: Arc<dyn EventStore>,
        alerts: Arc<dyn AlertStore>,
    ) -> Self {
        let rules = rules::default_rules(config, events, alerts.clone());
        Self::new(rules, alerts)
    }

    pub fn rules(&self) -> &RuleRegistry {
        &self.rules
    }

    async fn run_rule(&self, rule: &dyn Rule, event: &Event) -> RuleOutcome {
        if !rule.is_active() {
            return RuleOutcome::Skipped;
        }

        let alerts = match rule.evaluate(event).await {
            Ok(alerts) => alerts,
            Err(e) => {
                tracing::warn!("Rule {} failed on event {}: {e}", rule.name(), event.event_id);
                return RuleOutcome::Failed(e.0);
            }
        };

        let mut alerts_stored = 0;
        let mut store_failures = 0;
        for alert in &alerts {
            match self.alerts.store_alert(alert).await {
                Ok(()) => {
                    alerts_stored += 1;
                    tracing::info!(
                        "Alert {} raised by {} ({}) for {}",
                        alert.id,
                        alert.alert_type,
                        alert.severity,
                        alert.user_id
                    );
                }
                Err(e) => {
                    store_failures += 1;
                    tracing::error!("Failed to store alert from rule {}: {e}", rule.name());
                }
            }
        }

        RuleOutcome::Evaluated {
            alerts_stored,
            store_failures,
        }
    }
}

#[async_trait]
impl EventProcessor for Engine {
    async fn process_event(&self, event: &Event) -> Result<DetectionReport, DetectionError> {
        let mut report = DetectionReport::default();
        for rule in self.rules.list() {
            let outcome = self.run_rule(rule.as_ref(), event).await;
            report.outcomes.push((rule.name().to_string(), outcome));
        }
        Ok(report)
    }
}
