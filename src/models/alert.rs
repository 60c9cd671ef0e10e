use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "alert_severity", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "alert_status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertStatus {
    Open,
    Investigating,
    Resolved,
    FalsePositive,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "LOW",
            Severity::Medium => "MEDIUM",
            Severity::High => "HIGH",
            Severity::Critical => "CRITICAL",
        }
    }
}

impl AlertStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertStatus::Open => "OPEN",
            AlertStatus::Investigating => "INVESTIGATING",
            AlertStatus::Resolved => "RESOLVED",
            AlertStatus::FalsePositive => "FALSE_POSITIVE",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, AlertStatus::Resolved | AlertStatus::FalsePositive)
    }

    /// Whether `next` is a forward move in the alert lifecycle.
    ///
    /// Direct status updates are not restricted to these moves; callers use this
    /// to tell a lifecycle step from a reopen.
    pub fn can_transition_to(&self, next: AlertStatus) -> bool {
        match self {
            AlertStatus::Open => matches!(
                next,
                AlertStatus::Investigating | AlertStatus::Resolved | AlertStatus::FalsePositive
            ),
            AlertStatus::Investigating => {
                matches!(next, AlertStatus::Resolved | AlertStatus::FalsePositive)
            }
            AlertStatus::Resolved | AlertStatus::FalsePositive => false,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "LOW" => Ok(Severity::Low),
            "MEDIUM" => Ok(Severity::Medium),
            "HIGH" => Ok(Severity::High),
            "CRITICAL" => Ok(Severity::Critical),
            _ => Err(format!("Invalid severity: {s}")),
        }
    }
}

impl FromStr for AlertStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "OPEN" => Ok(AlertStatus::Open),
            "INVESTIGATING" => Ok(AlertStatus::Investigating),
            "RESOLVED" => Ok(AlertStatus::Resolved),
            "FALSE_POSITIVE" => Ok(AlertStatus::FalsePositive),
            _ => Err(format!("Invalid status: {s}")),
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Alert {
    pub id: Uuid,
    pub event_refs: Vec<Uuid>,
    pub alert_type: String,
    pub severity: Severity,
    pub user_id: String,
    pub description: String,
    pub status: AlertStatus,
    pub evidence: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Alert {
    /// A fresh `OPEN` alert with a generated id.
    pub fn open(
        alert_type: &str,
        severity: Severity,
        user_id: &str,
        description: String,
        event_refs: Vec<Uuid>,
        evidence: serde_json::Value,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            event_refs,
            alert_type: alert_type.to_string(),
            severity,
            user_id: user_id.to_string(),
            description,
            status: AlertStatus::Open,
            evidence,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_moves_to_every_other_state() {
        for next in [
            AlertStatus::Investigating,
            AlertStatus::Resolved,
            AlertStatus::FalsePositive,
        ] {
            assert!(AlertStatus::Open.can_transition_to(next));
        }
        assert!(!AlertStatus::Open.can_transition_to(AlertStatus::Open));
    }

    #[test]
    fn investigating_only_closes() {
        assert!(AlertStatus::Investigating.can_transition_to(AlertStatus::Resolved));
        assert!(AlertStatus::Investigating.can_transition_to(AlertStatus::FalsePositive));
        assert!(!AlertStatus::Investigating.can_transition_to(AlertStatus::Open));
    }

    #[test]
    fn terminal_states_have_no_forward_moves() {
        for terminal in [AlertStatus::Resolved, AlertStatus::FalsePositive] {
            assert!(terminal.is_terminal());
            assert!(!terminal.can_transition_to(AlertStatus::Open));
            assert!(!terminal.can_transition_to(AlertStatus::Investigating));
        }
    }

    #[test]
    fn parses_wire_names() {
        assert_eq!("false_positive".parse::<AlertStatus>().unwrap(), AlertStatus::FalsePositive);
        assert_eq!("CRITICAL".parse::<Severity>().unwrap(), Severity::Critical);
        assert!("urgent".parse::<Severity>().is_err());
        assert_eq!(
            serde_json::to_value(AlertStatus::FalsePositive).unwrap(),
            serde_json::json!("FALSE_POSITIVE")
        );
    }
}
