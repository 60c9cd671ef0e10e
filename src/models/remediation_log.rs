use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "remediation_action", rename_all = "snake_case")]
pub enum ActionType {
    LockUser,
    UnlockUser,
    RevokeKey,
}

impl ActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::LockUser => "lock_user",
            ActionType::UnlockUser => "unlock_user",
            ActionType::RevokeKey => "revoke_key",
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lock_user" => Ok(ActionType::LockUser),
            "unlock_user" => Ok(ActionType::UnlockUser),
            "revoke_key" => Ok(ActionType::RevokeKey),
            _ => Err(format!("Unknown action: {s}")),
        }
    }
}

/// Audit record of one remediation attempt. `result` is `success` or `failed: <reason>`.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct RemediationLog {
    pub id: Uuid,
    pub alert_id: Option<Uuid>,
    pub actor_user: String,
    pub action_type: ActionType,
    pub payload: serde_json::Value,
    pub result: String,
    pub timestamp: DateTime<Utc>,
}

impl RemediationLog {
    pub fn succeeded(&self) -> bool {
        self.result == "success"
    }
}
