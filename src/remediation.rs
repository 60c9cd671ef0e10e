//! Corrective control-plane actions with an unconditional audit trail.
//!
//! Every attempt writes exactly one [`RemediationLog`], success or failure.
//! The control-plane call and the log write are not transactional.
//!
//! Alert-linked forms check that the alert exists before touching the
//! control plane, so a log row never points at a missing alert.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::models::{ActionType, Alert, AlertStatus, RemediationLog};
use crate::source::{ControlPlane, SourceError};
use crate::store::{AlertStore, RemediationLogStore, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum RemediationError {
    #[error("control-plane call failed: {0}")]
    ControlPlane(#[source] SourceError),
    #[error("failed to write remediation log: {0}")]
    Log(#[source] StoreError),
    #[error("failed to load alert: {0}")]
    Alert(#[source] StoreError),
    #[error("alert {0} has no subject for this action")]
    MissingSubject(Uuid),
}

pub struct RemediationService {
    control: Arc<dyn ControlPlane>,
    logs: Arc<dyn RemediationLogStore>,
    alerts: Arc<dyn AlertStore>,
}

impl RemediationService {
    pub fn new(
        control: Arc<dyn ControlPlane>,
        logs: Arc<dyn RemediationLogStore>,
        alerts: Arc<dyn AlertStore>,
    ) -> Self {
        Self {
            control,
            logs,
            alerts,
        }
    }

    pub async fn lock_user(
        &self,
        user_id: &str,
        actor: &str,
        reason: &str,
    ) -> Result<(), RemediationError> {
        self.execute(None, ActionType::LockUser, user_id, actor, reason)
            .await
    }

    pub async fn unlock_user(
        &self,
        user_id: &str,
        actor: &str,
        reason: &str,
    ) -> Result<(), RemediationError> {
        self.execute(None, ActionType::UnlockUser, user_id, actor, reason)
            .await
    }

    pub async fn revoke_api_key(
        &self,
        key_id: &str,
        actor: &str,
        reason: &str,
    ) -> Result<(), RemediationError> {
        self.execute(None, ActionType::RevokeKey, key_id, actor, reason)
            .await
    }

    pub async fn lock_user_with_alert(
        &self,
        alert_id: Uuid,
        user_id: &str,
        actor: &str,
        reason: &str,
    ) -> Result<(), RemediationError> {
        self.load_alert(alert_id).await?;
        self.execute(Some(alert_id), ActionType::LockUser, user_id, actor, reason)
            .await
    }

    pub async fn unlock_user_with_alert(
        &self,
        alert_id: Uuid,
        user_id: &str,
        actor: &str,
        reason: &str,
    ) -> Result<(), RemediationError> {
        self.load_alert(alert_id).await?;
        self.execute(Some(alert_id), ActionType::UnlockUser, user_id, actor, reason)
            .await
    }

    pub async fn revoke_api_key_with_alert(
        &self,
        alert_id: Uuid,
        key_id: &str,
        actor: &str,
        reason: &str,
    ) -> Result<(), RemediationError> {
        self.load_alert(alert_id).await?;
        self.execute(Some(alert_id), ActionType::RevokeKey, key_id, actor, reason)
            .await
    }

    /// Remediate an alert, taking the subject from the alert itself: its
    /// `user_id` for lock/unlock, `evidence.key_id` for revoke. On success the
    /// alert moves to `RESOLVED`.
    pub async fn remediate_alert(
        &self,
        alert_id: Uuid,
        action: ActionType,
        actor: &str,
        reason: &str,
    ) -> Result<(), RemediationError> {
        let alert = self.load_alert(alert_id).await?;

        let subject = match action {
            ActionType::LockUser | ActionType::UnlockUser => Some(alert.user_id.as_str()),
            ActionType::RevokeKey => alert.evidence.get("key_id").and_then(|v| v.as_str()),
        }
        .filter(|s| !s.is_empty())
        .ok_or(RemediationError::MissingSubject(alert_id))?;

        self.execute(Some(alert_id), action, subject, actor, reason)
            .await?;

        if let Err(e) = self
            .alerts
            .update_alert_status(alert_id, AlertStatus::Resolved)
            .await
        {
            tracing::error!("Remediated alert {alert_id} but could not resolve it: {e}");
        }

        Ok(())
    }

    async fn load_alert(&self, alert_id: Uuid) -> Result<Alert, RemediationError> {
        self.alerts
            .get_alert(alert_id)
            .await
            .map_err(RemediationError::Alert)
    }

    async fn execute(
        &self,
        alert_id: Option<Uuid>,
        action: ActionType,
        subject: &str,
        actor: &str,
        reason: &str,
    ) -> Result<(), RemediationError> {
        let outcome = match action {
            ActionType::LockUser => self.control.lock_identity(subject).await,
            ActionType::UnlockUser => self.control.unlock_identity(subject).await,
            ActionType::RevokeKey => self.control.revoke_credential(subject).await,
        };

        let subject_key = match action {
            ActionType::RevokeKey => "key_id",
            ActionType::LockUser | ActionType::UnlockUser => "user_id",
        };

        let entry = RemediationLog {
            id: Uuid::now_v7(),
            alert_id,
            actor_user: actor.to_string(),
            action_type: action,
            payload: json!({ subject_key: subject, "reason": reason }),
            result: match &outcome {
                Ok(()) => "success".to_string(),
                Err(e) => format!("failed: {e}"),
            },
            timestamp: Utc::now(),
        };

        let logged = self.logs.log_remediation(&entry).await;

        match outcome {
            Ok(()) => {
                tracing::info!("{action} {subject} by {actor} succeeded");
                logged.map_err(RemediationError::Log)
            }
            Err(e) => {
                tracing::warn!("{action} {subject} by {actor} failed: {e}");
                if let Err(log_err) = logged {
                    tracing::error!("Failed to record failed {action} for {subject}: {log_err}");
                }
                Err(RemediationError::ControlPlane(e))
            }
        }
    }
}
