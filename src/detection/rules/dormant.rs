use async_trait::async_trait;

use crate::detection::{Rule, RuleError};
use crate::models::{Alert, Event};

/// Registered extension point with no detection logic yet. Reports itself
/// inactive and never raises an alert.
pub struct DormantRule {
    name: &'static str,
}

impl DormantRule {
    pub fn impossible_travel() -> Self {
        Self { name: "impossible_travel" }
    }

    pub fn unusual_ip_region() -> Self {
        Self { name: "unusual_ip_region" }
    }

    pub fn iam_policy_change() -> Self {
        Self { name: "iam_policy_change" }
    }

    pub fn high_privilege_unknown_ip() -> Self {
        Self { name: "high_privilege_unknown_ip" }
    }

    pub fn all() -> [Self; 4] {
        [
            Self::impossible_travel(),
            Self::unusual_ip_region(),
            Self::iam_policy_change(),
            Self::high_privilege_unknown_ip(),
        ]
    }
}

#[async_trait]
impl Rule for DormantRule {
    fn name(&self) -> &str {
        self.name
    }

    fn is_active(&self) -> bool {
        false
    }

    async fn evaluate(&self, _event: &Event) -> Result<Vec<Alert>, RuleError> {
        Ok(vec![])
    }
}
