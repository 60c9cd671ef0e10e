mod api_key_creation;
mod dormant;
mod failed_login;
mod forbidden_resource;

use std::sync::Arc;

pub use api_key_creation::ApiKeyCreationRule;
pub use dormant::DormantRule;
pub use failed_login::FailedLoginRule;
pub use forbidden_resource::ForbiddenResourceRule;

use super::RuleRegistry;
use crate::config::DetectionConfig;
use crate::store::{AlertStore, EventStore};

/// The built-in registry: three active rules followed by the dormant extension points.
pub fn default_rules(
    config: &DetectionConfig,
    events: Arc<dyn EventStore>,
    alerts: Arc<dyn AlertStore>,
) -> RuleRegistry {
    let mut registry = RuleRegistry::new();
    registry.register(Arc::new(FailedLoginRule::new(config, events, alerts)));
    registry.register(Arc::new(ForbiddenResourceRule));
    registry.register(Arc::new(ApiKeyCreationRule));
    for rule in DormantRule::all() {
        registry.register(Arc::new(rule));
    }
    registry
}
