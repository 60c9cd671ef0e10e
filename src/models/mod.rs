pub mod alert;
pub mod event;
pub mod remediation_log;
pub mod user_profile;

pub use alert::{Alert, AlertStatus, Severity};
pub use event::Event;
pub use remediation_log::{ActionType, RemediationLog};
pub use user_profile::UserProfile;
