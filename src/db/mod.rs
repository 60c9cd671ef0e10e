pub mod alerts;
pub mod events;
pub mod remediation_log;
