use std::sync::Arc;

use crate::config::Config;
use crate::detection::Engine;
use crate::ingest::Ingestor;
use crate::remediation::RemediationService;
use crate::store::{AlertStore, EventStore, RemediationLogStore};

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub config: Config,
    pub events: Arc<dyn EventStore>,
    pub alerts: Arc<dyn AlertStore>,
    pub remediation_logs: Arc<dyn RemediationLogStore>,
    pub engine: Arc<Engine>,
    pub ingestor: Arc<Ingestor>,
    pub remediation: RemediationService,
}
