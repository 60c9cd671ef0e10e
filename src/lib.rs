pub mod config;
pub mod error;
pub mod state;
pub mod db;
pub mod models;
pub mod middleware;
pub mod routes;
pub mod store;
pub mod source;
pub mod ingest;
pub mod detection;
pub mod remediation;
pub mod worker;

use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue, Method, header};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::detection::Engine;
use crate::ingest::Ingestor;
use crate::middleware::auth::require_token;
use crate::remediation::RemediationService;
use crate::source::{AuditSource, ControlPlane};
use crate::state::{AppState, SharedState};
use crate::store::{AlertStore, EventStore, RemediationLogStore};

const MAX_BODY_SIZE: usize = 64 * 1024;

/// External collaborators the pipeline is assembled from.
pub struct Backends {
    pub events: Arc<dyn EventStore>,
    pub alerts: Arc<dyn AlertStore>,
    pub remediation_logs: Arc<dyn RemediationLogStore>,
    pub source: Arc<dyn AuditSource>,
    pub control: Arc<dyn ControlPlane>,
}

impl Backends {
    /// One store backing all three store roles, one provider for both source roles.
    pub fn new<S, P>(store: Arc<S>, provider: Arc<P>) -> Self
    where
        S: EventStore + AlertStore + RemediationLogStore + 'static,
        P: AuditSource + ControlPlane + 'static,
    {
        Self {
            events: store.clone(),
            alerts: store.clone(),
            remediation_logs: store,
            source: provider.clone(),
            control: provider,
        }
    }
}

pub fn build_state(config: Config, backends: Backends) -> SharedState {
    let engine = Arc::new(Engine::with_default_rules(
        &config.detection,
        backends.events.clone(),
        backends.alerts.clone(),
    ));

    let ingestor = Arc::new(Ingestor::new(
        backends.source,
        backends.events.clone(),
        engine.clone(),
    ));

    let remediation = RemediationService::new(
        backends.control,
        backends.remediation_logs.clone(),
        backends.alerts.clone(),
    );

    Arc::new(AppState {
        config,
        events: backends.events,
        alerts: backends.alerts,
        remediation_logs: backends.remediation_logs,
        engine,
        ingestor,
        remediation,
    })
}

pub fn build_app(state: SharedState) -> Router {
    let api = routes::api_routes().route_layer(axum::middleware::from_fn_with_state(
        state.clone(),
        require_token,
    ));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PATCH])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    Router::new()
        .merge(api)
        .route("/health", axum::routing::get(health))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_SIZE))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-content-type-options"),
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-frame-options"),
            HeaderValue::from_static("DENY"),
        ))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
