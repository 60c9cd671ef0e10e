use std::net::SocketAddr;
use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tokio::signal;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use auditwarden::config::Config;
use auditwarden::source::ProviderClient;
use auditwarden::store::PgStore;
use auditwarden::{Backends, worker};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(&config.log_level)
        }))
        .init();

    tracing::info!("Starting auditwarden");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    tracing::info!("Migrations applied");

    let provider = Arc::new(ProviderClient::new(&config.provider)?);
    if !provider.has_credentials() {
        tracing::warn!("PROVIDER_API_KEY not set, serving the synthetic event feed");
    }

    let addr = SocketAddr::new(config.host, config.port);
    let poll_interval = config.ingestion.poll_interval;

    let backends = Backends::new(Arc::new(PgStore::new(pool)), provider);
    let state = auditwarden::build_state(config, backends);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let poller = worker::spawn(state.ingestor.clone(), poll_interval, shutdown_rx);

    let app = auditwarden::build_app(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let _ = shutdown_tx.send(true);
    let _ = poller.await;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
