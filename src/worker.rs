use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::ingest::Ingestor;

/// Spawn the polling loop on the current runtime. The first cycle runs
/// immediately; the loop exits once `shutdown` flips to `true` or its sender
/// is dropped.
pub fn spawn(
    ingestor: Arc<Ingestor>,
    interval: Duration,
    shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(run(ingestor, interval, shutdown))
}

/// Ingest on a fixed interval. A cycle in flight always completes; shutdown is
/// observed between cycles.
pub async fn run(ingestor: Arc<Ingestor>, interval: Duration, mut shutdown: watch::Receiver<bool>) {
    tracing::info!("Ingestion worker started (interval {}s)", interval.as_secs());

    loop {
        if *shutdown.borrow() {
            break;
        }

        if let Err(e) = ingestor.ingest().await {
            tracing::error!("Ingest cycle failed: {e}");
        }

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            changed = shutdown.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }

    tracing::info!("Ingestion worker stopped");
}
