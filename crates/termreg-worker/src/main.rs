//! Export worker binary.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use termreg_engine::{
    now_epoch, recover_stale_leases, ArchiveStore, LocalArchiveStore, RegistryStore,
};
use termreg_worker::{queue, TaskQueue, WorkerConfig};

const QUEUE_CAPACITY: usize = 256;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = WorkerConfig::from_env();
    tracing::info!(?config, "starting export worker");

    let store = Arc::new(RwLock::new(RegistryStore::new()));

    // Clear leases left behind by an abnormal shutdown before taking work
    let cleared = recover_stale_leases(&mut store.write(), now_epoch());
    if cleared > 0 {
        tracing::warn!(cleared, "recovered stale processing leases at startup");
    }

    let archive_store: Arc<dyn ArchiveStore + Send + Sync> =
        Arc::new(LocalArchiveStore::new(config.export_dir.clone()));

    let (task_queue, rx) = TaskQueue::new(QUEUE_CAPACITY);
    let worker = tokio::spawn(queue::run_worker(
        store.clone(),
        archive_store,
        rx,
        config,
    ));

    tracing::info!("export worker ready");
    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown requested, draining queue");

    // Dropping the producer closes the queue; the worker drains and stops
    drop(task_queue);
    worker.await?;

    Ok(())
}
