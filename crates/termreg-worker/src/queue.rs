//! Asynchronous export task queue.
//!
//! Tasks carry only an id reference; the worker re-reads current state from
//! the store when the task runs. Delivery is at-least-once: a failed task is
//! retried with backoff up to the configured attempt limit, and export
//! itself is idempotent per version, so replays are harmless.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::sync::mpsc;

use termreg_engine::{
    export_version, now_epoch, versioning, ArchiveStore, RegistryError, RegistryStore,
};
use termreg_types::ResourceId;

use crate::config::WorkerConfig;

/// A unit of background work, dispatched by id reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    /// Export a released container version to the archive store.
    ExportVersion {
        /// The container version to export.
        version_id: ResourceId,
    },
}

/// Producer half of the task queue.
#[derive(Debug, Clone)]
pub struct TaskQueue {
    tx: mpsc::Sender<Task>,
}

impl TaskQueue {
    /// Creates a bounded queue, returning the producer and the receiver the
    /// worker loop consumes.
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<Task>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }

    /// Enqueues a task, waiting for capacity if the queue is full.
    ///
    /// Fails only when the worker has shut down.
    pub async fn enqueue(&self, task: Task) -> Result<(), mpsc::error::SendError<Task>> {
        self.tx.send(task).await
    }
}

/// Consumes tasks until every producer handle is dropped.
///
/// Each task is attempted up to `config.max_attempts` times with linear
/// backoff; a task that keeps failing is dropped with an error log rather
/// than poisoning the queue.
pub async fn run_worker(
    store: Arc<RwLock<RegistryStore>>,
    archive_store: Arc<dyn ArchiveStore + Send + Sync>,
    mut rx: mpsc::Receiver<Task>,
    config: WorkerConfig,
) {
    while let Some(task) = rx.recv().await {
        for attempt in 1..=config.max_attempts {
            match run_task(&store, archive_store.as_ref(), &config, task) {
                Ok(()) => break,
                Err(err) if attempt < config.max_attempts => {
                    tracing::warn!(?task, attempt, %err, "task failed, retrying");
                    tokio::time::sleep(Duration::from_millis(100 * u64::from(attempt))).await;
                }
                Err(err) => {
                    tracing::error!(?task, attempt, %err, "task failed, giving up");
                }
            }
        }
    }
    tracing::info!("task queue closed, worker stopping");
}

fn run_task(
    store: &RwLock<RegistryStore>,
    archive_store: &dyn ArchiveStore,
    config: &WorkerConfig,
    task: Task,
) -> Result<(), RegistryError> {
    match task {
        Task::ExportVersion { version_id } => {
            {
                let guard = store.read();
                let version = guard.get_version(version_id).ok_or(RegistryError::NotFound {
                    resource: "container version",
                    id: version_id,
                })?;
                // Only released versions are exportable; skipping avoids
                // pointless retries on a mis-enqueued HEAD.
                if !version.released {
                    tracing::warn!(version_id, "skipping export of unreleased version");
                    return Ok(());
                }
            }

            versioning::acquire_lease(
                &mut store.write(),
                version_id,
                &config.holder,
                config.lease_ttl_secs,
                now_epoch(),
            )?;

            let result = export_version(&store.read(), archive_store, version_id);

            // Lease release must happen on failure too; it never fails.
            versioning::release_lease(&mut store.write(), version_id, &config.holder);
            result.map(|_| ())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use termreg_engine::{
        create_container, create_version, persist_new_concept, release, LocalArchiveStore,
        NewContainer,
    };
    use termreg_types::{
        AccessLevel, ConceptDraft, ConceptName, ContainerFields, ContainerKind, OwnerKind,
    };

    fn seeded_store() -> (RegistryStore, ResourceId) {
        let mut store = RegistryStore::new();
        let owner = store
            .insert_owner("acme", OwnerKind::Organization, "Acme", "root")
            .unwrap();
        let source = create_container(
            &mut store,
            NewContainer {
                kind: ContainerKind::Source,
                mnemonic: "drugs".to_string(),
                owner_id: owner,
                fields: ContainerFields {
                    name: "Drugs".to_string(),
                    full_name: None,
                    description: None,
                    default_locale: "en".to_string(),
                    supported_locales: vec!["en".to_string()],
                    public_access: AccessLevel::View,
                    custom_validation_schema: None,
                },
            },
            "root",
        )
        .unwrap();
        persist_new_concept(
            &mut store,
            ConceptDraft {
                mnemonic: "C1".to_string(),
                parent_id: Some(source),
                created_by: Some("tester".to_string()),
                concept_class: "Diagnosis".to_string(),
                datatype: "None".to_string(),
                names: vec![ConceptName {
                    name: "Fever".to_string(),
                    locale: "en".to_string(),
                    name_type: Some(ConceptName::FULLY_SPECIFIED.to_string()),
                    locale_preferred: true,
                }],
                descriptions: vec![],
            },
            Default::default(),
        )
        .unwrap();
        let v1 = create_version(&mut store, source, "v1-0", None, "root").unwrap();
        release(&mut store, v1, "root").unwrap();
        (store, v1)
    }

    #[tokio::test]
    async fn test_export_task_publishes_archive_and_clears_lease() {
        let (store, v1) = seeded_store();
        let store = Arc::new(RwLock::new(store));
        let dir = tempfile::tempdir().unwrap();
        let archive_store: Arc<dyn ArchiveStore + Send + Sync> =
            Arc::new(LocalArchiveStore::new(dir.path()));

        let (queue, rx) = TaskQueue::new(8);
        queue.enqueue(Task::ExportVersion { version_id: v1 }).await.unwrap();
        drop(queue);

        run_worker(store.clone(), archive_store.clone(), rx, WorkerConfig::default()).await;

        let bytes = archive_store
            .get_archive("acme/drugs/v1-0/export.tar.gz")
            .unwrap();
        assert!(bytes.is_some());
        assert!(store.read().get_version(v1).unwrap().processing.is_none());
    }

    #[tokio::test]
    async fn test_unreleased_version_is_skipped_without_publishing() {
        let (store, v1) = seeded_store();
        let head_id = {
            let source = store.get_version(v1).unwrap().versioned_object_id;
            termreg_engine::get_head(&store, source).unwrap().id
        };
        let store = Arc::new(RwLock::new(store));
        let dir = tempfile::tempdir().unwrap();
        let archive_store: Arc<dyn ArchiveStore + Send + Sync> =
            Arc::new(LocalArchiveStore::new(dir.path()));

        let (queue, rx) = TaskQueue::new(8);
        queue
            .enqueue(Task::ExportVersion { version_id: head_id })
            .await
            .unwrap();
        drop(queue);

        run_worker(store.clone(), archive_store.clone(), rx, WorkerConfig::default()).await;

        // Mis-enqueued HEAD: no artifact, no retries, no lease left behind
        let path = termreg_engine::archive_path("acme", "drugs", "HEAD");
        assert!(archive_store.get_archive(&path).unwrap().is_none());
        assert!(store.read().get_version(head_id).unwrap().processing.is_none());
    }

    #[tokio::test]
    async fn test_missing_version_exhausts_retries_without_stalling() {
        let (store, _) = seeded_store();
        let store = Arc::new(RwLock::new(store));
        let dir = tempfile::tempdir().unwrap();
        let archive_store: Arc<dyn ArchiveStore + Send + Sync> =
            Arc::new(LocalArchiveStore::new(dir.path()));

        let (queue, rx) = TaskQueue::new(8);
        queue
            .enqueue(Task::ExportVersion { version_id: 999_999 })
            .await
            .unwrap();
        drop(queue);

        // Worker must terminate despite the permanently failing task
        run_worker(store, archive_store, rx, WorkerConfig::default()).await;
    }
}
