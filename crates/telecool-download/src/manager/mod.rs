//! Transfer manager.
//!
//! Caller-facing facade over the registry, coordinator and estimator.
//!
//! # Architecture
//!
//! - `TaskRegistry` behind a `RwLock` is the single source of task state
//! - One spawned coordinator run per task, bounded by a semaphore
//! - One long-lived estimator task, started on first enqueue
//! - Settings and the completed list are persisted after every change

mod outcomes;

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock, Semaphore};
use tokio_util::sync::CancellationToken;

use telecool_core::{
    DestinationResolver, DirectoryCreationStrategy, MediaSourcePort, PersistedState, RateCap,
    Settings, TaskId, TransferError, TransferEvent, TransferEventEmitterPort, TransferManagerConfig,
    TransferManagerPort, TransferRequest, TransferStateRepositoryPort, TransferStatus,
    TransferTask, ensure_directory, normalize_user_path, sanitize_file_name,
};

use crate::coordinator::{CompletedTransfer, CoordinatorDeps, TransferCoordinator, TransferJob};
use crate::estimator::ProgressEstimator;
use crate::registry::TaskRegistry;
use crate::throttle::RateCapControl;

use outcomes::{OutcomeBoard, Waited};

/// Dependencies for building a transfer manager.
pub struct TransferManagerDeps<S, R, E>
where
    S: MediaSourcePort + 'static,
    R: TransferStateRepositoryPort + 'static,
    E: TransferEventEmitterPort + 'static,
{
    /// Remote media backend.
    pub source: Arc<S>,
    /// Persistence for settings and the completed list.
    pub state_repo: Arc<R>,
    /// Event sink.
    pub emitter: Arc<E>,
    /// Initial configuration.
    pub config: TransferManagerConfig,
}

/// Build a transfer manager from its dependencies.
///
/// Returns an implementation of `TransferManagerPort` that can be stored as
/// `Arc<dyn TransferManagerPort>`. Call [`TransferManagerImpl::restore`]
/// before first use to load persisted history.
pub fn build_transfer_manager<S, R, E>(deps: TransferManagerDeps<S, R, E>) -> TransferManagerImpl
where
    S: MediaSourcePort + 'static,
    R: TransferStateRepositoryPort + 'static,
    E: TransferEventEmitterPort + 'static,
{
    TransferManagerImpl::new(deps.source, deps.state_repo, deps.emitter, deps.config)
}

/// Concrete transfer manager.
pub struct TransferManagerImpl {
    registry: Arc<RwLock<TaskRegistry>>,
    coordinator: TransferCoordinator,
    state_repo: Arc<dyn TransferStateRepositoryPort>,
    emitter: Arc<dyn TransferEventEmitterPort>,
    rate_cap: RateCapControl,
    resolver: RwLock<DestinationResolver>,
    /// What gets persisted; runtime overrides in the config are not written back.
    settings: Mutex<Settings>,
    /// Held across snapshot and save so a stale snapshot never lands last.
    save_guard: Mutex<()>,
    permits: Semaphore,
    outcomes: OutcomeBoard,
    tick_interval: Duration,
    estimator_seed: Option<u64>,
    /// Whether the estimator has been started (never reset).
    estimator_started: AtomicBool,
    estimator_cancel: CancellationToken,
}

impl TransferManagerImpl {
    fn new<S, R, E>(
        source: Arc<S>,
        state_repo: Arc<R>,
        emitter: Arc<E>,
        config: TransferManagerConfig,
    ) -> Self
    where
        S: MediaSourcePort + 'static,
        R: TransferStateRepositoryPort + 'static,
        E: TransferEventEmitterPort + 'static,
    {
        let registry = Arc::new(RwLock::new(TaskRegistry::new()));
        let rate_cap = RateCapControl::new(config.rate_cap);
        let emitter: Arc<dyn TransferEventEmitterPort> = emitter;

        let coordinator = TransferCoordinator::new(
            Arc::clone(&registry),
            CoordinatorDeps {
                source,
                rate_cap: rate_cap.clone(),
                emitter: Arc::clone(&emitter),
            },
        );

        let settings = Settings {
            default_destination: config.default_destination.clone(),
            rate_cap_bytes_per_second: config.rate_cap.bytes_per_second(),
            max_concurrent_transfers: Some(config.max_concurrent),
            estimator_tick_ms: u64::try_from(config.tick_interval.as_millis()).ok(),
        };

        Self {
            registry,
            coordinator,
            state_repo,
            emitter,
            rate_cap,
            resolver: RwLock::new(DestinationResolver::new(config.default_destination)),
            settings: Mutex::new(settings),
            save_guard: Mutex::new(()),
            permits: Semaphore::new(config.max_concurrent.max(1) as usize),
            outcomes: OutcomeBoard::new(),
            tick_interval: config.tick_interval,
            estimator_seed: None,
            estimator_started: AtomicBool::new(false),
            estimator_cancel: CancellationToken::new(),
        }
    }

    /// Seed the progress estimator's RNG.
    #[must_use]
    pub fn with_estimator_seed(mut self, seed: u64) -> Self {
        self.estimator_seed = Some(seed);
        self
    }

    /// Load persisted state: seeds the completed list and adopts the stored
    /// settings as the baseline for future saves.
    ///
    /// Returns how many completed tasks were restored.
    pub async fn restore(&self) -> Result<usize, TransferError> {
        let state = self.state_repo.load().await?;
        let restored = self.registry.write().await.restore_completed(state.completed);

        let mut settings = self.settings.lock().await;
        let configured = settings.default_destination.take();
        *settings = state.settings;
        if settings.default_destination.is_none() {
            settings.default_destination = configured;
        }

        tracing::info!(restored, "Restored transfer history");
        Ok(restored)
    }

    /// Stop the progress estimator. In-flight transfers keep running.
    pub fn shutdown(&self) {
        self.estimator_cancel.cancel();
    }

    /// Snapshot of one task from either list.
    pub async fn task(&self, id: &TaskId) -> Option<TransferTask> {
        self.registry.read().await.get(id).cloned()
    }

    /// Ensure the estimator is started.
    ///
    /// Idempotent: only the first call spawns it.
    fn ensure_estimator(&self) {
        if self
            .estimator_started
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            let mut estimator = ProgressEstimator::new(self.rate_cap.clone(), self.tick_interval);
            if let Some(seed) = self.estimator_seed {
                estimator = estimator.with_seed(seed);
            }
            tokio::spawn(estimator.run(
                Arc::clone(&self.registry),
                Arc::clone(&self.emitter),
                self.estimator_cancel.clone(),
            ));
            tracing::debug!(
                interval_ms = self.tick_interval.as_millis(),
                "Progress estimator started"
            );
        }
    }

    /// Build the task for a request, with its destination made unique.
    async fn admit(&self, request: TransferRequest) -> Result<TransferTask, TransferError> {
        let directory = self
            .resolver
            .read()
            .await
            .resolve(request.destination.as_deref())?
            .path;
        prepare_directory(directory.clone()).await?;

        let file_name = request
            .display_name
            .as_deref()
            .and_then(sanitize_file_name)
            .unwrap_or_else(|| request.source.fallback_file_name());

        let task = TransferTask::new(
            file_name.clone(),
            request.size_hint.unwrap_or(0),
            request.source,
            directory.join(&file_name),
        );

        // Open the outcome slot first so `wait_for` never sees a tracked task without one.
        self.outcomes.open(task.id).await;
        let created = self.registry.write().await.create_unique(task.clone());
        if created.is_err() {
            self.outcomes.close(&task.id).await;
        }
        created
    }

    async fn run_task(&self, job: TransferJob) {
        let id = job.id;
        let Ok(_permit) = self.permits.acquire().await else {
            self.registry.write().await.release_destination(&id);
            return;
        };

        let result = self.coordinator.run(job).await;
        if self.registry.write().await.release_destination(&id) {
            tracing::debug!(id = %id, "Destination released after removal");
        }
        let outcome = match result {
            Ok(completed) => self.handle_success(completed).await,
            Err(e) => Err(e),
        };

        if !self.outcomes.publish(&id, outcome).await {
            tracing::debug!(id = %id, "Outcome dropped, task was removed");
        }
    }

    async fn handle_success(
        &self,
        completed: CompletedTransfer,
    ) -> Result<TransferTask, TransferError> {
        if let Err(e) = self.persist().await {
            tracing::warn!(id = %completed.id, error = %e, "Failed to persist completed transfer");
        }

        let snapshot = self.registry.read().await.get(&completed.id).cloned();
        snapshot.ok_or_else(|| TransferError::task_not_found(completed.id))
    }

    /// Save settings and the completed list.
    async fn persist(&self) -> Result<(), TransferError> {
        let _guard = self.save_guard.lock().await;
        let state = PersistedState {
            settings: self.settings.lock().await.clone(),
            completed: self.registry.read().await.list_completed(),
        };
        self.state_repo.save(&state).await?;
        Ok(())
    }

    fn emit(&self, event: TransferEvent) {
        self.emitter.emit(event);
    }
}

impl Drop for TransferManagerImpl {
    fn drop(&mut self) {
        self.estimator_cancel.cancel();
    }
}

/// Create and check a destination directory off the async runtime.
async fn prepare_directory(path: PathBuf) -> Result<(), TransferError> {
    tokio::task::spawn_blocking(move || {
        ensure_directory(&path, DirectoryCreationStrategy::AutoCreate)
    })
    .await
    .map_err(|e| TransferError::other(format!("directory preparation task failed: {e}")))??;
    Ok(())
}

// =============================================================================
// TransferManagerPort implementation
// =============================================================================

#[async_trait]
impl TransferManagerPort for TransferManagerImpl {
    async fn enqueue(self: Arc<Self>, request: TransferRequest) -> Result<TaskId, TransferError> {
        self.ensure_estimator();

        let task = self.admit(request).await?;

        tracing::info!(
            target: "telecool.transfer",
            id = %task.id,
            name = %task.display_name,
            destination = %task.destination_path.display(),
            "Transfer queued"
        );
        self.emit(TransferEvent::TaskQueued {
            id: task.id,
            display_name: task.display_name.clone(),
            destination: task.destination_path.clone(),
            total_bytes: task.total_bytes,
        });

        let job = TransferJob {
            id: task.id,
            source: task.source_ref,
            destination: task.destination_path,
        };
        let manager = Arc::clone(&self);
        tokio::spawn(async move {
            manager.run_task(job).await;
        });

        Ok(task.id)
    }

    async fn list_active(&self) -> Vec<TransferTask> {
        self.registry.read().await.list_active()
    }

    async fn list_completed(&self) -> Vec<TransferTask> {
        self.registry.read().await.list_completed()
    }

    async fn remove(&self, id: &TaskId) -> Result<(), TransferError> {
        let removed = self.registry.write().await.remove(id)?;
        self.outcomes.close(id).await;

        tracing::info!(id = %id, status = %removed.status, "Task removed");
        self.emit(TransferEvent::TaskRemoved { id: *id });

        if removed.status == TransferStatus::Completed {
            self.persist().await?;
        }
        Ok(())
    }

    async fn set_rate_cap(&self, cap: RateCap) -> Result<(), TransferError> {
        if self.rate_cap.set(cap) {
            tracing::info!(cap = %cap, "Rate cap changed");
            self.emit(TransferEvent::RateCapChanged { cap });
        }
        self.settings.lock().await.rate_cap_bytes_per_second = cap.bytes_per_second();
        self.persist().await
    }

    async fn rate_cap(&self) -> RateCap {
        self.rate_cap.current()
    }

    async fn clear_completed(&self) -> Result<usize, TransferError> {
        let (ids, count) = {
            let mut registry = self.registry.write().await;
            let ids: Vec<TaskId> = registry.list_completed().iter().map(|t| t.id).collect();
            (ids, registry.clear_completed())
        };
        self.outcomes.close_all(&ids).await;

        tracing::info!(count, "Completed list cleared");
        self.emit(TransferEvent::CompletedCleared { count });
        self.persist().await?;
        Ok(count)
    }

    async fn pause(&self, id: &TaskId) -> Result<(), TransferError> {
        self.registry
            .write()
            .await
            .set_status(id, TransferStatus::Paused)?;
        tracing::debug!(id = %id, "Task paused");
        Ok(())
    }

    async fn resume(&self, id: &TaskId) -> Result<(), TransferError> {
        self.registry
            .write()
            .await
            .set_status(id, TransferStatus::Active)?;
        tracing::debug!(id = %id, "Task resumed");
        Ok(())
    }

    async fn set_default_destination(&self, token: &str) -> Result<PathBuf, TransferError> {
        let path = normalize_user_path(token)?;
        prepare_directory(path.clone()).await?;

        self.resolver
            .write()
            .await
            .set_configured(Some(token.to_string()));
        self.settings.lock().await.default_destination = Some(token.to_string());

        tracing::info!(path = %path.display(), "Default destination changed");
        self.persist().await?;
        Ok(path)
    }

    async fn default_destination(&self) -> Result<PathBuf, TransferError> {
        Ok(self.resolver.read().await.resolve(None)?.path)
    }

    async fn wait_for(&self, id: &TaskId) -> Result<TransferTask, TransferError> {
        match self.outcomes.wait(id).await {
            Waited::Finished(outcome) => outcome,
            Waited::Untracked => {
                let task = self.registry.read().await.get(id).cloned();
                match task {
                    Some(task) if task.status == TransferStatus::Completed => Ok(task),
                    Some(task) if task.status == TransferStatus::Failed => Err(TransferError::other(
                        task.error.unwrap_or_else(|| "transfer failed".to_string()),
                    )),
                    _ => Err(TransferError::task_not_found(id)),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::FsMediaSource;
    use crate::store::InMemoryStateRepository;
    use telecool_core::{NoopTransferEmitter, SourceRef};

    fn manager(
        root: &std::path::Path,
        repo: Arc<InMemoryStateRepository>,
    ) -> Arc<TransferManagerImpl> {
        Arc::new(
            build_transfer_manager(TransferManagerDeps {
                source: Arc::new(FsMediaSource::new(root)),
                state_repo: repo,
                emitter: Arc::new(NoopTransferEmitter::new()),
                config: TransferManagerConfig::default(),
            })
            .with_estimator_seed(1),
        )
    }

    fn write_media(root: &std::path::Path, chat: &str, message: i64, bytes: &[u8]) {
        let dir = root.join(chat);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(message.to_string()), bytes).unwrap();
    }

    #[tokio::test]
    async fn test_enqueue_and_wait_completes() {
        let library = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        write_media(library.path(), "chat", 5, b"payload");

        let repo = Arc::new(InMemoryStateRepository::new());
        let mgr = manager(library.path(), Arc::clone(&repo));
        let request = TransferRequest::new(SourceRef::new("chat", 5))
            .with_display_name("doc.txt")
            .with_destination(out.path().to_string_lossy());

        let id = Arc::clone(&mgr).enqueue(request).await.unwrap();
        let done = mgr.wait_for(&id).await.unwrap();

        assert_eq!(done.status, TransferStatus::Completed);
        assert_eq!(done.total_bytes, 7);
        assert_eq!(std::fs::read(out.path().join("doc.txt")).unwrap(), b"payload");
        assert!(mgr.list_active().await.is_empty());
        assert_eq!(repo.snapshot().await.completed.len(), 1);
    }

    #[tokio::test]
    async fn test_enqueue_creates_nested_destination() {
        let library = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let nested = out.path().join("chats/2024/march");
        write_media(library.path(), "chat", 9, b"abc");

        let mgr = manager(library.path(), Arc::new(InMemoryStateRepository::new()));
        let request = TransferRequest::new(SourceRef::new("chat", 9))
            .with_display_name("notes.txt")
            .with_destination(nested.to_string_lossy());

        let id = Arc::clone(&mgr).enqueue(request).await.unwrap();
        mgr.wait_for(&id).await.unwrap();
        assert!(nested.is_dir());
        assert_eq!(std::fs::read(nested.join("notes.txt")).unwrap(), b"abc");
    }

    #[tokio::test]
    async fn test_enqueue_into_file_destination_is_unwritable() {
        let library = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let plain = out.path().join("not-a-dir");
        std::fs::write(&plain, b"x").unwrap();

        let mgr = manager(library.path(), Arc::new(InMemoryStateRepository::new()));
        let request = TransferRequest::new(SourceRef::new("chat", 1))
            .with_destination(plain.to_string_lossy());

        let err = Arc::clone(&mgr).enqueue(request).await.unwrap_err();
        assert!(matches!(err, TransferError::DestinationUnwritable { .. }));
        assert!(mgr.list_active().await.is_empty());
    }

    /// Saves whose later calls finish first, so unordered writers would
    /// leave an older snapshot behind.
    #[derive(Default)]
    struct SlowSaveRepository {
        state: Mutex<PersistedState>,
        calls: std::sync::atomic::AtomicU64,
    }

    #[async_trait]
    impl TransferStateRepositoryPort for SlowSaveRepository {
        async fn load(&self) -> Result<PersistedState, telecool_core::RepositoryError> {
            Ok(self.state.lock().await.clone())
        }

        async fn save(&self, state: &PersistedState) -> Result<(), telecool_core::RepositoryError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            let delay = 40u64.saturating_sub(n * 5);
            tokio::time::sleep(Duration::from_millis(delay)).await;
            *self.state.lock().await = state.clone();
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_concurrent_completions_all_persisted() {
        let library = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        for message in 1..=8 {
            write_media(library.path(), "chat", message, b"data");
        }

        let repo = Arc::new(SlowSaveRepository::default());
        let mgr = Arc::new(
            build_transfer_manager(TransferManagerDeps {
                source: Arc::new(FsMediaSource::new(library.path())),
                state_repo: Arc::clone(&repo),
                emitter: Arc::new(NoopTransferEmitter::new()),
                config: TransferManagerConfig::default().with_max_concurrent(8),
            })
            .with_estimator_seed(1),
        );

        let mut ids = Vec::new();
        for message in 1..=8 {
            let request = TransferRequest::new(SourceRef::new("chat", message))
                .with_display_name(format!("part{message}.bin"))
                .with_destination(out.path().to_string_lossy());
            ids.push(Arc::clone(&mgr).enqueue(request).await.unwrap());
        }
        for id in &ids {
            mgr.wait_for(id).await.unwrap();
        }

        assert_eq!(repo.calls.load(Ordering::SeqCst), 8);
        assert_eq!(repo.state.lock().await.completed.len(), 8);
    }

    #[tokio::test]
    async fn test_missing_name_falls_back_to_message_id() {
        let library = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        write_media(library.path(), "chat", 77, b"x");

        let mgr = manager(library.path(), Arc::new(InMemoryStateRepository::new()));
        let request = TransferRequest::new(SourceRef::new("chat", 77))
            .with_display_name("../")
            .with_destination(out.path().to_string_lossy());

        let id = Arc::clone(&mgr).enqueue(request).await.unwrap();
        let done = mgr.wait_for(&id).await.unwrap();
        assert_eq!(done.display_name, "file_77");
        assert!(out.path().join("file_77").exists());
    }

    #[tokio::test]
    async fn test_relative_destination_rejected() {
        let library = tempfile::tempdir().unwrap();
        let mgr = manager(library.path(), Arc::new(InMemoryStateRepository::new()));
        let request =
            TransferRequest::new(SourceRef::new("chat", 1)).with_destination("relative/dir");

        let err = Arc::clone(&mgr).enqueue(request).await.unwrap_err();
        assert!(matches!(err, TransferError::PathInvalid { .. }));
        assert!(mgr.list_active().await.is_empty());
    }

    #[tokio::test]
    async fn test_set_rate_cap_persists() {
        let library = tempfile::tempdir().unwrap();
        let repo = Arc::new(InMemoryStateRepository::new());
        let mgr = manager(library.path(), Arc::clone(&repo));

        mgr.set_rate_cap(RateCap::STANDARD).await.unwrap();
        assert_eq!(mgr.rate_cap().await, RateCap::STANDARD);
        assert_eq!(
            repo.snapshot().await.settings.rate_cap_bytes_per_second,
            Some(2 * 1024 * 1024)
        );

        mgr.set_rate_cap(RateCap::Unlimited).await.unwrap();
        assert_eq!(repo.snapshot().await.settings.rate_cap_bytes_per_second, None);
    }

    #[tokio::test]
    async fn test_set_default_destination_creates_and_persists() {
        let library = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let target = out.path().join("media/inbox");
        let repo = Arc::new(InMemoryStateRepository::new());
        let mgr = manager(library.path(), Arc::clone(&repo));

        let path = mgr
            .set_default_destination(&target.to_string_lossy())
            .await
            .unwrap();
        assert_eq!(path, target);
        assert!(target.is_dir());
        assert_eq!(
            repo.snapshot().await.settings.default_destination.as_deref(),
            Some(target.to_string_lossy().as_ref())
        );
    }

    #[tokio::test]
    async fn test_restore_seeds_completed() {
        let library = tempfile::tempdir().unwrap();
        let mut state = PersistedState::default();
        state.completed.push(TransferTask::new(
            "old.bin",
            3,
            SourceRef::new("chat", 1),
            "/srv/old.bin",
        ));
        let repo = Arc::new(InMemoryStateRepository::with_state(state));
        let mgr = manager(library.path(), repo);

        assert_eq!(mgr.restore().await.unwrap(), 1);
        let completed = mgr.list_completed().await;
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].status, TransferStatus::Completed);

        assert_eq!(mgr.clear_completed().await.unwrap(), 1);
        assert!(mgr.list_completed().await.is_empty());
    }

    #[tokio::test]
    async fn test_remove_unknown_is_not_found() {
        let library = tempfile::tempdir().unwrap();
        let mgr = manager(library.path(), Arc::new(InMemoryStateRepository::new()));
        let err = mgr.remove(&TaskId::new()).await.unwrap_err();
        assert!(matches!(err, TransferError::TaskNotFound { .. }));
        assert!(matches!(
            mgr.wait_for(&TaskId::new()).await,
            Err(TransferError::TaskNotFound { .. })
        ));
    }
}
