//! Transfer coordinator.
//!
//! Runs one transfer end to end: resolve the source, create the destination
//! file, stream throttled bytes into it and verify the result. The outcome
//! is written to the registry as the authoritative `complete`/`fail`.
//!
//! # Design Principles
//!
//! - Receives a `TransferJob` (value type) and `CoordinatorDeps` (cloned Arcs)
//! - Source resolution happens before any file is created
//! - Every failure ends in `registry.fail` and is returned to the caller
//! - No retries; partial files are left in place

mod progress;

use std::path::{Path, PathBuf};
use std::pin::pin;
use std::sync::Arc;

use futures_util::StreamExt;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

use telecool_core::{
    ByteStream, MediaSourcePort, SourceRef, TaskId, TransferError, TransferEvent,
    TransferEventEmitterPort, TransferStatus,
};

use crate::registry::{TaskRegistry, TerminalOutcome};
use crate::throttle::{RateCapControl, throttled};

pub use progress::{EVENT_INTERVAL, MeasuredProgress, ProgressTracker};

/// Dependencies shared by every coordinator run.
#[derive(Clone)]
pub struct CoordinatorDeps {
    /// Remote media backend.
    pub source: Arc<dyn MediaSourcePort>,
    /// Live rate cap; each run takes its own throttle from it.
    pub rate_cap: RateCapControl,
    /// Event sink.
    pub emitter: Arc<dyn TransferEventEmitterPort>,
}

/// A transfer to execute.
#[derive(Debug, Clone)]
pub struct TransferJob {
    pub id: TaskId,
    pub source: SourceRef,
    /// Final file path, already made unique by the registry.
    pub destination: PathBuf,
}

/// Result of a successful transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedTransfer {
    pub id: TaskId,
    pub destination: PathBuf,
    /// Size of the file on disk.
    pub bytes: u64,
}

/// Executes transfers against a shared registry.
#[derive(Clone)]
pub struct TransferCoordinator {
    registry: Arc<RwLock<TaskRegistry>>,
    deps: CoordinatorDeps,
}

impl TransferCoordinator {
    pub const fn new(registry: Arc<RwLock<TaskRegistry>>, deps: CoordinatorDeps) -> Self {
        Self { registry, deps }
    }

    /// Run a job to completion and record the outcome.
    pub async fn run(&self, job: TransferJob) -> Result<CompletedTransfer, TransferError> {
        self.activate(&job.id).await?;

        tracing::info!(
            target: "telecool.transfer",
            id = %job.id,
            source = %job.source,
            destination = %job.destination.display(),
            "Transfer started"
        );
        self.deps.emitter.emit(TransferEvent::TaskStarted { id: job.id });

        match self.execute(&job).await {
            Ok(completed) => {
                self.handle_success(&completed).await;
                Ok(completed)
            }
            Err(e) => {
                self.handle_failure(&job, &e).await;
                Err(e)
            }
        }
    }

    /// Mark the task `Active`.
    ///
    /// A task removed before it started is reported as not found and left
    /// alone. Other rejections (e.g. already paused) do not stop the run.
    async fn activate(&self, id: &TaskId) -> Result<(), TransferError> {
        let mut registry = self.registry.write().await;
        if !registry.contains(id) {
            return Err(TransferError::task_not_found(id));
        }
        let status = registry.get(id).map(|t| t.status);
        if status == Some(TransferStatus::Pending) {
            if let Err(e) = registry.set_status(id, TransferStatus::Active) {
                tracing::debug!(id = %id, error = %e, "Activation rejected");
            }
        }
        Ok(())
    }

    async fn execute(&self, job: &TransferJob) -> Result<CompletedTransfer, TransferError> {
        // Step 1: resolve before touching the filesystem
        let handle = self.deps.source.resolve(&job.source).await?;
        if let Some(size) = handle.size {
            self.registry.write().await.set_total_bytes(&job.id, size);
        }

        // Step 2: destination directory and file
        if let Some(parent) = job.destination.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| TransferError::from_io_error(parent, &e))?;
        }

        let stream = self.deps.source.open(&handle).await?;
        let mut file = File::create(&job.destination)
            .await
            .map_err(|e| TransferError::from_io_error(&job.destination, &e))?;

        // Step 3: throttled copy; flush even when the copy fails so the
        // partial file reflects every byte received.
        let mut tracker = ProgressTracker::new(handle.size);
        let copied = self.copy(job, stream, &mut file, &mut tracker).await;
        let flushed = file
            .flush()
            .await
            .map_err(|e| TransferError::from_io_error(&job.destination, &e));
        drop(file);
        copied?;
        flushed?;

        // Step 4: verify
        let bytes = verify(&job.destination, handle.size, tracker.written()).await?;

        Ok(CompletedTransfer {
            id: job.id,
            destination: job.destination.clone(),
            bytes,
        })
    }

    async fn copy(
        &self,
        job: &TransferJob,
        stream: ByteStream,
        file: &mut File,
        tracker: &mut ProgressTracker,
    ) -> Result<(), TransferError> {
        let mut stream = pin!(throttled(stream, self.deps.rate_cap.throttle()));

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(TransferError::from)?;
            file.write_all(&chunk)
                .await
                .map_err(|e| TransferError::from_io_error(&job.destination, &e))?;

            if let Some(sample) = tracker.record(chunk.len()) {
                self.deps.emitter.emit(TransferEvent::TaskProgress {
                    id: job.id,
                    fraction: sample.fraction,
                    rate_bytes_per_second: sample.rate_bytes_per_second,
                });
            }
        }
        Ok(())
    }

    async fn handle_success(&self, completed: &CompletedTransfer) {
        let outcome = {
            let mut registry = self.registry.write().await;
            registry.set_total_bytes(&completed.id, completed.bytes);
            registry.complete(&completed.id)
        };

        match outcome {
            Ok(TerminalOutcome::Applied) => {
                tracing::info!(
                    target: "telecool.transfer",
                    id = %completed.id,
                    bytes = completed.bytes,
                    destination = %completed.destination.display(),
                    "Transfer completed"
                );
                self.deps.emitter.emit(TransferEvent::TaskCompleted {
                    id: completed.id,
                    destination: completed.destination.clone(),
                    bytes: completed.bytes,
                });
            }
            Ok(TerminalOutcome::AlreadyApplied) => {
                tracing::debug!(id = %completed.id, "Completion already recorded");
            }
            Err(e) => {
                tracing::debug!(id = %completed.id, error = %e, "Completion not recorded");
            }
        }
    }

    async fn handle_failure(&self, job: &TransferJob, error: &TransferError) {
        tracing::warn!(
            target: "telecool.transfer",
            id = %job.id,
            error = %error,
            "Transfer failed"
        );

        let outcome = self
            .registry
            .write()
            .await
            .fail(&job.id, &error.to_string());

        match outcome {
            Ok(TerminalOutcome::Applied) => {
                self.deps.emitter.emit(TransferEvent::TaskFailed {
                    id: job.id,
                    error: error.user_message(),
                });
            }
            Ok(TerminalOutcome::AlreadyApplied) => {}
            Err(e) => {
                tracing::debug!(id = %job.id, error = %e, "Failure not recorded");
            }
        }
    }
}

/// Check the written file exists with nonzero size matching the source.
async fn verify(path: &Path, expected: Option<u64>, written: u64) -> Result<u64, TransferError> {
    let meta = tokio::fs::metadata(path)
        .await
        .map_err(|e| TransferError::verification_failed(path, e.to_string()))?;
    let on_disk = meta.len();

    if on_disk == 0 {
        return Err(TransferError::verification_failed(path, "file is empty"));
    }
    if on_disk != written {
        return Err(TransferError::verification_failed(
            path,
            format!("wrote {written} bytes but file holds {on_disk}"),
        ));
    }
    if let Some(expected) = expected {
        if expected != on_disk {
            return Err(TransferError::verification_failed(
                path,
                format!("expected {expected} bytes, got {on_disk}"),
            ));
        }
    }
    Ok(on_disk)
}
