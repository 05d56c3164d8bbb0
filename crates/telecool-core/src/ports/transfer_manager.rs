//! Transfer manager port definition.
//!
//! The caller-facing interface of the transfer engine. Runtime details
//! (spawned tasks, cancellation tokens, locks) stay behind it.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::settings::{DEFAULT_ESTIMATOR_TICK_MS, DEFAULT_MAX_CONCURRENT_TRANSFERS, Settings};
use crate::transfer::{RateCap, SourceRef, TaskId, TransferError, TransferTask};

/// Request to start a new transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    /// Message carrying the media.
    pub source: SourceRef,
    /// File name to save as; falls back to `file_<message_id>`.
    pub display_name: Option<String>,
    /// Caller's size hint, replaced by the resolved size when known.
    pub size_hint: Option<u64>,
    /// Destination directory token overriding the default.
    pub destination: Option<String>,
}

impl TransferRequest {
    /// Create a request with only the source set.
    #[must_use]
    pub const fn new(source: SourceRef) -> Self {
        Self {
            source,
            display_name: None,
            size_hint: None,
            destination: None,
        }
    }

    /// Set the file name.
    #[must_use]
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Set the size hint.
    #[must_use]
    pub const fn with_size_hint(mut self, size: u64) -> Self {
        self.size_hint = Some(size);
        self
    }

    /// Set the destination directory token.
    #[must_use]
    pub fn with_destination(mut self, destination: impl Into<String>) -> Self {
        self.destination = Some(destination.into());
        self
    }
}

/// Configuration for creating a transfer manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferManagerConfig {
    /// Default destination token; `None` uses env var or `~/Downloads/TeleCool`.
    pub default_destination: Option<String>,
    /// Initial per-transfer rate cap.
    pub rate_cap: RateCap,
    /// Maximum transfers moving bytes at once.
    pub max_concurrent: u32,
    /// Progress estimator period.
    pub tick_interval: Duration,
}

impl Default for TransferManagerConfig {
    fn default() -> Self {
        Self {
            default_destination: None,
            rate_cap: RateCap::Unlimited,
            max_concurrent: DEFAULT_MAX_CONCURRENT_TRANSFERS,
            tick_interval: Duration::from_millis(DEFAULT_ESTIMATOR_TICK_MS),
        }
    }
}

impl TransferManagerConfig {
    /// Build a config from persisted settings.
    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            default_destination: settings.default_destination.clone(),
            rate_cap: settings.rate_cap(),
            max_concurrent: settings.effective_max_concurrent(),
            tick_interval: settings.effective_tick_interval(),
        }
    }

    /// Set the default destination token.
    #[must_use]
    pub fn with_default_destination(mut self, destination: impl Into<String>) -> Self {
        self.default_destination = Some(destination.into());
        self
    }

    /// Set the initial rate cap.
    #[must_use]
    pub const fn with_rate_cap(mut self, cap: RateCap) -> Self {
        self.rate_cap = cap;
        self
    }

    /// Set the maximum concurrent transfers.
    #[must_use]
    pub const fn with_max_concurrent(mut self, max: u32) -> Self {
        self.max_concurrent = max;
        self
    }

    /// Set the estimator tick interval.
    #[must_use]
    pub const fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }
}

/// Port for managing transfers.
///
/// # Usage
///
/// ```ignore
/// let manager: Arc<dyn TransferManagerPort> = /* ... */;
/// let id = manager.clone().enqueue(TransferRequest::new(SourceRef::new("chat", 7))).await?;
/// let finished = manager.wait_for(&id).await?;
/// ```
#[async_trait]
pub trait TransferManagerPort: Send + Sync {
    /// Create a `Pending` task and start its transfer in the background.
    ///
    /// The `self: Arc<Self>` receiver lets implementations spawn the
    /// coordinator with a handle to the manager.
    async fn enqueue(self: Arc<Self>, request: TransferRequest) -> Result<TaskId, TransferError>;

    /// Snapshot of tasks that are not completed (including failed and paused).
    async fn list_active(&self) -> Vec<TransferTask>;

    /// Snapshot of completed tasks, oldest first.
    async fn list_completed(&self) -> Vec<TransferTask>;

    /// Remove a task from whichever list holds it.
    ///
    /// An in-flight transfer keeps running; its eventual result is dropped.
    async fn remove(&self, id: &TaskId) -> Result<(), TransferError>;

    /// Change the shared cap; in-flight transfers pick it up on their next chunk.
    async fn set_rate_cap(&self, cap: RateCap) -> Result<(), TransferError>;

    /// Current shared cap.
    async fn rate_cap(&self) -> RateCap;

    /// Drop every completed task. Returns how many were dropped.
    async fn clear_completed(&self) -> Result<usize, TransferError>;

    /// Freeze the displayed progress of an active task.
    async fn pause(&self, id: &TaskId) -> Result<(), TransferError>;

    /// Unfreeze a paused task.
    async fn resume(&self, id: &TaskId) -> Result<(), TransferError>;

    /// Resolve, create and persist a new default destination directory.
    async fn set_default_destination(&self, token: &str) -> Result<PathBuf, TransferError>;

    /// Directory new transfers land in when the request names none.
    async fn default_destination(&self) -> Result<PathBuf, TransferError>;

    /// Wait for a task's authoritative outcome.
    ///
    /// Returns the completed task, or the error the transfer failed with.
    async fn wait_for(&self, id: &TaskId) -> Result<TransferTask, TransferError>;
}
