//! Transfer engine for telecool.
//!
//! Moves media bytes from a remote source to local files under a live,
//! shared byte-rate cap while keeping a task registry with displayed
//! progress in sync.
//!
//! # Modules
//!
//! - `throttle` - per-transfer byte-rate throttling against a shared cap
//! - `registry` - in-memory task state machine
//! - `estimator` - periodic advisory progress
//! - `coordinator` - one authoritative transfer, end to end
//! - `manager` - caller-facing facade (`TransferManagerPort`)
//! - `source` - media source adapters (directory mirror, HTTP bridge)
//! - `store` - state repositories (JSON file, in-memory)
//! - `emitter` - event emitter adapters

// Re-export core types for convenience
pub use telecool_core::{
    MediaSourcePort, RateCap, SourceRef, TaskId, TransferError, TransferEvent,
    TransferEventEmitterPort, TransferManagerConfig, TransferManagerPort, TransferRequest,
    TransferStateRepositoryPort, TransferStatus, TransferTask,
};

pub mod coordinator;
pub mod emitter;
pub mod estimator;
pub mod registry;
pub mod source;
pub mod store;
pub mod throttle;

mod manager;

pub use coordinator::{CompletedTransfer, CoordinatorDeps, TransferCoordinator, TransferJob};
pub use emitter::{BroadcastTransferEmitter, TracingTransferEmitter};
pub use estimator::{EstimatedProgress, ProgressEstimator};
pub use manager::{TransferManagerDeps, TransferManagerImpl, build_transfer_manager};
pub use registry::{ProgressOutcome, TaskRegistry, TerminalOutcome};
pub use source::{FsMediaSource, HttpMediaSource};
pub use store::{InMemoryStateRepository, JsonStateRepository};
pub use throttle::{ByteRateThrottle, RateCapControl, throttled};
