//! Port definitions (trait abstractions) for external systems.
//!
//! Ports define the interfaces the transfer engine expects from
//! infrastructure. They use only domain types.

pub mod event_emitter;
pub mod media_source;
pub mod transfer_manager;
pub mod transfer_state;

use thiserror::Error;

pub use event_emitter::{NoopTransferEmitter, TransferEventEmitterPort};
pub use media_source::{ByteStream, MediaSourceError, MediaSourcePort};
pub use transfer_manager::{TransferManagerConfig, TransferManagerPort, TransferRequest};
pub use transfer_state::{PersistedState, TransferStateRepositoryPort};

use crate::transfer::TransferError;

/// Domain-specific errors for repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Storage backend error (filesystem, permissions).
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<RepositoryError> for TransferError {
    fn from(err: RepositoryError) -> Self {
        Self::persistence(err.to_string())
    }
}
