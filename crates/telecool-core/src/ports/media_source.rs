//! Remote media source port.
//!
//! The remote backend is reached through two calls: resolve a message to a
//! fetchable media object, then open that object as a byte stream. How the
//! backend is reached (mirror directory, HTTP bridge, MTProto client) stays
//! behind this trait.

use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::Stream;
use thiserror::Error;

use crate::transfer::{MediaHandle, SourceRef, TransferError};

/// Stream of byte chunks produced by a media source.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, MediaSourceError>> + Send>>;

/// Errors raised by media source adapters.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MediaSourceError {
    /// The message does not exist.
    #[error("Message not found: {0}")]
    NotFound(String),

    /// The message exists but carries no downloadable media.
    #[error("No media in message: {0}")]
    NoMedia(String),

    /// Transport failure.
    #[error("Network error: {message}")]
    Network {
        message: String,
        status_code: Option<u16>,
    },

    /// The backend answered with an error of its own.
    #[error("Backend error: {0}")]
    Backend(String),

    /// Local I/O failure inside the adapter.
    #[error("I/O error: {0}")]
    Io(String),
}

impl MediaSourceError {
    /// Create a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
            status_code: None,
        }
    }

    /// Create a network error with HTTP status code.
    pub fn network_with_status(message: impl Into<String>, status_code: u16) -> Self {
        Self::Network {
            message: message.into(),
            status_code: Some(status_code),
        }
    }
}

impl From<MediaSourceError> for TransferError {
    fn from(err: MediaSourceError) -> Self {
        match err {
            MediaSourceError::NotFound(msg) => Self::source_not_found(msg),
            MediaSourceError::NoMedia(msg) => {
                Self::source_not_found(format!("message has no media: {msg}"))
            }
            MediaSourceError::Network {
                message,
                status_code,
            } => Self::Network {
                message,
                status_code,
            },
            MediaSourceError::Backend(msg) | MediaSourceError::Io(msg) => Self::backend(msg),
        }
    }
}

/// Port for the remote media backend.
///
/// # Usage
///
/// ```ignore
/// let handle = source.resolve(&SourceRef::new("-100123", 42)).await?;
/// let mut stream = source.open(&handle).await?;
/// while let Some(chunk) = stream.next().await { /* write chunk */ }
/// ```
#[async_trait]
pub trait MediaSourcePort: Send + Sync {
    /// Locate the media object referenced by a message.
    ///
    /// Must not create any local file.
    async fn resolve(&self, source: &SourceRef) -> Result<MediaHandle, MediaSourceError>;

    /// Open the media object's bytes as a stream of chunks.
    async fn open(&self, handle: &MediaHandle) -> Result<ByteStream, MediaSourceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_maps_to_source_not_found() {
        let err: TransferError = MediaSourceError::NotFound("c/1".into()).into();
        assert!(matches!(err, TransferError::SourceNotFound { .. }));

        let err: TransferError = MediaSourceError::NoMedia("c/2".into()).into();
        assert!(matches!(
            err,
            TransferError::SourceNotFound { ref message } if message.contains("no media")
        ));
    }

    #[test]
    fn test_network_keeps_status() {
        let err: TransferError = MediaSourceError::network_with_status("bad gateway", 502).into();
        assert_eq!(err, TransferError::network_with_status("bad gateway", 502));
    }

    #[test]
    fn test_backend_and_io_map_to_backend() {
        let err: TransferError = MediaSourceError::Io("disk".into()).into();
        assert_eq!(err, TransferError::backend("disk"));
    }
}
