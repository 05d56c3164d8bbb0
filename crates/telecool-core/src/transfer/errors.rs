//! Transfer error types.
//!
//! These errors are serializable and do not hold external error types like
//! `std::io::Error`. I/O failures are captured as kind and message strings.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for transfer operations.
#[derive(Clone, Debug, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum TransferError {
    /// The remote media object does not exist or carries no media.
    #[error("Source not found: {message}")]
    SourceNotFound {
        /// What could not be resolved.
        message: String,
    },

    /// Destination directory or file could not be created or written.
    #[error("Destination unwritable ({path}): {message}")]
    DestinationUnwritable {
        /// The offending path.
        path: String,
        /// Detailed error message.
        message: String,
    },

    /// A destination token could not be mapped to an absolute directory.
    #[error("Invalid path: {message}")]
    PathInvalid {
        /// Detailed error message.
        message: String,
    },

    /// A status change was rejected by the registry.
    #[error("Invalid transition for {id}: {reason}")]
    InvalidTransition {
        /// Task the change targeted.
        id: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A task with this ID is already tracked.
    #[error("Duplicate task: {id}")]
    DuplicateTask {
        /// The duplicated task ID.
        id: String,
    },

    /// No task with this ID is tracked.
    #[error("Task not found: {id}")]
    TaskNotFound {
        /// The missing task ID.
        id: String,
    },

    /// Network failure while talking to the remote backend.
    #[error("Network error: {message}")]
    Network {
        /// Detailed error message.
        message: String,
        /// HTTP status code if available.
        #[serde(skip_serializing_if = "Option::is_none")]
        status_code: Option<u16>,
    },

    /// The remote backend reported an error of its own.
    #[error("Backend error: {message}")]
    Backend {
        /// Detailed error message.
        message: String,
    },

    /// The written file failed the post-transfer check.
    #[error("Verification failed for {path}: {message}")]
    VerificationFailed {
        /// Destination file.
        path: String,
        /// What the check found.
        message: String,
    },

    /// Loading or saving persisted state failed.
    #[error("Persistence error: {message}")]
    Persistence {
        /// Detailed error message.
        message: String,
    },

    /// General/uncategorized error.
    #[error("{message}")]
    Other {
        /// Error message.
        message: String,
    },
}

impl TransferError {
    /// Create a source not found error.
    pub fn source_not_found(message: impl Into<String>) -> Self {
        Self::SourceNotFound {
            message: message.into(),
        }
    }

    /// Create a destination unwritable error.
    pub fn destination_unwritable(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DestinationUnwritable {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a destination unwritable error from a `std::io::Error`.
    pub fn from_io_error(path: &std::path::Path, err: &std::io::Error) -> Self {
        Self::DestinationUnwritable {
            path: path.display().to_string(),
            message: format!("{:?}: {err}", err.kind()),
        }
    }

    /// Create an invalid path error.
    pub fn path_invalid(message: impl Into<String>) -> Self {
        Self::PathInvalid {
            message: message.into(),
        }
    }

    /// Create an invalid transition error.
    pub fn invalid_transition(id: impl ToString, reason: impl Into<String>) -> Self {
        Self::InvalidTransition {
            id: id.to_string(),
            reason: reason.into(),
        }
    }

    /// Create a duplicate task error.
    pub fn duplicate_task(id: impl ToString) -> Self {
        Self::DuplicateTask { id: id.to_string() }
    }

    /// Create a task not found error.
    pub fn task_not_found(id: impl ToString) -> Self {
        Self::TaskNotFound { id: id.to_string() }
    }

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

    /// Create a backend error.
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }

    /// Create a verification failed error.
    pub fn verification_failed(path: &std::path::Path, message: impl Into<String>) -> Self {
        Self::VerificationFailed {
            path: path.display().to_string(),
            message: message.into(),
        }
    }

    /// Create a persistence error.
    pub fn persistence(message: impl Into<String>) -> Self {
        Self::Persistence {
            message: message.into(),
        }
    }

    /// Create a generic error.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// Check if re-issuing the same request could succeed.
    ///
    /// The engine never retries on its own; this only informs the caller.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Network { .. } | Self::Backend { .. } | Self::DestinationUnwritable { .. }
        )
    }

    /// Registry races that callers treat as no-ops.
    #[must_use]
    pub const fn is_race(&self) -> bool {
        matches!(self, Self::InvalidTransition { .. })
    }

    /// Convert to a user-friendly message.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::SourceNotFound { message } => {
                format!("The message or its media could not be found: {message}")
            }
            Self::DestinationUnwritable { path, .. } => {
                format!("Cannot write to '{path}'. Check the download folder and its permissions.")
            }
            Self::PathInvalid { message } => format!("Download folder is invalid: {message}"),
            Self::InvalidTransition { id, reason } => {
                format!("Transfer '{id}' cannot change state: {reason}")
            }
            Self::DuplicateTask { id } => format!("Transfer '{id}' is already tracked."),
            Self::TaskNotFound { id } => format!("Transfer '{id}' is not in the list."),
            Self::Network {
                message,
                status_code: Some(code),
            } => format!("Network error (HTTP {code}): {message}"),
            Self::Network { message, .. } => format!("Network error: {message}"),
            Self::Backend { message } => format!("The server rejected the request: {message}"),
            Self::VerificationFailed { path, .. } => {
                format!("'{path}' was not written correctly. Try downloading it again.")
            }
            Self::Persistence { message } => format!("Could not save settings: {message}"),
            Self::Other { message } => message.clone(),
        }
    }
}

/// Convenience result type for transfer operations.
pub type TransferResult<T> = Result<T, TransferError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_captures_kind() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = TransferError::from_io_error(std::path::Path::new("/srv/out"), &io_err);

        match err {
            TransferError::DestinationUnwritable { path, message } => {
                assert_eq!(path, "/srv/out");
                assert!(message.contains("PermissionDenied"));
                assert!(message.contains("denied"));
            }
            _ => panic!("Expected DestinationUnwritable variant"),
        }
    }

    #[test]
    fn test_error_serialization() {
        let err = TransferError::network_with_status("bad gateway", 502);
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("502"));

        let parsed: TransferError = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, err);
    }

    #[test]
    fn test_is_recoverable() {
        assert!(TransferError::network("reset").is_recoverable());
        assert!(TransferError::backend("flood wait").is_recoverable());
        assert!(!TransferError::source_not_found("gone").is_recoverable());
        assert!(!TransferError::path_invalid("empty").is_recoverable());
    }

    #[test]
    fn test_race_classification() {
        assert!(TransferError::invalid_transition("abc", "already failed").is_race());
        assert!(!TransferError::task_not_found("abc").is_race());
    }

    #[test]
    fn test_user_messages() {
        let err = TransferError::network_with_status("timeout", 504);
        assert!(err.user_message().contains("504"));

        let err = TransferError::destination_unwritable("/ro", "read-only");
        assert!(err.user_message().contains("/ro"));
    }
}
