//! Path-related error types.

use std::path::PathBuf;

use thiserror::Error;

use crate::transfer::TransferError;

/// Errors that can occur during path resolution and directory operations.
#[derive(Debug, Error)]
pub enum PathError {
    /// Could not determine the user's home directory.
    #[error("Cannot determine home directory")]
    NoHomeDir,

    /// Could not determine the system data directory.
    #[error("Cannot determine system data directory")]
    NoDataDir,

    /// An empty path was provided.
    #[error("Path cannot be empty")]
    EmptyPath,

    /// The path did not resolve to an absolute path.
    #[error("{0} is not an absolute path")]
    NotAbsolute(PathBuf),

    /// A path was expected to be a directory but was not.
    #[error("{0} exists but is not a directory")]
    NotADirectory(PathBuf),

    /// A directory does not exist and creation was not allowed.
    #[error("Directory {0} does not exist")]
    DirectoryNotFound(PathBuf),

    /// Failed to create a directory.
    #[error("Failed to create directory {path}: {reason}")]
    CreateFailed { path: PathBuf, reason: String },

    /// A directory is not writable.
    #[error("Directory {path} is not writable: {reason}")]
    NotWritable { path: PathBuf, reason: String },
}

impl From<PathError> for TransferError {
    fn from(err: PathError) -> Self {
        match err {
            PathError::NotADirectory(ref path) | PathError::DirectoryNotFound(ref path) => {
                Self::destination_unwritable(path.display().to_string(), err.to_string())
            }
            PathError::CreateFailed { ref path, .. } | PathError::NotWritable { ref path, .. } => {
                Self::destination_unwritable(path.display().to_string(), err.to_string())
            }
            PathError::NoHomeDir
            | PathError::NoDataDir
            | PathError::EmptyPath
            | PathError::NotAbsolute(_) => Self::path_invalid(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_maps_into_transfer_error() {
        let err: TransferError = PathError::EmptyPath.into();
        assert!(matches!(err, TransferError::PathInvalid { .. }));

        let err: TransferError = PathError::NotWritable {
            path: PathBuf::from("/ro"),
            reason: "read-only file system".to_string(),
        }
        .into();
        assert!(matches!(
            err,
            TransferError::DestinationUnwritable { ref path, .. } if path == "/ro"
        ));
    }
}
