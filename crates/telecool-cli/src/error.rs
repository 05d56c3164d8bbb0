//! CLI-specific error types and mappings.
//!
//! Maps engine errors to exit codes and user-facing messages.

use telecool_core::{MediaSourceError, PathError, RepositoryError, SettingsError, TransferError};
use thiserror::Error;

/// CLI-specific error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Anything without a more specific category.
    #[error("{0}")]
    Core(String),

    /// Argument or input validation error.
    #[error("Invalid arguments: {0}")]
    Arguments(String),

    /// The requested message or media does not exist.
    #[error("{0}")]
    NotFound(String),

    /// The remote backend could not be reached or refused the request.
    #[error("{0}")]
    Unavailable(String),

    /// A file or directory could not be created.
    #[error("{0}")]
    CantCreate(String),

    /// IO error while writing or verifying data.
    #[error("IO error: {0}")]
    Io(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl CliError {
    /// Map error to an exit code.
    ///
    /// - 1: General error
    /// - 2: Invalid arguments
    /// - 64-78: see sysexits.h
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Core(_) => 1,
            Self::Arguments(_) => 2,
            Self::NotFound(_) => 66,    // EX_NOINPUT
            Self::Unavailable(_) => 69, // EX_UNAVAILABLE
            Self::CantCreate(_) => 73,  // EX_CANTCREAT
            Self::Io(_) => 74,          // EX_IOERR
            Self::Config(_) => 78,      // EX_CONFIG
        }
    }
}

impl From<TransferError> for CliError {
    fn from(err: TransferError) -> Self {
        let message = err.user_message();
        match err {
            TransferError::SourceNotFound { .. } | TransferError::TaskNotFound { .. } => {
                Self::NotFound(message)
            }
            TransferError::Network { .. } | TransferError::Backend { .. } => {
                Self::Unavailable(message)
            }
            TransferError::DestinationUnwritable { .. } => Self::CantCreate(message),
            TransferError::PathInvalid { .. } => Self::Arguments(message),
            TransferError::VerificationFailed { .. } | TransferError::Persistence { .. } => {
                Self::Io(message)
            }
            TransferError::InvalidTransition { .. }
            | TransferError::DuplicateTask { .. }
            | TransferError::Other { .. } => Self::Core(message),
        }
    }
}

impl From<MediaSourceError> for CliError {
    fn from(err: MediaSourceError) -> Self {
        TransferError::from(err).into()
    }
}

impl From<PathError> for CliError {
    fn from(err: PathError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<SettingsError> for CliError {
    fn from(err: SettingsError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<RepositoryError> for CliError {
    fn from(err: RepositoryError) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Exit code for an error bubbled up to `main`.
pub fn exit_code_for(err: &anyhow::Error) -> u8 {
    err.downcast_ref::<CliError>().map_or(1, CliError::exit_code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_errors_map_to_sysexits() {
        let cases = [
            (TransferError::source_not_found("chat/1"), 66),
            (TransferError::network_with_status("bad gateway", 502), 69),
            (TransferError::destination_unwritable("/ro", "denied"), 73),
            (TransferError::path_invalid("relative"), 2),
            (TransferError::persistence("disk full"), 74),
            (TransferError::other("boom"), 1),
        ];
        for (err, code) in cases {
            assert_eq!(CliError::from(err).exit_code(), code);
        }
    }

    #[test]
    fn test_message_is_user_facing() {
        let err = CliError::from(TransferError::source_not_found("chat/9"));
        assert!(err.to_string().contains("could not be found"));
        assert!(err.to_string().contains("chat/9"));
    }

    #[test]
    fn test_exit_code_for_anyhow() {
        let wrapped = anyhow::Error::new(CliError::Config("bad".into()));
        assert_eq!(exit_code_for(&wrapped), 78);
        assert_eq!(exit_code_for(&anyhow::anyhow!("plain")), 1);
    }
}
