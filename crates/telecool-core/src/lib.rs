//! Core domain types and port definitions for telecool.
//!
//! Everything here is pure data, validation and trait definitions. The
//! transfer engine lives in `telecool-download`; the terminal front end in
//! `telecool-cli`.

#![deny(unused_crate_dependencies)]

pub mod paths;
pub mod ports;
pub mod settings;
pub mod transfer;
pub mod utils;

pub use ports::{
    ByteStream, MediaSourceError, MediaSourcePort, NoopTransferEmitter, PersistedState,
    RepositoryError, TransferEventEmitterPort, TransferManagerConfig, TransferManagerPort,
    TransferRequest, TransferStateRepositoryPort,
};
pub use settings::{
    DEFAULT_ESTIMATOR_TICK_MS, DEFAULT_MAX_CONCURRENT_TRANSFERS, Settings, SettingsError,
    SettingsUpdate, validate_settings,
};
pub use transfer::{
    COMPLETE_FRACTION, ESTIMATE_CEILING, MAX_ESTIMATED_FRACTION, MediaHandle, RateCap,
    RateCapParseError, SourceRef, TaskId, TransferError, TransferEvent, TransferResult,
    TransferStatus, TransferTask,
};
pub use utils::{format_bytes, format_rate};

pub use paths::{
    DestinationResolution, DestinationResolver, DestinationSource, DirectoryCreationStrategy,
    PathError, data_root, default_destination_dir, ensure_directory, normalize_user_path,
    sanitize_file_name, state_file_path, verify_writable,
};
