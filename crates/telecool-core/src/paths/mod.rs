//! Path utilities for telecool data and download directories.
//!
//! - Returns `PathBuf` and `PathError` for clear error handling
//! - No interactive/terminal I/O; adapters handle prompts separately

mod destination;
mod ensure;
mod error;
mod platform;

#[cfg(test)]
mod test_utils;

pub use error::PathError;

pub use platform::{DATA_DIR_ENV, STATE_FILE_NAME, data_root, normalize_user_path, state_file_path};

pub use destination::{
    DEFAULT_DESTINATION_RELATIVE, DOWNLOAD_DIR_ENV, DestinationResolution, DestinationResolver,
    DestinationSource, default_destination_dir, sanitize_file_name,
};

pub use ensure::{DirectoryCreationStrategy, ensure_directory, verify_writable};
