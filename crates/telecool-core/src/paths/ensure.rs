//! Download directory checks.
//!
//! Transfers stream straight into the destination directory, so a directory
//! only counts as ready once a file can be created inside it.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use super::error::PathError;

/// Name prefix of the throwaway file created by [`verify_writable`].
const WRITE_CHECK_PREFIX: &str = ".telecool-write-check-";

/// What to do when a download directory is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DirectoryCreationStrategy {
    /// Create it along with any missing parents.
    #[default]
    AutoCreate,
    /// Report it as missing. Diagnostics use this to avoid side effects.
    Disallow,
}

/// Make sure `dir` is an existing directory that accepts new files.
pub fn ensure_directory(dir: &Path, strategy: DirectoryCreationStrategy) -> Result<(), PathError> {
    match fs::metadata(dir) {
        Ok(meta) if meta.is_dir() => {}
        Ok(_) => return Err(PathError::NotADirectory(dir.to_path_buf())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => match strategy {
            DirectoryCreationStrategy::AutoCreate => create_download_dir(dir)?,
            DirectoryCreationStrategy::Disallow => {
                return Err(PathError::DirectoryNotFound(dir.to_path_buf()));
            }
        },
        Err(e) => return Err(not_writable(dir, &e)),
    }

    verify_writable(dir)
}

fn create_download_dir(dir: &Path) -> Result<(), PathError> {
    fs::create_dir_all(dir).map_err(|e| PathError::CreateFailed {
        path: dir.to_path_buf(),
        reason: e.to_string(),
    })?;
    tracing::info!(path = %dir.display(), "Created download directory");
    Ok(())
}

/// Create, fill and drop a uniquely named hidden file inside `dir`.
///
/// Every call gets its own file, so checks racing on one directory do not
/// interfere with each other.
pub fn verify_writable(dir: &Path) -> Result<(), PathError> {
    let mut check = tempfile::Builder::new()
        .prefix(WRITE_CHECK_PREFIX)
        .tempfile_in(dir)
        .map_err(|e| not_writable(dir, &e))?;
    check
        .write_all(b"telecool")
        .map_err(|e| not_writable(dir, &e))?;
    check.close().map_err(|e| not_writable(dir, &e))
}

fn not_writable(dir: &Path, err: &io::Error) -> PathError {
    PathError::NotWritable {
        path: dir.to_path_buf(),
        reason: err.to_string(),
    }
}
