//! Data root and user path normalization.

use std::env;
use std::path::PathBuf;

use super::error::PathError;

/// Environment variable overriding the data root.
pub const DATA_DIR_ENV: &str = "TELECOOL_DATA_DIR";

/// File name of the persisted state inside the data root.
pub const STATE_FILE_NAME: &str = "state.json";

/// Get the root directory for application data (settings, history).
///
/// Resolution order:
/// 1. `TELECOOL_DATA_DIR` environment variable
/// 2. System data directory (e.g. `~/.local/share/telecool`)
///
/// The directory is not created here; the state repository creates it on
/// first save.
pub fn data_root() -> Result<PathBuf, PathError> {
    if let Ok(path) = env::var(DATA_DIR_ENV) {
        if !path.trim().is_empty() {
            return normalize_user_path(&path);
        }
    }

    let data_dir = dirs::data_dir().ok_or(PathError::NoDataDir)?;
    Ok(data_dir.join("telecool"))
}

/// Path of the persisted state file.
pub fn state_file_path() -> Result<PathBuf, PathError> {
    Ok(data_root()?.join(STATE_FILE_NAME))
}

/// Normalize a user-provided path, expanding a leading `~`.
///
/// The result must be absolute; relative tokens are rejected rather than
/// resolved against the working directory.
pub fn normalize_user_path(raw: &str) -> Result<PathBuf, PathError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(PathError::EmptyPath);
    }

    let expanded = if trimmed == "~" {
        dirs::home_dir().ok_or(PathError::NoHomeDir)?
    } else if let Some(rest) = trimmed
        .strip_prefix("~/")
        .or_else(|| trimmed.strip_prefix("~\\"))
    {
        dirs::home_dir().ok_or(PathError::NoHomeDir)?.join(rest)
    } else {
        PathBuf::from(trimmed)
    };

    if expanded.is_absolute() {
        Ok(expanded)
    } else {
        Err(PathError::NotAbsolute(expanded))
    }
}
