//! Download destination resolution.
//!
//! Maps a directory token to an absolute directory and turns caller-supplied
//! file names into a single safe path component.

use std::env;
use std::path::PathBuf;

use super::error::PathError;
use super::platform::normalize_user_path;

/// Environment variable overriding the default download directory.
pub const DOWNLOAD_DIR_ENV: &str = "TELECOOL_DOWNLOAD_DIR";

/// Default download directory, relative to the home directory.
pub const DEFAULT_DESTINATION_RELATIVE: &str = "Downloads/TeleCool";

/// How a destination directory was derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestinationSource {
    /// Named by the request itself.
    Explicit,
    /// `TELECOOL_DOWNLOAD_DIR`.
    EnvVar,
    /// The persisted default destination setting.
    Configured,
    /// `~/Downloads/TeleCool`.
    Default,
}

/// Resolution result for a destination directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationResolution {
    /// Absolute directory path.
    pub path: PathBuf,
    /// How the path was determined.
    pub source: DestinationSource,
}

/// Return the default destination directory (`~/Downloads/TeleCool`).
pub fn default_destination_dir() -> Result<PathBuf, PathError> {
    let home = dirs::home_dir().ok_or(PathError::NoHomeDir)?;
    Ok(home.join(DEFAULT_DESTINATION_RELATIVE))
}

/// Resolves destination tokens against the configured default.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DestinationResolver {
    configured: Option<String>,
}

impl DestinationResolver {
    /// Create a resolver with an optional persisted default token.
    #[must_use]
    pub fn new(configured: Option<String>) -> Self {
        Self {
            configured: configured.filter(|c| !c.trim().is_empty()),
        }
    }

    /// The persisted default token, if any.
    #[must_use]
    pub fn configured(&self) -> Option<&str> {
        self.configured.as_deref()
    }

    /// Replace the persisted default token.
    pub fn set_configured(&mut self, token: Option<String>) {
        self.configured = token.filter(|c| !c.trim().is_empty());
    }

    /// Resolve a directory without touching the filesystem.
    ///
    /// Resolution order:
    /// 1. Explicit token from the request
    /// 2. `TELECOOL_DOWNLOAD_DIR` environment variable
    /// 3. Configured default
    /// 4. `~/Downloads/TeleCool`
    pub fn resolve(&self, explicit: Option<&str>) -> Result<DestinationResolution, PathError> {
        if let Some(token) = explicit {
            return Ok(DestinationResolution {
                path: normalize_user_path(token)?,
                source: DestinationSource::Explicit,
            });
        }

        if let Ok(env_path) = env::var(DOWNLOAD_DIR_ENV) {
            if !env_path.trim().is_empty() {
                return Ok(DestinationResolution {
                    path: normalize_user_path(&env_path)?,
                    source: DestinationSource::EnvVar,
                });
            }
        }

        if let Some(ref token) = self.configured {
            return Ok(DestinationResolution {
                path: normalize_user_path(token)?,
                source: DestinationSource::Configured,
            });
        }

        Ok(DestinationResolution {
            path: default_destination_dir()?,
            source: DestinationSource::Default,
        })
    }
}

/// Reduce a caller-supplied name to one safe file name component.
///
/// Directory parts are stripped, reserved characters are replaced with `_`.
/// Returns `None` when nothing usable remains.
#[must_use]
pub fn sanitize_file_name(raw: &str) -> Option<String> {
    let last = raw.rsplit(['/', '\\']).next().unwrap_or(raw);

    let cleaned: String = last
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '|' | '?' | '*' => '_',
            other => other,
        })
        .collect();
    let cleaned = cleaned.trim().trim_end_matches('.').trim();

    if cleaned.is_empty() || cleaned == "." || cleaned == ".." {
        None
    } else {
        Some(cleaned.to_string())
    }
}
