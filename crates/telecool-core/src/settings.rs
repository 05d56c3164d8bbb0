//! Settings domain types and validation.
//!
//! Pure domain types with no infrastructure dependencies.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::transfer::RateCap;

/// Default number of transfers moving bytes at the same time.
pub const DEFAULT_MAX_CONCURRENT_TRANSFERS: u32 = 3;

/// Default progress estimator period in milliseconds.
pub const DEFAULT_ESTIMATOR_TICK_MS: u64 = 1000;

/// User-facing transfer settings.
///
/// All fields are optional to support partial updates and graceful defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Default download directory token (may start with `~`).
    pub default_destination: Option<String>,

    /// Per-transfer byte-rate cap; `None` means unlimited.
    pub rate_cap_bytes_per_second: Option<u64>,

    /// Maximum concurrent transfers (1-16).
    pub max_concurrent_transfers: Option<u32>,

    /// Progress estimator tick in milliseconds (100-10,000).
    pub estimator_tick_ms: Option<u64>,
}

impl Settings {
    /// Create settings with sensible defaults.
    #[must_use]
    pub const fn with_defaults() -> Self {
        Self {
            default_destination: None,
            rate_cap_bytes_per_second: None,
            max_concurrent_transfers: Some(DEFAULT_MAX_CONCURRENT_TRANSFERS),
            estimator_tick_ms: Some(DEFAULT_ESTIMATOR_TICK_MS),
        }
    }

    /// Get the effective rate cap.
    #[must_use]
    pub fn rate_cap(&self) -> RateCap {
        RateCap::from(self.rate_cap_bytes_per_second)
    }

    /// Get the effective concurrency limit (with default fallback).
    #[must_use]
    pub const fn effective_max_concurrent(&self) -> u32 {
        match self.max_concurrent_transfers {
            Some(max) => max,
            None => DEFAULT_MAX_CONCURRENT_TRANSFERS,
        }
    }

    /// Get the effective estimator tick (with default fallback).
    #[must_use]
    pub const fn effective_tick_interval(&self) -> Duration {
        match self.estimator_tick_ms {
            Some(ms) => Duration::from_millis(ms),
            None => Duration::from_millis(DEFAULT_ESTIMATOR_TICK_MS),
        }
    }

    /// Merge an update into these settings, only touching fields that are Some.
    pub fn merge(&mut self, other: &SettingsUpdate) {
        if let Some(ref dest) = other.default_destination {
            self.default_destination.clone_from(dest);
        }
        if let Some(cap) = other.rate_cap_bytes_per_second {
            self.rate_cap_bytes_per_second = cap;
        }
        if let Some(max) = other.max_concurrent_transfers {
            self.max_concurrent_transfers = max;
        }
        if let Some(tick) = other.estimator_tick_ms {
            self.estimator_tick_ms = tick;
        }
    }
}

/// Partial settings update.
///
/// Each field is `Option<Option<T>>`:
/// - `None` = don't change this field
/// - `Some(None)` = set field to None/null
/// - `Some(Some(value))` = set field to value
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsUpdate {
    pub default_destination: Option<Option<String>>,
    pub rate_cap_bytes_per_second: Option<Option<u64>>,
    pub max_concurrent_transfers: Option<Option<u32>>,
    pub estimator_tick_ms: Option<Option<u64>>,
}

/// Settings validation error.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("Download destination cannot be empty")]
    EmptyDestination,

    #[error("Rate cap must be greater than zero (leave unset for unlimited)")]
    ZeroRateCap,

    #[error("Max concurrent transfers must be between 1 and 16, got {0}")]
    InvalidConcurrency(u32),

    #[error("Estimator tick must be between 100 and 10,000 ms, got {0}")]
    InvalidTick(u64),
}

/// Validate settings values.
pub fn validate_settings(settings: &Settings) -> Result<(), SettingsError> {
    if settings
        .default_destination
        .as_ref()
        .is_some_and(|p| p.trim().is_empty())
    {
        return Err(SettingsError::EmptyDestination);
    }

    if settings.rate_cap_bytes_per_second == Some(0) {
        return Err(SettingsError::ZeroRateCap);
    }

    if let Some(max) = settings.max_concurrent_transfers {
        if !(1..=16).contains(&max) {
            return Err(SettingsError::InvalidConcurrency(max));
        }
    }

    if let Some(tick) = settings.estimator_tick_ms {
        if !(100..=10_000).contains(&tick) {
            return Err(SettingsError::InvalidTick(tick));
        }
    }

    Ok(())
}
