//! Byte-rate caps.

use std::fmt;
use std::num::NonZeroU64;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::utils::format::format_bytes;

const KIB: u64 = 1024;
const MIB: u64 = 1024 * KIB;
const GIB: u64 = 1024 * MIB;

/// Upper bound on bytes per second for a single transfer.
///
/// Serialized as an optional integer: `null` means unlimited.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Option<u64>", into = "Option<u64>")]
pub enum RateCap {
    /// No throttling at all.
    #[default]
    Unlimited,
    /// At most this many bytes per one-second window.
    BytesPerSecond(NonZeroU64),
}

impl RateCap {
    /// The "Standard" preset: 2 MiB/s.
    pub const STANDARD: Self = Self::BytesPerSecond(match NonZeroU64::new(2 * MIB) {
        Some(v) => v,
        None => unreachable!(),
    });

    /// The "Pro" preset: 10 MiB/s.
    pub const PRO: Self = Self::BytesPerSecond(match NonZeroU64::new(10 * MIB) {
        Some(v) => v,
        None => unreachable!(),
    });

    /// Build a cap from a raw byte count; zero means unlimited.
    #[must_use]
    pub const fn from_bytes_per_second(bytes: u64) -> Self {
        match NonZeroU64::new(bytes) {
            Some(v) => Self::BytesPerSecond(v),
            None => Self::Unlimited,
        }
    }

    /// Cap in bytes per second, or `None` when unlimited.
    #[must_use]
    pub const fn bytes_per_second(&self) -> Option<u64> {
        match self {
            Self::Unlimited => None,
            Self::BytesPerSecond(v) => Some(v.get()),
        }
    }

    #[must_use]
    pub const fn is_unlimited(&self) -> bool {
        matches!(self, Self::Unlimited)
    }

    /// Clamp a display rate to this cap.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn clamp_rate(&self, rate: f64) -> f64 {
        match self {
            Self::Unlimited => rate,
            Self::BytesPerSecond(cap) => rate.min(cap.get() as f64),
        }
    }
}

impl From<Option<u64>> for RateCap {
    fn from(value: Option<u64>) -> Self {
        value.map_or(Self::Unlimited, Self::from_bytes_per_second)
    }
}

impl From<RateCap> for Option<u64> {
    fn from(value: RateCap) -> Self {
        value.bytes_per_second()
    }
}

impl fmt::Display for RateCap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unlimited => f.write_str("unlimited"),
            Self::BytesPerSecond(v) => write!(f, "{}/s", format_bytes(v.get())),
        }
    }
}

/// Error returned when a rate cap string cannot be parsed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RateCapParseError {
    #[error("empty rate cap")]
    Empty,

    #[error("invalid rate cap '{0}': expected a byte count like 512K, 2M or 2MiB")]
    Invalid(String),

    #[error("rate cap must be greater than zero (use 'unlimited' to disable throttling)")]
    Zero,
}

impl FromStr for RateCap {
    type Err = RateCapParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        if raw.is_empty() {
            return Err(RateCapParseError::Empty);
        }

        match raw.to_ascii_lowercase().as_str() {
            "unlimited" | "none" | "off" | "ultimate" => return Ok(Self::Unlimited),
            "standard" => return Ok(Self::STANDARD),
            "pro" => return Ok(Self::PRO),
            _ => {}
        }

        let lower = raw.to_ascii_lowercase();
        let unit_at = lower
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(lower.len());
        let (number, unit) = lower.split_at(unit_at);
        let unit = unit.trim().trim_end_matches("/s");

        let multiplier = match unit {
            "" | "b" => 1,
            "k" | "kb" | "kib" => KIB,
            "m" | "mb" | "mib" => MIB,
            "g" | "gb" | "gib" => GIB,
            _ => return Err(RateCapParseError::Invalid(raw.to_string())),
        };

        let value: f64 = number
            .parse()
            .map_err(|_| RateCapParseError::Invalid(raw.to_string()))?;

        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            clippy::cast_precision_loss
        )]
        let bytes = (value * multiplier as f64).round() as u64;

        NonZeroU64::new(bytes)
            .map(Self::BytesPerSecond)
            .ok_or(RateCapParseError::Zero)
    }
}
