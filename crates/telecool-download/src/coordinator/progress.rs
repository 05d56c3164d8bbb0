//! Measured progress reporting for a single transfer.
//!
//! Rate-limits `TaskProgress` events and logs every 5 % of the stream.

use std::time::Duration;

use tokio::time::Instant;

/// Minimum spacing between measured progress events.
pub const EVENT_INTERVAL: Duration = Duration::from_millis(250);

/// Log a debug line each time this many percent are crossed.
const LOG_STEP_PERCENT: u64 = 5;

/// A measured progress sample worth publishing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeasuredProgress {
    pub fraction: f64,
    pub rate_bytes_per_second: f64,
}

/// Tracks bytes written and decides when to report them.
#[derive(Debug)]
pub struct ProgressTracker {
    total: Option<u64>,
    written: u64,
    started: Instant,
    last_emit: Option<Instant>,
    last_logged_step: u64,
    min_interval: Duration,
}

impl ProgressTracker {
    /// Start tracking a stream of `total` bytes (if known).
    pub fn new(total: Option<u64>) -> Self {
        Self {
            total: total.filter(|t| *t > 0),
            written: 0,
            started: Instant::now(),
            last_emit: None,
            last_logged_step: 0,
            min_interval: EVENT_INTERVAL,
        }
    }

    /// Bytes recorded so far.
    pub const fn written(&self) -> u64 {
        self.written
    }

    /// Average rate since the tracker was created.
    pub fn rate(&self) -> f64 {
        let secs = self.started.elapsed().as_secs_f64();
        if secs > 0.0 {
            self.written as f64 / secs
        } else {
            0.0
        }
    }

    /// Percentage written, when the total is known.
    pub fn fraction(&self) -> Option<f64> {
        self.total
            .map(|total| (self.written as f64 / total as f64 * 100.0).min(100.0))
    }

    /// Record `len` more bytes.
    ///
    /// Returns a sample when enough time has passed since the last one.
    pub fn record(&mut self, len: usize) -> Option<MeasuredProgress> {
        self.written += len as u64;
        let fraction = self.fraction()?;

        let step = fraction as u64 / LOG_STEP_PERCENT;
        if step > self.last_logged_step {
            self.last_logged_step = step;
            tracing::debug!(
                target: "telecool.transfer",
                written = self.written,
                total = self.total,
                percent = step * LOG_STEP_PERCENT,
                "Transfer progress"
            );
        }

        let now = Instant::now();
        match self.last_emit {
            Some(last) if now.duration_since(last) < self.min_interval => None,
            _ => {
                self.last_emit = Some(now);
                Some(MeasuredProgress {
                    fraction,
                    rate_bytes_per_second: self.rate(),
                })
            }
        }
    }
}
