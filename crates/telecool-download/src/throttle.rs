//! Byte-rate throttling.
//!
//! Each transfer owns a `ByteRateThrottle` with its own one-second window.
//! The cap itself is shared through `RateCapControl`, so changing it takes
//! effect on the next chunk of every in-flight transfer.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use tokio::sync::watch;
use tokio::time::Instant;

use telecool_core::RateCap;

/// Length of one accounting window.
pub const WINDOW: Duration = Duration::from_secs(1);

/// Shared, live rate cap.
///
/// Cloning yields another handle to the same value.
#[derive(Clone, Debug)]
pub struct RateCapControl {
    tx: Arc<watch::Sender<RateCap>>,
}

impl RateCapControl {
    /// Create a control holding the initial cap.
    pub fn new(cap: RateCap) -> Self {
        let (tx, _rx) = watch::channel(cap);
        Self { tx: Arc::new(tx) }
    }

    /// Replace the cap. Returns `true` if the value changed.
    pub fn set(&self, cap: RateCap) -> bool {
        self.tx.send_if_modified(|current| {
            if *current == cap {
                false
            } else {
                *current = cap;
                true
            }
        })
    }

    /// Current cap.
    pub fn current(&self) -> RateCap {
        *self.tx.borrow()
    }

    /// A receiver that always observes the latest cap.
    pub fn subscribe(&self) -> watch::Receiver<RateCap> {
        self.tx.subscribe()
    }

    /// A fresh throttle bound to this control.
    pub fn throttle(&self) -> ByteRateThrottle {
        ByteRateThrottle::new(self.subscribe())
    }
}

impl Default for RateCapControl {
    fn default() -> Self {
        Self::new(RateCap::Unlimited)
    }
}

/// Releases bytes no faster than the live cap, in one-second windows.
///
/// Chunks are never split: a chunk larger than the cap is admitted whole at
/// the start of a fresh window.
#[derive(Debug)]
pub struct ByteRateThrottle {
    cap: watch::Receiver<RateCap>,
    window_start: Option<Instant>,
    bytes_in_window: u64,
}

impl ByteRateThrottle {
    /// Create a throttle reading its cap from `cap`.
    pub const fn new(cap: watch::Receiver<RateCap>) -> Self {
        Self {
            cap,
            window_start: None,
            bytes_in_window: 0,
        }
    }

    /// Create a throttle with a fixed cap.
    pub fn fixed(cap: RateCap) -> Self {
        RateCapControl::new(cap).throttle()
    }

    /// Bytes admitted in the current window.
    pub const fn bytes_in_window(&self) -> u64 {
        self.bytes_in_window
    }

    /// Wait until `len` more bytes may pass, then account for them.
    ///
    /// Returns immediately when the cap is unlimited.
    pub async fn admit(&mut self, len: usize) {
        let cap = *self.cap.borrow_and_update();
        let Some(limit) = cap.bytes_per_second() else {
            self.window_start = None;
            self.bytes_in_window = 0;
            return;
        };

        let len = len as u64;
        let now = Instant::now();
        let start = *self.window_start.get_or_insert(now);
        let elapsed = now.saturating_duration_since(start);

        if elapsed >= WINDOW {
            self.window_start = Some(now);
            self.bytes_in_window = 0;
        } else if self.bytes_in_window > 0 && self.bytes_in_window + len > limit {
            tokio::time::sleep(WINDOW - elapsed).await;
            self.window_start = Some(Instant::now());
            self.bytes_in_window = 0;
        }

        self.bytes_in_window += len;
    }
}

/// Wrap a chunk stream so every chunk passes through `throttle`.
///
/// Errors are forwarded without delay.
pub fn throttled<S, E>(
    stream: S,
    throttle: ByteRateThrottle,
) -> impl Stream<Item = Result<Bytes, E>>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
{
    futures_util::stream::unfold((stream, throttle), |(mut stream, mut throttle)| async move {
        let item = stream.next().await?;
        if let Ok(ref chunk) = item {
            throttle.admit(chunk.len()).await;
        }
        Some((item, (stream, throttle)))
    })
}
