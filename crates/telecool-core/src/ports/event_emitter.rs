//! Transfer event emitter port.
//!
//! Lets the transfer manager publish events without coupling to a transport
//! (terminal renderer, log sink, IPC bridge).

use crate::transfer::TransferEvent;

/// Port for emitting transfer events.
///
/// Implementations must not block; buffer or drop instead.
pub trait TransferEventEmitterPort: Send + Sync {
    /// Emit a transfer event.
    fn emit(&self, event: TransferEvent);

    /// Clone this emitter into a boxed trait object.
    fn clone_box(&self) -> Box<dyn TransferEventEmitterPort>;
}

/// A no-op emitter for tests and contexts that poll snapshots instead.
#[derive(Debug, Clone, Default)]
pub struct NoopTransferEmitter;

impl NoopTransferEmitter {
    /// Create a new no-op emitter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl TransferEventEmitterPort for NoopTransferEmitter {
    fn emit(&self, _event: TransferEvent) {
        // Intentionally do nothing
    }

    fn clone_box(&self) -> Box<dyn TransferEventEmitterPort> {
        Box::new(self.clone())
    }
}
