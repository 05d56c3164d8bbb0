//! Event emitter adapters.

use tokio::sync::broadcast;

use telecool_core::{TransferEvent, TransferEventEmitterPort};

/// Logs every event through `tracing`.
///
/// Progress events go to `trace`, everything else to `debug`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingTransferEmitter;

impl TracingTransferEmitter {
    pub const fn new() -> Self {
        Self
    }
}

impl TransferEventEmitterPort for TracingTransferEmitter {
    fn emit(&self, event: TransferEvent) {
        let id = event.task_id().map(|id| id.short());
        if event.is_progress() {
            tracing::trace!(
                target: "telecool.events",
                event = event.name(),
                id = id.as_deref(),
                ?event
            );
        } else {
            tracing::debug!(
                target: "telecool.events",
                event = event.name(),
                id = id.as_deref(),
                ?event
            );
        }
    }

    fn clone_box(&self) -> Box<dyn TransferEventEmitterPort> {
        Box::new(*self)
    }
}

/// Fans events out to any number of subscribers.
///
/// Slow subscribers may miss events when the buffer overflows.
#[derive(Debug, Clone)]
pub struct BroadcastTransferEmitter {
    sender: broadcast::Sender<TransferEvent>,
}

impl BroadcastTransferEmitter {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Broadcaster with room for 256 events.
    pub fn with_defaults() -> Self {
        Self::new(256)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TransferEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for BroadcastTransferEmitter {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl TransferEventEmitterPort for BroadcastTransferEmitter {
    fn emit(&self, event: TransferEvent) {
        // No subscribers is fine.
        let _ = self.sender.send(event);
    }

    fn clone_box(&self) -> Box<dyn TransferEventEmitterPort> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use telecool_core::{RateCap, TaskId};

    #[test]
    fn test_tracing_emitter_accepts_all_events() {
        let emitter = TracingTransferEmitter::new();
        emitter.emit(TransferEvent::TaskStarted { id: TaskId::new() });
        emitter.emit(TransferEvent::CompletedCleared { count: 2 });
        let _boxed = emitter.clone_box();
    }

    #[tokio::test]
    async fn test_broadcast_reaches_every_subscriber() {
        let emitter = BroadcastTransferEmitter::with_defaults();
        let mut a = emitter.subscribe();
        let mut b = emitter.subscribe();
        assert_eq!(emitter.subscriber_count(), 2);

        emitter.emit(TransferEvent::RateCapChanged {
            cap: RateCap::STANDARD,
        });

        assert_eq!(a.recv().await.unwrap().name(), b.recv().await.unwrap().name());
    }

    #[test]
    fn test_broadcast_without_subscribers_is_silent() {
        let emitter = BroadcastTransferEmitter::new(4);
        emitter.emit(TransferEvent::TaskRemoved { id: TaskId::new() });
        assert_eq!(emitter.subscriber_count(), 0);
    }
}
