//! Per-task outcome channels backing `wait_for`.

use std::collections::HashMap;

use tokio::sync::{Mutex, watch};

use telecool_core::{TaskId, TransferError, TransferTask};

/// Final result of one transfer.
pub type Outcome = Result<TransferTask, TransferError>;

type Slot = watch::Sender<Option<Outcome>>;

/// One watch channel per tracked task, holding its outcome once known.
#[derive(Debug, Default)]
pub struct OutcomeBoard {
    slots: Mutex<HashMap<TaskId, Slot>>,
}

/// What `wait` found.
#[derive(Debug)]
pub enum Waited {
    /// The task finished with this outcome.
    Finished(Outcome),
    /// No slot for this ID, or the slot was dropped before an outcome arrived.
    Untracked,
}

impl OutcomeBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a slot for a new task.
    pub async fn open(&self, id: TaskId) {
        let (tx, _rx) = watch::channel(None);
        self.slots.lock().await.insert(id, tx);
    }

    /// Record the outcome. Returns `false` if the slot is gone.
    pub async fn publish(&self, id: &TaskId, outcome: Outcome) -> bool {
        let slots = self.slots.lock().await;
        slots.get(id).is_some_and(|tx| {
            tx.send_replace(Some(outcome));
            true
        })
    }

    /// Drop a slot; pending waiters see `Untracked`.
    pub async fn close(&self, id: &TaskId) {
        self.slots.lock().await.remove(id);
    }

    /// Drop several slots at once.
    pub async fn close_all<'a>(&self, ids: impl IntoIterator<Item = &'a TaskId>) {
        let mut slots = self.slots.lock().await;
        for id in ids {
            slots.remove(id);
        }
    }

    /// Wait until the task's outcome is published.
    pub async fn wait(&self, id: &TaskId) -> Waited {
        let rx = {
            let slots = self.slots.lock().await;
            match slots.get(id) {
                Some(tx) => tx.subscribe(),
                None => return Waited::Untracked,
            }
        };
        Self::wait_on(rx).await
    }

    async fn wait_on(mut rx: watch::Receiver<Option<Outcome>>) -> Waited {
        match rx.wait_for(Option::is_some).await {
            Ok(value) => value
                .as_ref()
                .map_or(Waited::Untracked, |outcome| Waited::Finished(outcome.clone())),
            Err(_) => Waited::Untracked,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use telecool_core::SourceRef;

    fn task() -> TransferTask {
        TransferTask::new("a", 1, SourceRef::new("c", 1), "/tmp/a")
    }

    #[tokio::test]
    async fn test_wait_after_publish_returns_immediately() {
        let board = OutcomeBoard::new();
        let t = task();
        board.open(t.id).await;
        assert!(board.publish(&t.id, Ok(t.clone())).await);

        match board.wait(&t.id).await {
            Waited::Finished(Ok(done)) => assert_eq!(done.id, t.id),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_wait_before_publish() {
        let board = Arc::new(OutcomeBoard::new());
        let id = TaskId::new();
        board.open(id).await;

        let waiter = {
            let board = Arc::clone(&board);
            tokio::spawn(async move { board.wait(&id).await })
        };
        tokio::task::yield_now().await;
        board.publish(&id, Err(TransferError::other("boom"))).await;

        assert!(matches!(waiter.await.unwrap(), Waited::Finished(Err(_))));
    }

    #[tokio::test]
    async fn test_close_releases_waiters() {
        let board = Arc::new(OutcomeBoard::new());
        let id = TaskId::new();
        board.open(id).await;

        let waiter = {
            let board = Arc::clone(&board);
            tokio::spawn(async move { board.wait(&id).await })
        };
        tokio::task::yield_now().await;
        board.close(&id).await;

        assert!(matches!(waiter.await.unwrap(), Waited::Untracked));
        assert!(!board.publish(&id, Err(TransferError::other("late"))).await);
    }

    #[tokio::test]
    async fn test_unknown_id_is_untracked() {
        let board = OutcomeBoard::new();
        assert!(matches!(board.wait(&TaskId::new()).await, Waited::Untracked));
    }
}
