//! Transfer events - discriminated union for all task state changes.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::rate::RateCap;
use super::types::TaskId;

/// Single discriminated union for all transfer events.
///
/// Serialized with a `type` tag:
///
/// ```json
/// { "type": "task_progress", "id": "…", "fraction": 42.5, "rate_bytes_per_second": 1048576.0 }
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransferEvent {
    /// A task was created in `Pending`.
    TaskQueued {
        id: TaskId,
        display_name: String,
        destination: PathBuf,
        total_bytes: u64,
    },

    /// The coordinator began moving bytes for a task.
    TaskStarted { id: TaskId },

    /// Displayed progress changed (estimated or measured).
    TaskProgress {
        id: TaskId,
        /// Progress percentage (0.0 - 100.0).
        fraction: f64,
        rate_bytes_per_second: f64,
    },

    /// Authoritative success.
    TaskCompleted {
        id: TaskId,
        destination: PathBuf,
        /// Size of the file on disk.
        bytes: u64,
    },

    /// Authoritative failure.
    TaskFailed { id: TaskId, error: String },

    /// A task was removed by the caller.
    TaskRemoved { id: TaskId },

    /// The completed list was cleared.
    CompletedCleared {
        /// Number of entries dropped.
        count: usize,
    },

    /// The shared rate cap changed.
    RateCapChanged { cap: RateCap },
}

impl TransferEvent {
    /// Task this event refers to, if any.
    #[must_use]
    pub const fn task_id(&self) -> Option<TaskId> {
        match self {
            Self::TaskQueued { id, .. }
            | Self::TaskStarted { id }
            | Self::TaskProgress { id, .. }
            | Self::TaskCompleted { id, .. }
            | Self::TaskFailed { id, .. }
            | Self::TaskRemoved { id } => Some(*id),
            Self::CompletedCleared { .. } | Self::RateCapChanged { .. } => None,
        }
    }

    /// Short event name for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::TaskQueued { .. } => "task_queued",
            Self::TaskStarted { .. } => "task_started",
            Self::TaskProgress { .. } => "task_progress",
            Self::TaskCompleted { .. } => "task_completed",
            Self::TaskFailed { .. } => "task_failed",
            Self::TaskRemoved { .. } => "task_removed",
            Self::CompletedCleared { .. } => "completed_cleared",
            Self::RateCapChanged { .. } => "rate_cap_changed",
        }
    }

    /// High-frequency events that sinks may drop or log at a lower level.
    #[must_use]
    pub const fn is_progress(&self) -> bool {
        matches!(self, Self::TaskProgress { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_tagging() {
        let id = TaskId::new();
        let event = TransferEvent::TaskFailed {
            id,
            error: "boom".to_string(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "task_failed");
        assert_eq!(json["id"], id.to_string());
        assert_eq!(event.task_id(), Some(id));
        assert_eq!(event.name(), "task_failed");
    }

    #[test]
    fn test_rate_cap_event_has_no_task() {
        let event = TransferEvent::RateCapChanged {
            cap: RateCap::Unlimited,
        };
        assert_eq!(event.task_id(), None);
        let json = serde_json::to_value(&event).unwrap();
        assert!(json["cap"].is_null());
    }
}
