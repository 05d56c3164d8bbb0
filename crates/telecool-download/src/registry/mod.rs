//! Task registry.
//!
//! A pure state machine holding every tracked transfer, split into an
//! *active* set (pending, active, paused, failed) and a *completed* set.
//! No I/O is performed here; the manager wraps it in a `RwLock` and does
//! logging, events and persistence around each call.
//!
//! # Precedence
//!
//! Two writers touch a task: the progress estimator (advisory) and the
//! coordinator (authoritative). Advisory writes are clamped below the
//! completion ceiling and silently ignored once a task is terminal, so an
//! authoritative result always wins regardless of arrival order.

mod outcome;

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use chrono::Utc;
use indexmap::IndexMap;

use telecool_core::{
    COMPLETE_FRACTION, MAX_ESTIMATED_FRACTION, TaskId, TransferError, TransferStatus,
    TransferTask,
};

pub use outcome::{ProgressOutcome, TerminalOutcome};

/// Holds all transfer tasks.
///
/// Sync type with no internal locking; the caller synchronizes.
#[derive(Debug, Default)]
pub struct TaskRegistry {
    active: IndexMap<TaskId, TransferTask>,
    completed: IndexMap<TaskId, TransferTask>,
    /// Destinations of removed tasks whose coordinator run has not ended.
    orphaned: HashMap<TaskId, PathBuf>,
}

impl TaskRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the completed set (e.g. from persisted history).
    ///
    /// Entries whose ID is already tracked are skipped. Returns how many
    /// were added.
    pub fn restore_completed(&mut self, tasks: Vec<TransferTask>) -> usize {
        let mut added = 0;
        for mut task in tasks {
            if self.contains(&task.id) {
                continue;
            }
            task.status = TransferStatus::Completed;
            task.transferred_fraction = COMPLETE_FRACTION;
            task.rate_bytes_per_second = 0.0;
            self.completed.insert(task.id, task);
            added += 1;
        }
        added
    }

    /// Whether either set holds `id`.
    pub fn contains(&self, id: &TaskId) -> bool {
        self.active.contains_key(id) || self.completed.contains_key(id)
    }

    /// Look a task up in either set.
    pub fn get(&self, id: &TaskId) -> Option<&TransferTask> {
        self.active.get(id).or_else(|| self.completed.get(id))
    }

    /// Number of tasks in the active set.
    pub fn active_len(&self) -> usize {
        self.active.len()
    }

    /// Number of tasks in the completed set.
    pub fn completed_len(&self) -> usize {
        self.completed.len()
    }

    /// Insert a new task as `Pending` with zero progress.
    pub fn create(&mut self, mut task: TransferTask) -> Result<TaskId, TransferError> {
        if self.contains(&task.id) {
            return Err(TransferError::duplicate_task(task.id));
        }

        task.status = TransferStatus::Pending;
        task.transferred_fraction = 0.0;
        task.rate_bytes_per_second = 0.0;
        task.error = None;
        task.finished_at = None;

        let id = task.id;
        self.active.insert(id, task);
        Ok(id)
    }

    /// Rename the task's destination away from collisions, then insert it.
    ///
    /// Both steps happen under the caller's single lock acquisition, so two
    /// concurrent requests for the same path always get distinct files.
    pub fn create_unique(&mut self, mut task: TransferTask) -> Result<TransferTask, TransferError> {
        task.destination_path = self.unique_destination(&task.destination_path);
        if let Some(name) = task.destination_path.file_name() {
            task.display_name = name.to_string_lossy().into_owned();
        }
        let id = self.create(task)?;
        self.active
            .get(&id)
            .cloned()
            .ok_or_else(|| TransferError::task_not_found(id))
    }

    /// Lowest-suffix free variant of `desired` among non-terminal tasks and
    /// removed tasks that are still writing.
    ///
    /// `name.ext` → `name (1).ext` → `name (2).ext` …
    pub fn unique_destination(&self, desired: &Path) -> PathBuf {
        let taken: HashSet<&Path> = self
            .active
            .values()
            .filter(|t| t.holds_destination())
            .map(|t| t.destination_path.as_path())
            .chain(self.orphaned.values().map(PathBuf::as_path))
            .collect();

        if !taken.contains(desired) {
            return desired.to_path_buf();
        }

        let parent = desired.parent().unwrap_or_else(|| Path::new(""));
        let stem = desired
            .file_stem()
            .map_or_else(String::new, |s| s.to_string_lossy().into_owned());
        let extension = desired
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();

        let mut n: u32 = 1;
        loop {
            let candidate = parent.join(format!("{stem} ({n}){extension}"));
            if !taken.contains(candidate.as_path()) {
                return candidate;
            }
            n += 1;
        }
    }

    /// Caller-driven status change (`Pending → Active`, `Active ⇄ Paused`).
    ///
    /// Terminal states are only reachable through `complete` and `fail`.
    /// Setting the current status again is a no-op.
    pub fn set_status(&mut self, id: &TaskId, status: TransferStatus) -> Result<(), TransferError> {
        let Some(task) = self.active.get_mut(id) else {
            return Err(if self.completed.contains_key(id) {
                TransferError::invalid_transition(id, "task is completed")
            } else {
                TransferError::task_not_found(id)
            });
        };

        if task.status == status {
            return Ok(());
        }

        if status.is_terminal() {
            return Err(TransferError::invalid_transition(
                id,
                format!("{status} is set only by the transfer outcome"),
            ));
        }

        if !task.status.can_transition_to(status) {
            return Err(TransferError::invalid_transition(
                id,
                format!("{} -> {status}", task.status),
            ));
        }

        task.status = status;
        if status == TransferStatus::Paused {
            task.rate_bytes_per_second = 0.0;
        }
        Ok(())
    }

    /// Advisory progress update.
    ///
    /// Applies only to `Pending`/`Active` tasks. The fraction is clamped to
    /// `[current, MAX_ESTIMATED_FRACTION]`, so it never decreases and never
    /// reaches the completion ceiling.
    pub fn set_progress(&mut self, id: &TaskId, fraction: f64, rate: f64) -> ProgressOutcome {
        let Some(task) = self.active.get_mut(id) else {
            return ProgressOutcome::Ignored;
        };
        if !task.status.accepts_progress() || !fraction.is_finite() {
            return ProgressOutcome::Ignored;
        }

        let clamped = fraction
            .max(task.transferred_fraction)
            .min(MAX_ESTIMATED_FRACTION);
        task.transferred_fraction = clamped;
        task.rate_bytes_per_second = if rate.is_finite() { rate.max(0.0) } else { 0.0 };

        ProgressOutcome::Applied { fraction: clamped }
    }

    /// Record the authoritative size of a non-terminal task.
    pub fn set_total_bytes(&mut self, id: &TaskId, bytes: u64) -> bool {
        match self.active.get_mut(id) {
            Some(task) if !task.status.is_terminal() => {
                task.total_bytes = bytes;
                true
            }
            _ => false,
        }
    }

    /// Authoritative success: move the task to the completed set at 100 %.
    ///
    /// Accepted from `Pending`, `Active` and `Paused`. A second call returns
    /// `AlreadyApplied`. Unknown IDs and failed tasks are rejected.
    pub fn complete(&mut self, id: &TaskId) -> Result<TerminalOutcome, TransferError> {
        if self.completed.contains_key(id) {
            return Ok(TerminalOutcome::AlreadyApplied);
        }

        match self.active.get(id).map(|t| t.status) {
            None => Err(TransferError::invalid_transition(id, "unknown task")),
            Some(TransferStatus::Failed) => {
                Err(TransferError::invalid_transition(id, "task already failed"))
            }
            Some(_) => {
                let Some(mut task) = self.active.shift_remove(id) else {
                    return Err(TransferError::invalid_transition(id, "unknown task"));
                };
                task.status = TransferStatus::Completed;
                task.transferred_fraction = COMPLETE_FRACTION;
                task.rate_bytes_per_second = 0.0;
                task.error = None;
                task.finished_at = Some(Utc::now());
                self.completed.insert(*id, task);
                Ok(TerminalOutcome::Applied)
            }
        }
    }

    /// Authoritative failure. The task stays in the active set until removed.
    ///
    /// Accepted from `Pending`, `Active` and `Paused`. A second call returns
    /// `AlreadyApplied`. Unknown IDs and completed tasks are rejected.
    pub fn fail(&mut self, id: &TaskId, reason: &str) -> Result<TerminalOutcome, TransferError> {
        if self.completed.contains_key(id) {
            return Err(TransferError::invalid_transition(id, "task already completed"));
        }

        let Some(task) = self.active.get_mut(id) else {
            return Err(TransferError::invalid_transition(id, "unknown task"));
        };

        if task.status == TransferStatus::Failed {
            return Ok(TerminalOutcome::AlreadyApplied);
        }

        task.status = TransferStatus::Failed;
        task.rate_bytes_per_second = 0.0;
        task.error = Some(reason.to_string());
        task.finished_at = Some(Utc::now());
        Ok(TerminalOutcome::Applied)
    }

    /// Delete a task from whichever set holds it.
    ///
    /// A removed non-terminal task keeps its destination reserved until
    /// [`release_destination`](Self::release_destination) is called for it.
    pub fn remove(&mut self, id: &TaskId) -> Result<TransferTask, TransferError> {
        if let Some(task) = self.active.shift_remove(id) {
            if task.holds_destination() {
                self.orphaned.insert(task.id, task.destination_path.clone());
            }
            return Ok(task);
        }
        self.completed
            .shift_remove(id)
            .ok_or_else(|| TransferError::task_not_found(id))
    }

    /// Free the destination a removed task was still holding.
    ///
    /// Called once the task's coordinator run has ended. Returns whether a
    /// reservation was dropped.
    pub fn release_destination(&mut self, id: &TaskId) -> bool {
        self.orphaned.remove(id).is_some()
    }

    /// Number of destinations held by removed tasks.
    pub fn orphaned_len(&self) -> usize {
        self.orphaned.len()
    }

    /// Drop the completed set. Returns how many tasks were dropped.
    pub fn clear_completed(&mut self) -> usize {
        let count = self.completed.len();
        self.completed.clear();
        count
    }

    /// IDs of tasks whose displayed progress may still advance.
    pub fn in_flight_ids(&self) -> Vec<TaskId> {
        self.active
            .values()
            .filter(|t| t.status.accepts_progress())
            .map(|t| t.id)
            .collect()
    }

    /// Snapshot of the active set, in creation order.
    pub fn list_active(&self) -> Vec<TransferTask> {
        self.active.values().cloned().collect()
    }

    /// Snapshot of the completed set, in completion order.
    pub fn list_completed(&self) -> Vec<TransferTask> {
        self.completed.values().cloned().collect()
    }
}
