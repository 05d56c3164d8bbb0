//! Results of registry writes that may lose a race.

/// Result of an advisory progress write.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProgressOutcome {
    /// Stored; carries the clamped fraction actually recorded.
    Applied { fraction: f64 },
    /// Task unknown, paused or terminal; nothing changed.
    Ignored,
}

impl ProgressOutcome {
    pub const fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

/// Result of an authoritative `complete`/`fail`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalOutcome {
    /// The task moved to the terminal state now.
    Applied,
    /// The task was already in that terminal state.
    AlreadyApplied,
}
