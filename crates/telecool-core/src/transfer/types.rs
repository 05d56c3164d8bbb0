//! Core domain types for transfers.
//!
//! Pure data types with no I/O dependencies.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Estimated progress must stay strictly below this percentage.
///
/// The gap up to 100 is reserved for the authoritative completion signal.
pub const ESTIMATE_CEILING: f64 = 99.8;

/// Highest fraction an advisory (estimated) progress update may record.
pub const MAX_ESTIMATED_FRACTION: f64 = ESTIMATE_CEILING - 0.01;

/// Fraction recorded on authoritative completion.
pub const COMPLETE_FRACTION: f64 = 100.0;

/// Opaque, stable identifier for a transfer task.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(Uuid);

impl TaskId {
    /// Mint a fresh random task ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Short form used in terminal output (first 8 hex digits).
    #[must_use]
    pub fn short(&self) -> String {
        self.0.simple().to_string()[..8].to_string()
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TaskId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

/// Locator used to re-resolve a remote media object at transfer time.
///
/// Identifies the originating conversation and the message carrying the media.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceRef {
    /// Conversation identifier (numeric peer ID or username).
    pub chat_id: String,
    /// Message identifier within the conversation.
    pub message_id: i64,
}

impl SourceRef {
    /// Create a new source reference.
    pub fn new(chat_id: impl Into<String>, message_id: i64) -> Self {
        Self {
            chat_id: chat_id.into(),
            message_id,
        }
    }

    /// File name used when the caller does not supply a display name.
    #[must_use]
    pub fn fallback_file_name(&self) -> String {
        format!("file_{}", self.message_id)
    }
}

impl fmt::Display for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.chat_id, self.message_id)
    }
}

/// A resolved, fetchable media object returned by the remote collaborator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaHandle {
    /// The reference this handle was resolved from.
    pub source: SourceRef,
    /// Collaborator-specific locator (URL, file path, file reference).
    pub locator: String,
    /// Size reported by the collaborator, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// Media kind as reported by the collaborator (e.g. "document").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_kind: Option<String>,
}

impl MediaHandle {
    /// Create a handle with no size or kind metadata.
    pub fn new(source: SourceRef, locator: impl Into<String>) -> Self {
        Self {
            source,
            locator: locator.into(),
            size: None,
            media_kind: None,
        }
    }

    /// Attach the reported size.
    #[must_use]
    pub const fn with_size(mut self, size: Option<u64>) -> Self {
        self.size = size;
        self
    }

    /// Attach the media kind.
    #[must_use]
    pub fn with_media_kind(mut self, kind: impl Into<String>) -> Self {
        self.media_kind = Some(kind.into());
        self
    }
}

/// Status of a transfer task.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferStatus {
    /// Created, not yet touched by the estimator or coordinator.
    Pending,
    /// Bytes are (believed to be) moving.
    Active,
    /// Display frozen by the user; the backend call is not interrupted.
    Paused,
    /// Authoritatively finished; lives in the completed set.
    Completed,
    /// Authoritatively failed; stays listed until removed.
    Failed,
}

impl TransferStatus {
    /// Convert to string representation for storage and display.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Terminal states only change by removal.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// States whose displayed progress may still advance.
    #[must_use]
    pub const fn accepts_progress(&self) -> bool {
        matches!(self, Self::Pending | Self::Active)
    }

    /// Whether a caller-driven status change from `self` to `next` is legal.
    ///
    /// Authoritative terminal transitions are accepted from every
    /// non-terminal state, since pausing never stops the coordinator.
    #[must_use]
    pub const fn can_transition_to(&self, next: Self) -> bool {
        match (self, next) {
            (Self::Pending, Self::Active)
            | (Self::Active, Self::Paused)
            | (Self::Paused, Self::Active) => true,
            (Self::Pending | Self::Active | Self::Paused, Self::Completed | Self::Failed) => true,
            _ => false,
        }
    }
}

impl fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransferStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "active" | "downloading" => Ok(Self::Active),
            "paused" => Ok(Self::Paused),
            "completed" => Ok(Self::Completed),
            "failed" | "error" => Ok(Self::Failed),
            _ => Err(()),
        }
    }
}

/// One requested file transfer and its tracked state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransferTask {
    pub id: TaskId,
    /// Human-readable file name.
    pub display_name: String,
    /// Expected size; a best-effort estimate until the transfer finishes.
    pub total_bytes: u64,
    /// Displayed progress, 0.0 - 100.0.
    pub transferred_fraction: f64,
    /// Last observed or estimated rate, display only.
    pub rate_bytes_per_second: f64,
    pub status: TransferStatus,
    pub source_ref: SourceRef,
    /// Absolute file path resolved when the task was created.
    pub destination_path: PathBuf,
    /// Failure detail while the task is `Failed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl TransferTask {
    /// Create a new task in `Pending`.
    pub fn new(
        display_name: impl Into<String>,
        total_bytes: u64,
        source_ref: SourceRef,
        destination_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            id: TaskId::new(),
            display_name: display_name.into(),
            total_bytes,
            transferred_fraction: 0.0,
            rate_bytes_per_second: 0.0,
            status: TransferStatus::Pending,
            source_ref,
            destination_path: destination_path.into(),
            error: None,
            created_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Use a caller-chosen ID instead of a random one.
    #[must_use]
    pub const fn with_id(mut self, id: TaskId) -> Self {
        self.id = id;
        self
    }

    /// Estimated bytes transferred, derived from the displayed fraction.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn transferred_bytes(&self) -> u64 {
        ((self.total_bytes as f64) * self.transferred_fraction / 100.0).round() as u64
    }

    /// Whether the task still occupies its destination path.
    #[must_use]
    pub const fn holds_destination(&self) -> bool {
        !self.status.is_terminal()
    }
}
