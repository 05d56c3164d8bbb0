//! Transfer state repository port definition.
//!
//! # Persistence Scope
//!
//! **Persisted:** settings (default destination, rate cap, limits) and the
//! completed list.
//!
//! **In-memory only:** active tasks. They are lost on restart; transfers are
//! not resumable.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::RepositoryError;
use crate::settings::Settings;
use crate::transfer::TransferTask;

/// Everything that survives a restart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistedState {
    pub settings: Settings,
    /// Completed tasks, oldest first.
    pub completed: Vec<TransferTask>,
}

/// Port for persisting transfer state.
#[async_trait]
pub trait TransferStateRepositoryPort: Send + Sync {
    /// Load persisted state; a missing store yields the default state.
    async fn load(&self) -> Result<PersistedState, RepositoryError>;

    /// Replace the persisted state.
    async fn save(&self, state: &PersistedState) -> Result<(), RepositoryError>;
}
