//! JSON file implementation of `TransferStateRepositoryPort`.
//!
//! The whole state is one pretty-printed JSON document. Writes go to a
//! temporary file in the same directory which is then renamed over the
//! target, so a crash never leaves a half-written state file.

use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;

use telecool_core::{PersistedState, RepositoryError, TransferStateRepositoryPort};

/// State stored in a single JSON file.
#[derive(Debug, Clone)]
pub struct JsonStateRepository {
    path: PathBuf,
}

impl JsonStateRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), RepositoryError> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir).map_err(|e| {
        RepositoryError::Storage(format!("failed to create {}: {e}", dir.display()))
    })?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .map_err(|e| RepositoryError::Storage(format!("failed to create temp file: {e}")))?;
    tmp.write_all(contents)
        .and_then(|()| tmp.as_file().sync_all())
        .map_err(|e| RepositoryError::Storage(format!("failed to write state: {e}")))?;
    tmp.persist(path).map_err(|e| {
        RepositoryError::Storage(format!("failed to replace {}: {}", path.display(), e.error))
    })?;
    Ok(())
}

#[async_trait]
impl TransferStateRepositoryPort for JsonStateRepository {
    async fn load(&self) -> Result<PersistedState, RepositoryError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "No state file, using defaults");
                return Ok(PersistedState::default());
            }
            Err(e) => {
                return Err(RepositoryError::Storage(format!(
                    "failed to read {}: {e}",
                    self.path.display()
                )));
            }
        };

        serde_json::from_slice(&bytes).map_err(|e| {
            RepositoryError::Serialization(format!("{}: {e}", self.path.display()))
        })
    }

    async fn save(&self, state: &PersistedState) -> Result<(), RepositoryError> {
        let json = serde_json::to_vec_pretty(state)
            .map_err(|e| RepositoryError::Serialization(e.to_string()))?;
        let path = self.path.clone();

        tokio::task::spawn_blocking(move || write_atomic(&path, &json))
            .await
            .map_err(|e| RepositoryError::Storage(format!("state writer panicked: {e}")))??;

        tracing::debug!(
            path = %self.path.display(),
            completed = state.completed.len(),
            "State saved"
        );
        Ok(())
    }
}

/// Non-durable repository for tests and one-shot runs.
#[derive(Debug, Default)]
pub struct InMemoryStateRepository {
    state: Mutex<PersistedState>,
}

impl InMemoryStateRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: PersistedState) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }

    /// Current contents.
    pub async fn snapshot(&self) -> PersistedState {
        self.state.lock().await.clone()
    }
}

#[async_trait]
impl TransferStateRepositoryPort for InMemoryStateRepository {
    async fn load(&self) -> Result<PersistedState, RepositoryError> {
        Ok(self.state.lock().await.clone())
    }

    async fn save(&self, state: &PersistedState) -> Result<(), RepositoryError> {
        state.clone_into(&mut *self.state.lock().await);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use telecool_core::{SourceRef, TransferTask};

    fn sample_state() -> PersistedState {
        let mut state = PersistedState::default();
        state.settings.default_destination = Some("/srv/media".to_string());
        state.settings.rate_cap_bytes_per_second = Some(2_097_152);
        state.completed.push(TransferTask::new(
            "clip.mp4",
            42,
            SourceRef::new("chat", 9),
            "/srv/media/clip.mp4",
        ));
        state
    }

    #[tokio::test]
    async fn test_missing_file_loads_default() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonStateRepository::new(dir.path().join("state.json"));
        assert_eq!(repo.load().await.unwrap(), PersistedState::default());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonStateRepository::new(dir.path().join("nested/state.json"));
        let state = sample_state();

        repo.save(&state).await.unwrap();
        assert_eq!(repo.load().await.unwrap(), state);
    }

    #[tokio::test]
    async fn test_save_replaces_previous() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonStateRepository::new(dir.path().join("state.json"));
        repo.save(&sample_state()).await.unwrap();
        repo.save(&PersistedState::default()).await.unwrap();

        let loaded = repo.load().await.unwrap();
        assert!(loaded.completed.is_empty());
        let leftovers = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_serialization_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, b"{ not json").unwrap();

        let err = JsonStateRepository::new(&path).load().await.unwrap_err();
        assert!(matches!(err, RepositoryError::Serialization(_)));
    }

    #[tokio::test]
    async fn test_in_memory_round_trip() {
        let repo = InMemoryStateRepository::new();
        repo.save(&sample_state()).await.unwrap();
        assert_eq!(repo.snapshot().await.completed.len(), 1);
    }
}
