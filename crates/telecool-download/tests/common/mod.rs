//! Shared fixtures for transfer engine integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::RwLock;

use telecool_core::{
    ByteStream, MediaHandle, MediaSourceError, MediaSourcePort, NoopTransferEmitter, RateCap,
    SourceRef, TransferTask,
};
use telecool_download::{
    CoordinatorDeps, RateCapControl, TaskRegistry, TransferCoordinator, TransferJob,
};

pub const MIB: usize = 1024 * 1024;

/// In-memory media source serving fixed payloads in fixed-size chunks.
#[derive(Default)]
pub struct MemorySource {
    media: HashMap<SourceRef, Bytes>,
    chunk_size: usize,
}

impl MemorySource {
    pub fn new(chunk_size: usize) -> Self {
        Self {
            media: HashMap::new(),
            chunk_size,
        }
    }

    pub fn with_media(mut self, source: SourceRef, payload: Vec<u8>) -> Self {
        self.media.insert(source, Bytes::from(payload));
        self
    }
}

#[async_trait]
impl MediaSourcePort for MemorySource {
    async fn resolve(&self, source: &SourceRef) -> Result<MediaHandle, MediaSourceError> {
        let payload = self
            .media
            .get(source)
            .ok_or_else(|| MediaSourceError::NotFound(source.to_string()))?;
        Ok(MediaHandle::new(source.clone(), source.to_string())
            .with_size(Some(payload.len() as u64)))
    }

    async fn open(&self, handle: &MediaHandle) -> Result<ByteStream, MediaSourceError> {
        let payload = self
            .media
            .get(&handle.source)
            .cloned()
            .ok_or_else(|| MediaSourceError::NotFound(handle.source.to_string()))?;

        let chunk = self.chunk_size.max(1);
        let chunks: Vec<Result<Bytes, MediaSourceError>> = (0..payload.len())
            .step_by(chunk)
            .map(|start| Ok(payload.slice(start..(start + chunk).min(payload.len()))))
            .collect();
        Ok(Box::pin(futures_util::stream::iter(chunks)))
    }
}

/// Registry + coordinator wired to `source` under `cap`.
pub fn coordinator(
    source: Arc<dyn MediaSourcePort>,
    cap: RateCap,
) -> (Arc<RwLock<TaskRegistry>>, TransferCoordinator, RateCapControl) {
    let registry = Arc::new(RwLock::new(TaskRegistry::new()));
    let rate_cap = RateCapControl::new(cap);
    let coordinator = TransferCoordinator::new(
        Arc::clone(&registry),
        CoordinatorDeps {
            source,
            rate_cap: rate_cap.clone(),
            emitter: Arc::new(NoopTransferEmitter::new()),
        },
    );
    (registry, coordinator, rate_cap)
}

/// Create a pending task and the job that runs it.
pub async fn job(
    registry: &RwLock<TaskRegistry>,
    source: SourceRef,
    destination: std::path::PathBuf,
) -> TransferJob {
    let name = destination
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let task = TransferTask::new(name, 0, source.clone(), destination.clone());
    let id = registry.write().await.create(task).unwrap();
    TransferJob {
        id,
        source,
        destination,
    }
}
