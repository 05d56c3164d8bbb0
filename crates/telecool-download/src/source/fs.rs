//! Directory-mirror media source.
//!
//! Layout: `<root>/<chat_id>/<message_id>` is either the media file itself
//! or a directory holding exactly one file (the media, with its original
//! name). Useful for exported chat archives and for tests.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use futures_util::StreamExt;
use tokio::fs;
use tokio_util::io::ReaderStream;

use telecool_core::{ByteStream, MediaHandle, MediaSourceError, MediaSourcePort, SourceRef};

/// Read buffer size for file streams.
pub const CHUNK_SIZE: usize = 64 * 1024;

/// Media source backed by a local directory tree.
#[derive(Debug, Clone)]
pub struct FsMediaSource {
    root: PathBuf,
    chunk_size: usize,
}

impl FsMediaSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            chunk_size: CHUNK_SIZE,
        }
    }

    /// Override the read chunk size (clamped to at least one byte).
    #[must_use]
    pub fn with_chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size.max(1);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entry_path(&self, source: &SourceRef) -> PathBuf {
        self.root
            .join(&source.chat_id)
            .join(source.message_id.to_string())
    }

    /// The single regular file inside a message directory.
    async fn single_file_in(dir: &Path, source: &SourceRef) -> Result<PathBuf, MediaSourceError> {
        let mut entries = fs::read_dir(dir)
            .await
            .map_err(|e| MediaSourceError::Io(e.to_string()))?;
        let mut files = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| MediaSourceError::Io(e.to_string()))?
        {
            let is_file = entry
                .file_type()
                .await
                .map_err(|e| MediaSourceError::Io(e.to_string()))?
                .is_file();
            if is_file {
                files.push(entry.path());
            }
        }

        match files.len() {
            0 => Err(MediaSourceError::NoMedia(source.to_string())),
            1 => Ok(files.remove(0)),
            n => Err(MediaSourceError::Backend(format!(
                "{source}: expected one media file, found {n}"
            ))),
        }
    }
}

#[async_trait]
impl MediaSourcePort for FsMediaSource {
    async fn resolve(&self, source: &SourceRef) -> Result<MediaHandle, MediaSourceError> {
        let entry = self.entry_path(source);
        let meta = match fs::metadata(&entry).await {
            Ok(meta) => meta,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(MediaSourceError::NotFound(source.to_string()));
            }
            Err(e) => return Err(MediaSourceError::Io(e.to_string())),
        };

        let file = if meta.is_dir() {
            Self::single_file_in(&entry, source).await?
        } else {
            entry
        };

        let size = fs::metadata(&file)
            .await
            .map_err(|e| MediaSourceError::Io(e.to_string()))?
            .len();

        tracing::debug!(source = %source, path = %file.display(), size, "Resolved mirrored media");

        Ok(MediaHandle::new(source.clone(), file.to_string_lossy())
            .with_size(Some(size))
            .with_media_kind("document"))
    }

    async fn open(&self, handle: &MediaHandle) -> Result<ByteStream, MediaSourceError> {
        let file = fs::File::open(&handle.locator).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                MediaSourceError::NotFound(handle.source.to_string())
            } else {
                MediaSourceError::Io(e.to_string())
            }
        })?;

        let stream = ReaderStream::with_capacity(file, self.chunk_size)
            .map(|chunk| chunk.map_err(|e| MediaSourceError::Io(e.to_string())));
        Ok(Box::pin(stream))
    }
}
