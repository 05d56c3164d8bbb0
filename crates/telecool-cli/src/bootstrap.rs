//! CLI bootstrap - the composition root.
//!
//! This is the only place where the engine is wired together for the CLI:
//! - JSON state repository at the data root
//! - Media source chosen by the command (local mirror or HTTP bridge)
//! - Broadcast emitter so handlers can follow progress
//! - Transfer manager restored from persisted history

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use telecool_core::paths::STATE_FILE_NAME;
use telecool_core::{
    ByteStream, MediaHandle, MediaSourceError, MediaSourcePort, RateCap, Settings, SourceRef,
    TransferManagerConfig, TransferStateRepositoryPort, state_file_path, validate_settings,
};
use telecool_download::{
    BroadcastTransferEmitter, FsMediaSource, HttpMediaSource, JsonStateRepository,
    TransferManagerDeps, TransferManagerImpl, build_transfer_manager,
};

use crate::commands::GetArgs;
use crate::error::CliError;

/// Where media bytes come from for this invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SourceChoice {
    /// Local mirror laid out as `<root>/<chat>/<message>`.
    Library(PathBuf),
    /// HTTP bridge.
    Server {
        url: String,
        token: Option<String>,
    },
    /// No backend; commands that only touch settings or history.
    #[default]
    Offline,
}

impl SourceChoice {
    /// Pick the backend named on the `get` command line.
    pub fn from_args(args: &GetArgs) -> Self {
        if let Some(ref root) = args.library {
            Self::Library(root.clone())
        } else if let Some(ref url) = args.server {
            Self::Server {
                url: url.clone(),
                token: args.token.clone(),
            }
        } else {
            Self::Offline
        }
    }

    fn build(self) -> Result<CliSource, MediaSourceError> {
        Ok(match self {
            Self::Library(root) => CliSource::Library(FsMediaSource::new(root)),
            Self::Server { url, token } => {
                let source = HttpMediaSource::new(&url)?;
                CliSource::Server(match token {
                    Some(token) => source.with_auth_token(token),
                    None => source,
                })
            }
            Self::Offline => CliSource::Offline,
        })
    }
}

/// Media source selected at startup.
pub enum CliSource {
    Library(FsMediaSource),
    Server(HttpMediaSource),
    Offline,
}

fn offline() -> MediaSourceError {
    MediaSourceError::Backend("no media source configured (use --library or --server)".into())
}

#[async_trait]
impl MediaSourcePort for CliSource {
    async fn resolve(&self, source: &SourceRef) -> Result<MediaHandle, MediaSourceError> {
        match self {
            Self::Library(inner) => inner.resolve(source).await,
            Self::Server(inner) => inner.resolve(source).await,
            Self::Offline => Err(offline()),
        }
    }

    async fn open(&self, handle: &MediaHandle) -> Result<ByteStream, MediaSourceError> {
        match self {
            Self::Library(inner) => inner.open(handle).await,
            Self::Server(inner) => inner.open(handle).await,
            Self::Offline => Err(offline()),
        }
    }
}

/// Bootstrap configuration for the CLI.
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Persisted settings and history.
    pub state_file: PathBuf,
    /// Media backend.
    pub source: SourceChoice,
    /// Rate cap for this run only; not written back.
    pub rate_cap_override: Option<RateCap>,
}

impl CliConfig {
    /// Config rooted at `data_dir`, or the default data root when `None`.
    pub fn new(data_dir: Option<PathBuf>) -> Result<Self, CliError> {
        let state_file = match data_dir {
            Some(dir) => dir.join(STATE_FILE_NAME),
            None => state_file_path()?,
        };
        Ok(Self {
            state_file,
            source: SourceChoice::Offline,
            rate_cap_override: None,
        })
    }

    #[must_use]
    pub fn with_source(mut self, source: SourceChoice) -> Self {
        self.source = source;
        self
    }

    #[must_use]
    pub const fn with_rate_cap(mut self, cap: Option<RateCap>) -> Self {
        self.rate_cap_override = cap;
        self
    }
}

/// Fully composed context for CLI commands.
pub struct CliContext {
    /// The transfer engine.
    pub manager: Arc<TransferManagerImpl>,
    /// Subscribe here to follow transfer events.
    pub events: BroadcastTransferEmitter,
    /// Settings as loaded at startup.
    pub settings: Settings,
    state_file: PathBuf,
}

impl CliContext {
    pub fn state_file(&self) -> &Path {
        &self.state_file
    }

    /// Directory holding the state file.
    pub fn data_dir(&self) -> &Path {
        self.state_file.parent().unwrap_or(&self.state_file)
    }

    /// Stop background work. In-flight transfers are not cancelled.
    pub fn shutdown(&self) {
        self.manager.shutdown();
    }
}

/// Wire up the engine.
pub async fn bootstrap(config: CliConfig) -> Result<CliContext, CliError> {
    let repo = Arc::new(JsonStateRepository::new(&config.state_file));
    let settings = repo.load().await?.settings;
    validate_settings(&settings)?;

    let mut manager_config = TransferManagerConfig::from_settings(&settings);
    if let Some(cap) = config.rate_cap_override {
        manager_config = manager_config.with_rate_cap(cap);
    }

    let events = BroadcastTransferEmitter::with_defaults();
    let manager = Arc::new(build_transfer_manager(TransferManagerDeps {
        source: Arc::new(config.source.build()?),
        state_repo: repo,
        emitter: Arc::new(events.clone()),
        config: manager_config,
    }));
    manager.restore().await?;

    tracing::debug!(
        state_file = %config.state_file.display(),
        "CLI context ready"
    );

    Ok(CliContext {
        manager,
        events,
        settings,
        state_file: config.state_file,
    })
}
