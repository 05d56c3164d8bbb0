//! HTTP bridge media source.
//!
//! Talks to a bridge service exposing
//! `{base}/chats/{chat_id}/messages/{message_id}/media`: `HEAD` resolves the
//! object (size from `Content-Length`, kind from `Content-Type`), `GET`
//! streams the bytes.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::{Client, StatusCode, Url, header};

use telecool_core::{ByteStream, MediaHandle, MediaSourceError, MediaSourcePort, SourceRef};

/// Connect timeout for the bridge. Bodies are streamed without a total timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

/// Media source backed by an HTTP bridge.
#[derive(Debug, Clone)]
pub struct HttpMediaSource {
    client: Client,
    base: Url,
    auth_token: Option<String>,
}

impl HttpMediaSource {
    /// Create a source for the bridge at `base`.
    pub fn new(base: &str) -> Result<Self, MediaSourceError> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| MediaSourceError::Backend(format!("failed to create HTTP client: {e}")))?;
        Self::with_client(client, base)
    }

    /// Create a source using an existing client.
    pub fn with_client(client: Client, base: &str) -> Result<Self, MediaSourceError> {
        let mut base = Url::parse(base)
            .map_err(|e| MediaSourceError::Backend(format!("invalid bridge URL {base}: {e}")))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self {
            client,
            base,
            auth_token: None,
        })
    }

    /// Send a bearer token with every request.
    #[must_use]
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// URL of a message's media object.
    pub fn media_url(&self, source: &SourceRef) -> Result<Url, MediaSourceError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| {
                MediaSourceError::Backend(format!("bridge URL cannot be a base: {}", self.base))
            })?
            .pop_if_empty()
            .push("chats")
            .push(&source.chat_id)
            .push("messages")
            .push(&source.message_id.to_string())
            .push("media");
        Ok(url)
    }

    fn request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        let mut request = self.client.request(method, url);
        if let Some(ref token) = self.auth_token {
            request = request.bearer_auth(token);
        }
        request
    }

    fn status_error(status: StatusCode, source: &SourceRef) -> MediaSourceError {
        match status {
            StatusCode::NOT_FOUND => MediaSourceError::NotFound(source.to_string()),
            StatusCode::NO_CONTENT | StatusCode::UNPROCESSABLE_ENTITY => {
                MediaSourceError::NoMedia(source.to_string())
            }
            s if s.is_server_error() => MediaSourceError::network_with_status(
                format!("bridge returned {s} for {source}"),
                s.as_u16(),
            ),
            s => MediaSourceError::Backend(format!("bridge returned {s} for {source}")),
        }
    }
}

fn transport_error(e: &reqwest::Error) -> MediaSourceError {
    e.status().map_or_else(
        || MediaSourceError::network(e.to_string()),
        |status| MediaSourceError::network_with_status(e.to_string(), status.as_u16()),
    )
}

#[async_trait]
impl MediaSourcePort for HttpMediaSource {
    async fn resolve(&self, source: &SourceRef) -> Result<MediaHandle, MediaSourceError> {
        let url = self.media_url(source)?;
        let response = self
            .request(reqwest::Method::HEAD, url.clone())
            .send()
            .await
            .map_err(|e| transport_error(&e))?;

        let status = response.status();
        if !status.is_success() || status == StatusCode::NO_CONTENT {
            return Err(Self::status_error(status, source));
        }

        let headers = response.headers();
        let size = headers
            .get(header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|n| *n > 0);
        let kind = headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        tracing::debug!(source = %source, url = %url, size, "Resolved bridge media");

        let handle = MediaHandle::new(source.clone(), url.as_str()).with_size(size);
        Ok(match kind {
            Some(kind) => handle.with_media_kind(kind),
            None => handle,
        })
    }

    async fn open(&self, handle: &MediaHandle) -> Result<ByteStream, MediaSourceError> {
        let url = Url::parse(&handle.locator)
            .map_err(|e| MediaSourceError::Backend(format!("invalid media locator: {e}")))?;
        let response = self
            .request(reqwest::Method::GET, url)
            .send()
            .await
            .map_err(|e| transport_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::status_error(status, &handle.source));
        }

        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| transport_error(&e)));
        Ok(Box::pin(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_url_layout() {
        let source = HttpMediaSource::new("http://bridge.local/api").unwrap();
        let url = source.media_url(&SourceRef::new("-100123", 42)).unwrap();
        assert_eq!(
            url.as_str(),
            "http://bridge.local/api/chats/-100123/messages/42/media"
        );
    }

    #[test]
    fn test_media_url_escapes_chat_id() {
        let source = HttpMediaSource::new("http://bridge.local/").unwrap();
        let url = source.media_url(&SourceRef::new("a/b", 1)).unwrap();
        assert_eq!(url.as_str(), "http://bridge.local/chats/a%2Fb/messages/1/media");
    }

    #[test]
    fn test_invalid_base_rejected() {
        assert!(matches!(
            HttpMediaSource::new("not a url"),
            Err(MediaSourceError::Backend(_))
        ));
    }

    #[test]
    fn test_status_mapping() {
        let src = SourceRef::new("c", 1);
        assert!(matches!(
            HttpMediaSource::status_error(StatusCode::NOT_FOUND, &src),
            MediaSourceError::NotFound(_)
        ));
        assert!(matches!(
            HttpMediaSource::status_error(StatusCode::BAD_GATEWAY, &src),
            MediaSourceError::Network {
                status_code: Some(502),
                ..
            }
        ));
        assert!(matches!(
            HttpMediaSource::status_error(StatusCode::FORBIDDEN, &src),
            MediaSourceError::Backend(_)
        ));
    }
}
