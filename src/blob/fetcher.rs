//! Blob fetch seam: remote HTTP store and in-memory demo store.

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Failure modes at the fetch seam.
///
/// These never escape [`crate::blob::BlobCache`]; every variant degrades
/// to the default asset there.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The blob is larger than the configured fetch bound.
    #[error("blob exceeds the {limit}-byte fetch bound")]
    TooLarge {
        /// The bound that was exceeded.
        limit: u64,
    },

    /// No blob is stored at the requested path.
    #[error("blob not found")]
    NotFound,

    /// The store could not be reached or answered abnormally.
    #[error("transport error: {0}")]
    Transport(String),
}

/// Retrieval of raw named blobs with a size bound.
#[async_trait]
pub trait BlobFetcher: Send + Sync {
    /// Fetch the raw bytes stored at `path`, failing if they exceed
    /// `max_bytes`.
    ///
    /// # Errors
    ///
    /// See [`FetchError`].
    async fn fetch(&self, path: &str, max_bytes: u64) -> Result<Bytes, FetchError>;
}

/// [`BlobFetcher`] over an HTTP blob store.
pub struct HttpBlobFetcher {
    base_url: String,
    http: reqwest::Client,
}

impl HttpBlobFetcher {
    /// Create a fetcher rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>) -> crate::Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| crate::Error::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            base_url: base_url.into(),
            http,
        })
    }
}

#[async_trait]
impl BlobFetcher for HttpBlobFetcher {
    async fn fetch(&self, path: &str, max_bytes: u64) -> Result<Bytes, FetchError> {
        let url = format!("{}/{path}", self.base_url.trim_end_matches('/'));
        debug!(%url, "fetching blob");

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound);
        }
        if !response.status().is_success() {
            return Err(FetchError::Transport(format!("HTTP {}", response.status())));
        }

        // Reject early on a declared oversize body, then re-check the
        // actual length since content-length is advisory.
        if response.content_length().is_some_and(|len| len > max_bytes) {
            return Err(FetchError::TooLarge { limit: max_bytes });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        if bytes.len() as u64 > max_bytes {
            return Err(FetchError::TooLarge { limit: max_bytes });
        }
        Ok(bytes)
    }
}

/// In-memory [`BlobFetcher`] preloaded from a map, for demo mode and
/// tests.
#[derive(Debug, Default, Clone)]
pub struct StaticBlobFetcher {
    blobs: Arc<Mutex<HashMap<String, Bytes>>>,
}

impl StaticBlobFetcher {
    /// Create an empty fetcher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `content` under `path`.
    pub fn insert(&self, path: impl Into<String>, content: Bytes) {
        self.blobs.lock().insert(path.into(), content);
    }
}

#[async_trait]
impl BlobFetcher for StaticBlobFetcher {
    async fn fetch(&self, path: &str, max_bytes: u64) -> Result<Bytes, FetchError> {
        let bytes = self
            .blobs
            .lock()
            .get(path)
            .cloned()
            .ok_or(FetchError::NotFound)?;
        if bytes.len() as u64 > max_bytes {
            return Err(FetchError::TooLarge { limit: max_bytes });
        }
        Ok(bytes)
    }
}
