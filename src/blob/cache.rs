//! In-memory blob cache with namespace-scoped keys and a default asset.

use crate::blob::fetcher::BlobFetcher;
use bytes::Bytes;
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tracing::{debug, warn};

/// Maximum size of a single remote blob fetch (80 MiB).
pub const MAX_FETCH_BYTES: u64 = 80 * 1024 * 1024;

/// Default cache capacity (entries).
const DEFAULT_CACHE_CAPACITY: usize = 256;

/// A decoded binary asset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Blob {
    content: Bytes,
}

impl Blob {
    /// Wrap raw bytes without an image check (default assets, fixtures).
    #[must_use]
    pub fn new(content: Bytes) -> Self {
        Self { content }
    }

    /// Decode fetched bytes, accepting only recognizable image data.
    #[must_use]
    pub fn decode(content: Bytes) -> Option<Self> {
        looks_like_image(&content).then_some(Self { content })
    }

    /// Raw content bytes.
    #[must_use]
    pub fn content(&self) -> &Bytes {
        &self.content
    }

    /// Size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.content.len()
    }

    /// Whether the blob holds no data.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

/// Magic-number check for the image formats the blob store holds.
fn looks_like_image(data: &[u8]) -> bool {
    data.starts_with(&[0xFF, 0xD8, 0xFF]) // JPEG
        || data.starts_with(&[0x89, b'P', b'N', b'G']) // PNG
        || data.starts_with(b"GIF8") // GIF
}

/// Cache key namespace.
///
/// Object and company images use separate key spaces so equal names never
/// collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlobNamespace {
    /// Catalog item images.
    ObjectImages,
    /// Vendor company images.
    CompanyImages,
}

impl BlobNamespace {
    /// Short label for logging.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ObjectImages => "object-images",
            Self::CompanyImages => "company-images",
        }
    }
}

/// Normalize a display name into its storage key: lowercase with spaces
/// stripped.
#[must_use]
pub fn normalize_name(name: &str) -> String {
    name.to_lowercase().replace(' ', "")
}

/// Cache statistics for monitoring and test instrumentation.
#[derive(Debug, Default, Clone)]
pub struct CacheStats {
    /// Requests served from the cache.
    pub hits: u64,
    /// Requests that missed the cache.
    pub misses: u64,
    /// Fetches issued to the underlying store.
    pub remote_fetches: u64,
    /// Requests that degraded to the default asset.
    pub fallbacks: u64,
}

/// Memoizing blob retrieval that never fails the caller.
///
/// Cache hits resolve synchronously from memory; misses fetch remotely
/// with the configured size bound. Any failure - not found, oversize,
/// undecodable - returns the default asset instead of an error, exactly
/// once per call.
pub struct BlobCache {
    fetcher: Arc<dyn BlobFetcher>,
    blobs: Mutex<LruCache<(BlobNamespace, String), Blob>>,
    default_asset: Blob,
    max_fetch_bytes: u64,
    stats: Mutex<CacheStats>,
}

impl BlobCache {
    /// Create a cache with default capacity and fetch bound.
    #[must_use]
    pub fn new(fetcher: Arc<dyn BlobFetcher>, default_asset: Blob) -> Self {
        Self::with_capacity(fetcher, default_asset, DEFAULT_CACHE_CAPACITY, MAX_FETCH_BYTES)
    }

    /// Create a cache with explicit capacity and fetch bound.
    #[must_use]
    pub fn with_capacity(
        fetcher: Arc<dyn BlobFetcher>,
        default_asset: Blob,
        capacity: usize,
        max_fetch_bytes: u64,
    ) -> Self {
        let cap = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            fetcher,
            blobs: Mutex::new(LruCache::new(cap)),
            default_asset,
            max_fetch_bytes,
            stats: Mutex::new(CacheStats::default()),
        }
    }

    /// Get the blob for `name`, scoped by `namespace`.
    ///
    /// Never fails: any fetch or decode problem yields the default asset.
    pub async fn get_blob(&self, name: &str, namespace: BlobNamespace) -> Blob {
        let key = (namespace, normalize_name(name));

        if let Some(blob) = self.blobs.lock().get(&key) {
            self.stats.lock().hits += 1;
            return blob.clone();
        }
        self.stats.lock().misses += 1;

        let path = format!("{}.jpg", key.1);
        self.stats.lock().remote_fetches += 1;
        match self.fetcher.fetch(&path, self.max_fetch_bytes).await {
            Ok(bytes) => match Blob::decode(bytes) {
                Some(blob) => {
                    debug!(namespace = namespace.as_str(), path, size = blob.len(), "blob cached");
                    self.blobs.lock().put(key, blob.clone());
                    blob
                }
                None => {
                    warn!(namespace = namespace.as_str(), path, "blob is not a decodable image");
                    self.fallback()
                }
            },
            Err(err) => {
                warn!(namespace = namespace.as_str(), path, %err, "blob fetch failed");
                self.fallback()
            }
        }
    }

    fn fallback(&self) -> Blob {
        self.stats.lock().fallbacks += 1;
        self.default_asset.clone()
    }

    /// Current cache statistics.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        self.stats.lock().clone()
    }

    /// Number of cached blobs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.blobs.lock().len()
    }

    /// Whether the cache holds no blobs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blobs.lock().is_empty()
    }
}
