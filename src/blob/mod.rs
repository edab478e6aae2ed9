//! Named binary asset retrieval with caching and graceful degradation.
//!
//! [`BlobCache::get_blob`] never fails from the caller's point of view:
//! a missing or undecodable image degrades to a fixed default asset so
//! that asset retrieval can never block the surrounding flow.
//!
//! ```text
//! get_blob(name, namespace)
//!        │
//!        ▼
//! normalize name ──► cache hit? ──► yes ──► cached blob
//!        │
//!        no
//!        ▼
//! fetch {name}.jpg (≤ 80 MiB) ──► decode ──► cache + return
//!        │                           │
//!      error                      not an image
//!        └───────────┬───────────────┘
//!                    ▼
//!              default asset
//! ```

mod cache;
mod fetcher;

pub use cache::{normalize_name, Blob, BlobCache, BlobNamespace, CacheStats, MAX_FETCH_BYTES};
pub use fetcher::{BlobFetcher, FetchError, HttpBlobFetcher, StaticBlobFetcher};
