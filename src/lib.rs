//! Backend-for-frontend data-access layer for the dorm storage marketplace.
//!
//! dormstore consolidates the two external integrations of the application -
//! a payment processor and a realtime record/blob store - behind one coherent
//! API, and caches results for repeat reads. It is glue, not a backend: every
//! non-trivial behavior is delegated to the remote services.
//!
//! # Architecture
//!
//! ```text
//! application caller
//!        │
//!   ┌────┴─────────────────────┐
//!   ▼                          ▼
//! PaymentGateway        RemoteRecordStore
//! (checkout)            (catalog / listings)
//!   │                          │
//!   ▼                          ▼
//! payment backend         record backend ──► BlobCache ──► blob store
//! (or local demo state)   (or in-memory)     (images, default asset on miss)
//! ```
//!
//! Components are explicitly constructed and dependency-injected; there are
//! no process-wide singletons. Lifetimes are owned by the composition root
//! (see the `dormstore-demo` binary).
//!
//! # Fallback modes
//!
//! Every component has a deterministic offline mode so the calling
//! application stays fully operable without configured backends:
//!
//! - [`payment::PaymentGateway`] with no `base_url` serves a synthetic demo
//!   customer from local state.
//! - [`store::MemoryBackend`] implements the record-store seam in memory.
//! - [`blob::StaticBlobFetcher`] serves blobs from a preloaded map.

pub mod blob;
pub mod config;
pub mod error;
pub mod model;
pub mod payment;
pub mod store;

pub use config::AppConfig;
pub use error::{Error, PaymentFailure, Result};
pub use model::{Listing, RentType, StorableObject, StorageCompany, StorageType};
pub use payment::{Card, Customer, GatewayConfig, PaymentGateway};
