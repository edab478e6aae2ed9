//! Realtime record store access.
//!
//! [`RemoteRecordStore`] fetches denormalized backend records and
//! normalizes them into flat catalog entities. Reads are push-based:
//! a fetch opens a long-lived subscription that replaces the whole
//! in-memory collection on every remote change until cancelled. Writes are
//! whole-record upserts, last-write-wins, with no optimistic concurrency.
//!
//! The backend itself sits behind the [`RecordBackend`] trait;
//! [`MemoryBackend`] is the in-memory implementation used for demo mode
//! and tests.

mod backend;
mod remote;

pub use backend::{
    MemoryBackend, RecordBackend, RecordEvent, COMPANIES_PATH, ORDERS_PATH,
    STORABLE_OBJECTS_PATH, USERS_PATH,
};
pub use remote::{CollectionSubscription, RemoteRecordStore};
