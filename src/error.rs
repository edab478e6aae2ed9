//! Error types for dormstore.
//!
//! The taxonomy is deliberately coarse and caller-oriented:
//!
//! - [`Error::Config`] - missing or placeholder configuration; not
//!   recoverable without operator action.
//! - [`Error::Payment`] - a payment operation failed in transport or at the
//!   backend; the caller may retry.
//! - [`Error::Decode`] - a backend response did not match the expected
//!   shape; treated as a backend contract violation, never silently
//!   defaulted.
//! - [`Error::RecordStore`] - a record-store subscription or write failed;
//!   delivered on a dedicated error channel without terminating the
//!   subscription.
//!
//! Blob retrieval intentionally has no variant here: every blob failure
//! degrades to a default asset inside [`crate::blob::BlobCache`].

use std::time::Duration;
use thiserror::Error;

/// Result type alias using the crate error.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for dormstore operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Missing or placeholder configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// A payment operation failed against the backend.
    #[error("payment operation `{operation}` failed: {kind}")]
    Payment {
        /// The gateway operation that failed.
        operation: &'static str,
        /// Classification of the failure.
        kind: PaymentFailure,
    },

    /// A backend response did not match the expected shape.
    #[error("decode error: {0}")]
    Decode(String),

    /// A record-store subscription or write failed.
    #[error("record store error: {0}")]
    RecordStore(String),

    /// Filesystem error while reading or writing configuration.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Classification of payment operation failures.
#[derive(Debug, Error)]
pub enum PaymentFailure {
    /// The request did not complete within the configured timeout.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The backend answered with a non-200 HTTP status.
    #[error("backend returned HTTP {0}")]
    Status(u16),

    /// The request failed before a response was received.
    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),
}

impl Error {
    /// Build a payment error for the given gateway operation.
    #[must_use]
    pub fn payment(operation: &'static str, kind: PaymentFailure) -> Self {
        Self::Payment { operation, kind }
    }

    /// Whether retrying the same call can reasonably succeed.
    ///
    /// Configuration and decode errors need operator or backend fixes;
    /// payment transport failures are transient.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Payment { .. })
    }
}
