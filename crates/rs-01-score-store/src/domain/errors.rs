//! Store error types.

use thiserror::Error;

/// Errors surfaced by a persistence backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Backend could not be reached.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Write was rejected by the backend.
    #[error("Write failed: {0}")]
    WriteFailed(String),

    /// Query failed or returned malformed data.
    #[error("Query failed: {0}")]
    QueryFailed(String),
}
