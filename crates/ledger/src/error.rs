//! Error types for ledger operations.

use thiserror::Error;
use weft_common::Hash256;
use weft_map::MapError;

use crate::entry::CodecError;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// An authenticated-map node is not present locally. The ledger must
    /// be acquired before the operation can succeed.
    #[error("missing map node {0}")]
    MissingMapNode(Hash256),

    /// Header decoded but one or both map roots could not be fetched.
    #[error("ledger {seq} is not fully loaded")]
    PartialLoad { seq: u32 },

    /// Recomputed identity hash disagrees with the expected one.
    #[error("ledger hash mismatch: expected {expected}, got {actual}")]
    HashMismatch { expected: Hash256, actual: Hash256 },

    /// Mutation attempted on an immutable ledger.
    #[error("ledger is immutable")]
    InvalidState,

    /// Validated-ledger persistence could not complete.
    #[error("failed to save ledger {seq}")]
    SaveFailed { seq: u32 },

    /// Entry codec failure.
    #[error("entry codec error: {0}")]
    Codec(#[from] CodecError),

    /// Other authenticated-map failure.
    #[error("map error: {0}")]
    Map(MapError),

    /// Index database failure.
    #[error("database error: {0}")]
    Database(#[from] weft_db::DbError),

    /// Invariant violation that should not happen.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<MapError> for LedgerError {
    fn from(err: MapError) -> Self {
        match err {
            MapError::MissingNode(hash) => LedgerError::MissingMapNode(hash),
            other => LedgerError::Map(other),
        }
    }
}
