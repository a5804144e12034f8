//! Common types for the weft ledger core.
//!
//! This crate holds the primitive value types shared by every other crate
//! (hashes, account and currency identifiers, order-book descriptors), the
//! protocol timing rules for ledger close, and the node configuration.

pub mod config;
pub mod protocol;
pub mod time;
mod types;

pub use config::Config;
pub use types::{AccountId, Amount, Book, Currency, Hash256, Issue};

/// Ledger sequence number. 1 at genesis, monotonically increasing.
pub type LedgerSeq = u32;

/// Seconds since the protocol epoch (see [`time::EPOCH_OFFSET`]).
pub type Timestamp = u32;
