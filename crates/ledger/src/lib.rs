//! Ledger core.
//!
//! A ledger is one consensus-agreed snapshot of the world: a transaction
//! map and an account-state map (both authenticated maps from `weft-map`),
//! plus a small header tying them to the previous ledger and to the close
//! time. This crate provides:
//!
//! - the content-addressed key derivation for every ledger-entry kind
//!   ([`indexes`]);
//! - the canonical 118-byte header codec and identity hash ([`header`]);
//! - the typed ledger-entry model and its codec ([`entry`]);
//! - the [`Ledger`] object itself: constructors, the mutability state
//!   machine, the cached entry view, directory and order-book traversal,
//!   and the skip list;
//! - the lazily cached fee view ([`fees`]);
//! - the pending-save gate and validated-ledger persistence ([`save`]).
//!
//! # Lifecycle
//!
//! A ledger starts *open*. Closing it stops transaction intake; accepting
//! it rounds the close time and freezes it; freezing publishes it. After
//! `set_immutable` the identity hash is final and the ledger may be shared
//! across threads without coordination. None of the lifecycle flags is
//! ever cleared.

mod cache;
mod dir;
mod entry;
mod error;
mod fees;
mod header;
pub mod indexes;
mod ledger;
mod save;
mod services;
mod skiplist;
mod tx;

pub use cache::EntryCache;
pub use entry::{
    AccountRoot, Amendments, BookAnnotation, CodecError, DirNode, EntryData, EntryKind,
    FeeSettings, GeneratorMap, LedgerEntry, LedgerHashes, Offer, RippleState, Ticket,
};
pub use error::LedgerError;
pub use fees::FeeSchedule;
pub use header::{LedgerHeader, CLOSE_FLAG_NO_CONSENSUS_TIME, HEADER_SIZE};
pub use ledger::{Ledger, WriteMode, WriteResult};
pub use save::{pending_saves, SaveContext};
pub use services::{
    HashRouter, InboundLedgers, LoadFeeTrack, MemoryHashRouter, MemoryNodeStore, NodeKind,
    NodeStore, NullSaveObserver, SaveObserver, StaticFeeTrack, SF_SAVED,
};
pub use tx::{AcceptedTx, TxMeta};

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;
