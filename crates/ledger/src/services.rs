//! Collaborator interfaces.
//!
//! The core delegates everything with an external life (node storage,
//! duplicate suppression, save notifications, ledger acquisition, load
//! scaling) to these traits. The in-process implementations below are
//! what standalone mode and the test suites run against.

use std::collections::HashMap;

use parking_lot::Mutex;
use weft_common::Hash256;

/// Hash-router flag: the object has been handed to persistence.
pub const SF_SAVED: u32 = 0x0001;

/// What a stored blob is.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum NodeKind {
    /// A prefixed ledger header.
    Ledger,
    /// A state-map node.
    AccountNode,
    /// A transaction-map node.
    TransactionNode,
}

/// Write interface of the external node store.
pub trait NodeStore: Send + Sync {
    /// Store `bytes` under `hash`, tagged with its kind and the sequence
    /// of the ledger it belongs to.
    fn store(&self, kind: NodeKind, ledger_seq: u32, bytes: Vec<u8>, hash: Hash256);
}

/// In-memory node store.
#[derive(Default)]
pub struct MemoryNodeStore {
    inner: Mutex<HashMap<Hash256, (NodeKind, u32, Vec<u8>)>>,
}

impl MemoryNodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch stored bytes by hash.
    pub fn fetch(&self, hash: &Hash256) -> Option<Vec<u8>> {
        self.inner.lock().get(hash).map(|(_, _, bytes)| bytes.clone())
    }

    /// Number of stored objects.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

impl NodeStore for MemoryNodeStore {
    fn store(&self, kind: NodeKind, ledger_seq: u32, bytes: Vec<u8>, hash: Hash256) {
        self.inner.lock().insert(hash, (kind, ledger_seq, bytes));
    }
}

/// Per-hash flag registry used to suppress duplicate work.
pub trait HashRouter: Send + Sync {
    /// Set `flag` on `hash`. Returns false when the flag was already set.
    fn set_flag(&self, hash: Hash256, flag: u32) -> bool;
}

/// In-memory hash router.
#[derive(Default)]
pub struct MemoryHashRouter {
    flags: Mutex<HashMap<Hash256, u32>>,
}

impl MemoryHashRouter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HashRouter for MemoryHashRouter {
    fn set_flag(&self, hash: Hash256, flag: u32) -> bool {
        let mut flags = self.flags.lock();
        let entry = flags.entry(hash).or_insert(0);
        if *entry & flag == flag {
            return false;
        }
        *entry |= flag;
        true
    }
}

/// Receives the outcome of failed persistence attempts.
pub trait SaveObserver: Send + Sync {
    /// A validated ledger could not be saved.
    fn failed_save(&self, _ledger_seq: u32, _hash: Hash256) {}
}

/// Observer that ignores everything.
#[derive(Default)]
pub struct NullSaveObserver;

impl SaveObserver for NullSaveObserver {}

/// Requests acquisition of a ledger whose nodes are missing locally.
pub trait InboundLedgers: Send + Sync {
    fn acquire(&self, hash: Hash256, ledger_seq: u32);
}

/// Scales fees by server load.
pub trait LoadFeeTrack: Send + Sync {
    /// Convert a fee in fee units to drops at the reference load.
    fn scale_fee_base(&self, fee: u64, base_fee: u64, reference_fee_units: u32) -> u64;

    /// Convert a fee in fee units to drops at the current load. Admin
    /// requests bypass the load factor.
    fn scale_fee_load(&self, fee: u64, base_fee: u64, reference_fee_units: u32, admin: bool)
        -> u64;
}

/// Load tracker with a fixed load factor.
pub struct StaticFeeTrack {
    load_factor: u32,
    load_base: u32,
}

impl StaticFeeTrack {
    pub fn new(load_factor: u32, load_base: u32) -> Self {
        Self {
            load_factor,
            load_base: load_base.max(1),
        }
    }
}

impl Default for StaticFeeTrack {
    fn default() -> Self {
        Self::new(256, 256)
    }
}

impl LoadFeeTrack for StaticFeeTrack {
    fn scale_fee_base(&self, fee: u64, base_fee: u64, reference_fee_units: u32) -> u64 {
        mul_div(fee, base_fee, u64::from(reference_fee_units.max(1)))
    }

    fn scale_fee_load(
        &self,
        fee: u64,
        base_fee: u64,
        reference_fee_units: u32,
        admin: bool,
    ) -> u64 {
        let base = self.scale_fee_base(fee, base_fee, reference_fee_units);
        if admin {
            return base;
        }
        mul_div(base, u64::from(self.load_factor), u64::from(self.load_base))
    }
}

fn mul_div(value: u64, mul: u64, div: u64) -> u64 {
    ((value as u128 * mul as u128) / div as u128) as u64
}
