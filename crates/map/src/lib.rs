//! Authenticated maps.
//!
//! Both halves of a ledger (the transaction map and the account-state map)
//! are authenticated maps: ordered maps from 256-bit keys to opaque items
//! whose contents roll up into a single root hash. The ledger core only
//! depends on the [`AuthMap`] trait; any structure providing ordered
//! iteration, copy-on-write snapshots, and deterministic root hashing is a
//! valid backing store.
//!
//! [`MemoryMap`] is the in-process implementation used in tests and
//! standalone operation. Its companion [`MemoryMapStore`] doubles as the
//! node archive that `fetch_root` reads frozen maps back out of.

mod memory;

use std::sync::Arc;

use thiserror::Error;
use weft_common::Hash256;
use weft_crypto::{sha512_half_multi, HashPrefix};

pub use memory::{MemoryMap, MemoryMapStore};

/// Which half of the ledger a map holds.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MapKind {
    /// Transactions applied in this ledger.
    Transaction,
    /// Account state as of this ledger.
    State,
}

impl MapKind {
    /// Domain tag for this map's leaf hashes.
    pub fn leaf_prefix(self) -> HashPrefix {
        match self {
            MapKind::Transaction => HashPrefix::TxNode,
            MapKind::State => HashPrefix::LeafNode,
        }
    }
}

/// One leaf of an authenticated map: a 256-bit key and an opaque payload.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct MapItem {
    key: Hash256,
    data: Vec<u8>,
}

impl MapItem {
    pub fn new(key: Hash256, data: Vec<u8>) -> Self {
        Self { key, data }
    }

    pub fn key(&self) -> Hash256 {
        self.key
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// The leaf hash: payload then key under the map kind's domain tag.
    pub fn leaf_hash(&self, kind: MapKind) -> Hash256 {
        sha512_half_multi(&[
            &kind.leaf_prefix().to_bytes(),
            &self.data,
            self.key.as_bytes(),
        ])
    }
}

/// Errors from authenticated-map operations.
#[derive(Debug, Error)]
pub enum MapError {
    /// A node referenced by the map is not present locally.
    #[error("missing map node {0}")]
    MissingNode(Hash256),

    /// Mutation attempted on an immutable map.
    #[error("map is immutable")]
    Immutable,

    /// `add` with a key that is already present.
    #[error("duplicate key {0}")]
    DuplicateKey(Hash256),

    /// `update` with a key that is not present.
    #[error("no item under key {0}")]
    MissingKey(Hash256),
}

/// Result type for map operations.
pub type Result<T> = std::result::Result<T, MapError>;

/// An authenticated, ordered map from 256-bit keys to opaque items.
///
/// Implementations synchronize internally: mutating operations take
/// `&self` and fail with [`MapError::Immutable`] once the map is frozen.
/// After `set_immutable` the map may be shared freely across threads.
pub trait AuthMap: Send + Sync {
    /// Which half of the ledger this map holds.
    fn kind(&self) -> MapKind;

    /// The current root hash. Zero for an empty map.
    fn root_hash(&self) -> Hash256;

    /// Whether the map has been frozen.
    fn is_immutable(&self) -> bool;

    /// Freeze the map. Idempotent.
    fn set_immutable(&self);

    /// A point-in-time copy sharing storage with this map. Writes to
    /// either side after the snapshot are invisible to the other.
    fn snapshot(&self, mutable: bool) -> Arc<dyn AuthMap>;

    /// Look up an item by key.
    fn get(&self, key: &Hash256) -> Result<Option<Arc<MapItem>>>;

    /// Whether an item exists under the key.
    fn has(&self, key: &Hash256) -> Result<bool>;

    /// Insert a new item. Fails if the key is already present.
    fn add(&self, item: MapItem) -> Result<()>;

    /// Replace an existing item. Fails if the key is absent.
    fn update(&self, item: MapItem) -> Result<()>;

    /// The item with the smallest key.
    fn first(&self) -> Result<Option<Arc<MapItem>>>;

    /// The item with the largest key.
    fn last(&self) -> Result<Option<Arc<MapItem>>>;

    /// The first item with a key strictly greater than `after`.
    fn next(&self, after: &Hash256) -> Result<Option<Arc<MapItem>>>;

    /// The last item with a key strictly smaller than `before`.
    fn prev(&self, before: &Hash256) -> Result<Option<Arc<MapItem>>>;

    /// Load the contents for `root` from the backing archive.
    ///
    /// Returns false when the root is unknown; the map then reports
    /// [`MapError::MissingNode`] from every read.
    fn fetch_root(&self, root: Hash256) -> bool;

    /// Visit every leaf in key order.
    fn visit_leaves(&self, f: &mut dyn FnMut(&Arc<MapItem>)) -> Result<()>;

    /// Hashes that must be fetched before the map is complete, up to `max`.
    fn needed_hashes(&self, max: usize) -> Vec<Hash256>;
}

/// Constructs maps for a ledger and backs their `fetch_root`.
pub trait MapStore: Send + Sync {
    /// Create a fresh, empty, mutable map.
    fn make(&self, kind: MapKind) -> Arc<dyn AuthMap>;
}

/// Fold leaf hashes into a root hash.
///
/// The empty map hashes to zero; otherwise the leaf hashes are concatenated
/// in key order under the inner-node tag.
pub(crate) fn fold_root(kind: MapKind, items: impl Iterator<Item = Hash256>) -> Hash256 {
    let mut chunks: Vec<[u8; 32]> = Vec::new();
    for leaf in items {
        chunks.push(leaf.0);
    }
    if chunks.is_empty() {
        return Hash256::ZERO;
    }
    let prefix = HashPrefix::InnerNode.to_bytes();
    let mut parts: Vec<&[u8]> = Vec::with_capacity(chunks.len() + 2);
    parts.push(&prefix);
    let kind_tag = [match kind {
        MapKind::Transaction => 1u8,
        MapKind::State => 2u8,
    }];
    parts.push(&kind_tag);
    for chunk in &chunks {
        parts.push(chunk);
    }
    sha512_half_multi(&parts)
}
