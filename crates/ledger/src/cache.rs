//! Canonicalizing entry cache.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use weft_common::Hash256;

use crate::entry::LedgerEntry;

/// Shared cache of decoded, immutable ledger entries keyed by leaf hash.
///
/// Reads through the entry view canonicalize here: the first decode of a
/// given leaf wins and every later read of the same bytes returns the same
/// `Arc`. Keying by leaf hash (not entry key) means snapshots and children
/// sharing unchanged items also share the decoded form.
#[derive(Clone, Default)]
pub struct EntryCache {
    inner: Arc<Mutex<HashMap<Hash256, Arc<LedgerEntry>>>>,
}

impl EntryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a previously canonicalized entry.
    pub fn fetch(&self, leaf_hash: &Hash256) -> Option<Arc<LedgerEntry>> {
        self.inner.lock().get(leaf_hash).cloned()
    }

    /// Install `entry` under `leaf_hash` unless one is already there;
    /// returns the canonical copy either way.
    pub fn canonicalize(&self, leaf_hash: Hash256, entry: LedgerEntry) -> Arc<LedgerEntry> {
        self.inner
            .lock()
            .entry(leaf_hash)
            .or_insert_with(|| Arc::new(entry))
            .clone()
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{Amendments, EntryData};

    #[test]
    fn canonicalize_returns_first_installed() {
        let cache = EntryCache::new();
        let key = Hash256::from_bytes([1; 32]);
        let entry = LedgerEntry::new(key, EntryData::Amendments(Amendments::default()));

        let first = cache.canonicalize(Hash256::from_bytes([9; 32]), entry.clone());
        let second = cache.canonicalize(Hash256::from_bytes([9; 32]), entry);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
        assert!(cache.fetch(&Hash256::from_bytes([9; 32])).is_some());
        assert!(cache.fetch(&Hash256::from_bytes([8; 32])).is_none());
    }
}
