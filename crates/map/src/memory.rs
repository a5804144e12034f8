//! In-memory authenticated map with copy-on-write snapshots.

use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::debug;
use weft_common::Hash256;

use crate::{fold_root, AuthMap, MapError, MapItem, MapKind, MapStore, Result};

type Entries = BTreeMap<Hash256, Arc<MapItem>>;

/// Shared archive of frozen map contents, keyed by root hash.
///
/// Acts as the map factory for a process: maps created through it register
/// their contents when frozen, and `fetch_root` on any map from the same
/// store can later rebuild them. Cloning is cheap and shares the archive.
#[derive(Clone, Default)]
pub struct MemoryMapStore {
    archive: Arc<Mutex<HashMap<Hash256, Entries>>>,
}

impl MemoryMapStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of frozen roots held.
    pub fn archived_roots(&self) -> usize {
        self.archive.lock().len()
    }

    fn register(&self, root: Hash256, entries: &Entries) {
        if root.is_zero() {
            return;
        }
        self.archive
            .lock()
            .entry(root)
            .or_insert_with(|| entries.clone());
    }

    fn lookup(&self, root: &Hash256) -> Option<Entries> {
        self.archive.lock().get(root).cloned()
    }
}

impl MapStore for MemoryMapStore {
    fn make(&self, kind: MapKind) -> Arc<dyn AuthMap> {
        Arc::new(MemoryMap {
            kind,
            store: self.clone(),
            inner: RwLock::new(Inner {
                entries: BTreeMap::new(),
                immutable: false,
                missing_root: None,
            }),
        })
    }
}

struct Inner {
    entries: Entries,
    immutable: bool,
    /// Set when the map was pointed at a root the archive does not hold.
    missing_root: Option<Hash256>,
}

impl Inner {
    fn complete(&self) -> Result<&Entries> {
        match self.missing_root {
            Some(root) => Err(MapError::MissingNode(root)),
            None => Ok(&self.entries),
        }
    }
}

/// In-memory [`AuthMap`].
///
/// Items are reference-counted, so snapshots share item storage and only
/// the key map is copied. The root hash is recomputed from the leaves on
/// demand.
pub struct MemoryMap {
    kind: MapKind,
    store: MemoryMapStore,
    inner: RwLock<Inner>,
}

impl AuthMap for MemoryMap {
    fn kind(&self) -> MapKind {
        self.kind
    }

    fn root_hash(&self) -> Hash256 {
        let inner = self.inner.read();
        if let Some(root) = inner.missing_root {
            return root;
        }
        fold_root(
            self.kind,
            inner.entries.values().map(|item| item.leaf_hash(self.kind)),
        )
    }

    fn is_immutable(&self) -> bool {
        self.inner.read().immutable
    }

    fn set_immutable(&self) {
        let mut inner = self.inner.write();
        inner.immutable = true;
        if inner.missing_root.is_none() {
            let root = fold_root(
                self.kind,
                inner.entries.values().map(|item| item.leaf_hash(self.kind)),
            );
            self.store.register(root, &inner.entries);
        }
    }

    fn snapshot(&self, mutable: bool) -> Arc<dyn AuthMap> {
        let inner = self.inner.read();
        let copy = Inner {
            entries: inner.entries.clone(),
            immutable: !mutable,
            missing_root: inner.missing_root,
        };
        if copy.immutable && copy.missing_root.is_none() {
            let root = fold_root(
                self.kind,
                copy.entries.values().map(|item| item.leaf_hash(self.kind)),
            );
            self.store.register(root, &copy.entries);
        }
        Arc::new(MemoryMap {
            kind: self.kind,
            store: self.store.clone(),
            inner: RwLock::new(copy),
        })
    }

    fn get(&self, key: &Hash256) -> Result<Option<Arc<MapItem>>> {
        let inner = self.inner.read();
        Ok(inner.complete()?.get(key).cloned())
    }

    fn has(&self, key: &Hash256) -> Result<bool> {
        let inner = self.inner.read();
        Ok(inner.complete()?.contains_key(key))
    }

    fn add(&self, item: MapItem) -> Result<()> {
        let mut inner = self.inner.write();
        if inner.immutable {
            debug_assert!(false, "add to immutable map");
            return Err(MapError::Immutable);
        }
        inner.complete()?;
        let key = item.key();
        if inner.entries.contains_key(&key) {
            return Err(MapError::DuplicateKey(key));
        }
        inner.entries.insert(key, Arc::new(item));
        Ok(())
    }

    fn update(&self, item: MapItem) -> Result<()> {
        let mut inner = self.inner.write();
        if inner.immutable {
            debug_assert!(false, "update of immutable map");
            return Err(MapError::Immutable);
        }
        inner.complete()?;
        let key = item.key();
        if !inner.entries.contains_key(&key) {
            return Err(MapError::MissingKey(key));
        }
        inner.entries.insert(key, Arc::new(item));
        Ok(())
    }

    fn first(&self) -> Result<Option<Arc<MapItem>>> {
        let inner = self.inner.read();
        Ok(inner.complete()?.values().next().cloned())
    }

    fn last(&self) -> Result<Option<Arc<MapItem>>> {
        let inner = self.inner.read();
        Ok(inner.complete()?.values().next_back().cloned())
    }

    fn next(&self, after: &Hash256) -> Result<Option<Arc<MapItem>>> {
        let inner = self.inner.read();
        Ok(inner
            .complete()?
            .range((Bound::Excluded(*after), Bound::Unbounded))
            .map(|(_, item)| item.clone())
            .next())
    }

    fn prev(&self, before: &Hash256) -> Result<Option<Arc<MapItem>>> {
        let inner = self.inner.read();
        Ok(inner
            .complete()?
            .range((Bound::Unbounded, Bound::Excluded(*before)))
            .map(|(_, item)| item.clone())
            .next_back())
    }

    fn fetch_root(&self, root: Hash256) -> bool {
        let mut inner = self.inner.write();
        if root.is_zero() {
            inner.entries.clear();
            inner.missing_root = None;
            return true;
        }
        match self.store.lookup(&root) {
            Some(entries) => {
                inner.entries = entries;
                inner.missing_root = None;
                true
            }
            None => {
                debug!(root = %root, "map root not in archive");
                inner.entries.clear();
                inner.missing_root = Some(root);
                false
            }
        }
    }

    fn visit_leaves(&self, f: &mut dyn FnMut(&Arc<MapItem>)) -> Result<()> {
        let inner = self.inner.read();
        for item in inner.complete()?.values() {
            f(item);
        }
        Ok(())
    }

    fn needed_hashes(&self, max: usize) -> Vec<Hash256> {
        let inner = self.inner.read();
        match inner.missing_root {
            Some(root) if max > 0 => vec![root],
            _ => Vec::new(),
        }
    }
}
