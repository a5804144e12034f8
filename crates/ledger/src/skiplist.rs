//! On-ledger skip list.
//!
//! Two state entries let any ledger answer "what is the hash of ledger N"
//! for historical N: a *dense* list holding the most recent (up to 256)
//! ledger hashes, and a *sparse* list holding one hash per 256-ledger
//! epoch. Both are maintained on the child ledger at construction time,
//! recording the parent's hash, so the data a ledger carries always
//! describes its ancestors.

use tracing::warn;
use weft_common::Hash256;

use crate::entry::{EntryData, EntryKind, LedgerEntry, LedgerHashes};
use crate::indexes;
use crate::ledger::{Ledger, WriteMode, WriteResult};
use crate::Result;

/// Capacity of the dense list.
const DENSE_LIST_SIZE: usize = 256;

impl Ledger {
    /// Record the parent's hash in the skip-list entries.
    ///
    /// Call once on a freshly built child, before it closes. The dense
    /// list always receives the parent hash (evicting the oldest once
    /// full); the sparse list receives it only when the parent sits on a
    /// 256-ledger epoch boundary.
    pub fn update_skip_list(&self) -> Result<()> {
        if self.sequence() == 1 {
            // Genesis has no previous ledger.
            return Ok(());
        }

        let prev_seq = self.sequence() - 1;
        let parent_hash = self.parent_hash();

        if prev_seq & 0xff == 0 {
            let key = indexes::skip_list_index_for(prev_seq);
            let mut list = self.read_hash_list(&key)?.unwrap_or_default();
            debug_assert!(list.hashes.len() <= DENSE_LIST_SIZE);
            list.hashes.push(parent_hash);
            list.last_ledger_sequence = prev_seq;
            self.store_hash_list(key, list)?;
        }

        let key = indexes::skip_list_index();
        let mut list = self.read_hash_list(&key)?.unwrap_or_default();
        debug_assert!(list.hashes.len() <= DENSE_LIST_SIZE);
        if list.hashes.len() == DENSE_LIST_SIZE {
            list.hashes.remove(0);
        }
        list.hashes.push(parent_hash);
        list.last_ledger_sequence = prev_seq;
        self.store_hash_list(key, list)
    }

    /// The hash of ledger `seq`, if this ledger can answer it.
    ///
    /// Resolution ladder: the future is unknowable; self and parent come
    /// from the header; the last 256 ledgers come from the dense list;
    /// epoch boundaries within ~16.7M ledgers come from the sparse list.
    pub fn ledger_hash(&self, seq: u32) -> Result<Option<Hash256>> {
        if seq > self.sequence() {
            warn!(
                want = seq,
                have = self.sequence(),
                "ledger hash requested from the future"
            );
            return Ok(None);
        }
        if seq == self.sequence() {
            return Ok(Some(self.hash()));
        }
        if seq == self.sequence() - 1 {
            return Ok(Some(self.parent_hash()));
        }

        let diff = (self.sequence() - seq) as usize;
        if diff <= DENSE_LIST_SIZE {
            if let Some(list) = self.read_hash_list(&indexes::skip_list_index())? {
                debug_assert_eq!(list.last_ledger_sequence, self.sequence() - 1);
                if list.hashes.len() >= diff {
                    return Ok(Some(list.hashes[list.hashes.len() - diff]));
                }
                warn!(
                    seq,
                    have = list.hashes.len(),
                    diff,
                    "dense skip list too short"
                );
            } else {
                warn!(seq = self.sequence(), "dense skip list missing");
            }
        }

        if seq & 0xff != 0 {
            return Ok(None);
        }

        if let Some(list) = self.read_hash_list(&indexes::skip_list_index_for(seq))? {
            let last = list.last_ledger_sequence;
            debug_assert!(last >= seq);
            debug_assert_eq!(last & 0xff, 0);
            let offset = ((last - seq) >> 8) as usize;
            if list.hashes.len() > offset {
                return Ok(Some(list.hashes[list.hashes.len() - offset - 1]));
            }
        }

        warn!(want = seq, have = self.sequence(), "ledger hash unavailable");
        Ok(None)
    }

    /// Every (sequence, hash) pair in the dense list, oldest first.
    pub fn ledger_hashes(&self) -> Result<Vec<(u32, Hash256)>> {
        let Some(list) = self.read_hash_list(&indexes::skip_list_index())? else {
            return Ok(Vec::new());
        };
        let mut seq = list.last_ledger_sequence - list.hashes.len() as u32;
        Ok(list
            .hashes
            .into_iter()
            .map(|hash| {
                seq += 1;
                (seq, hash)
            })
            .collect())
    }

    /// Amendments enabled as of this ledger.
    pub fn amendments(&self) -> Result<Vec<Hash256>> {
        match self.typed_entry(&indexes::amendment_index(), EntryKind::Amendments)? {
            Some(entry) => Ok(entry
                .as_amendments()
                .expect("typed as Amendments")
                .amendments
                .clone()),
            None => Ok(Vec::new()),
        }
    }

    fn read_hash_list(&self, key: &Hash256) -> Result<Option<LedgerHashes>> {
        match self.typed_entry(key, EntryKind::LedgerHashes)? {
            Some(entry) => Ok(Some(
                entry
                    .as_ledger_hashes()
                    .expect("typed as LedgerHashes")
                    .clone(),
            )),
            None => Ok(None),
        }
    }

    fn store_hash_list(&self, key: Hash256, list: LedgerHashes) -> Result<()> {
        let entry = LedgerEntry::new(key, EntryData::LedgerHashes(list));
        match self.write_back(WriteMode::Create, &entry) {
            WriteResult::Created | WriteResult::Ok => Ok(()),
            other => {
                warn!(?other, "skip list write failed");
                debug_assert!(false, "skip list write failed");
                Err(crate::LedgerError::Internal("skip list write failed".into()))
            }
        }
    }
}
