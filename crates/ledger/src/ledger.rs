//! The ledger object and its lifecycle.

use std::sync::Arc;
use std::sync::OnceLock;

use tracing::{debug, error, trace, warn};
use weft_common::protocol::{
    next_close_time_resolution, round_close_time, DEFAULT_CLOSE_TIME_RESOLUTION,
};
use weft_common::{AccountId, Config, Currency, Hash256, Timestamp};
use weft_map::{AuthMap, MapItem, MapKind, MapStore};

use crate::cache::EntryCache;
use crate::entry::{AccountRoot, EntryData, EntryKind, LedgerEntry};
use crate::fees::FeeSchedule;
use crate::header::{LedgerHeader, CLOSE_FLAG_NO_CONSENSUS_TIME};
use crate::indexes;
use crate::services::InboundLedgers;
use crate::tx::{decode_tx_item, encode_tx, encode_tx_with_meta, AcceptedTx, TxMeta};
use crate::{LedgerError, Result};

/// Whether `write_back` may create a missing entry.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum WriteMode {
    /// Create the entry if it is absent.
    Create,
    /// Only replace an existing entry.
    NoCreate,
}

/// Outcome of `write_back`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum WriteResult {
    /// The entry was created.
    Created,
    /// The entry was replaced.
    Ok,
    /// The entry was absent and creation was not requested.
    Missing,
    /// The write failed.
    Error,
}

/// One versioned snapshot of the world: a transaction map, a state map,
/// and the header binding them to the chain.
///
/// A ledger is owned by a single actor while mutable. `set_immutable` is
/// the publication point: afterwards the identity hash is final and the
/// ledger may be shared behind an `Arc` without further coordination.
pub struct Ledger {
    hash: Hash256,
    parent_hash: Hash256,
    tx_hash: Hash256,
    state_hash: Hash256,
    total_coins: u64,
    sequence: u32,
    close_time: u32,
    parent_close_time: u32,
    close_time_resolution: u8,
    close_flags: u8,

    closed: bool,
    accepted: bool,
    immutable: bool,
    validated: bool,

    fees: OnceLock<FeeSchedule>,

    txn_map: Arc<dyn AuthMap>,
    state_map: Arc<dyn AuthMap>,
    map_store: Arc<dyn MapStore>,
    entry_cache: EntryCache,
}

impl Ledger {
    /// The genesis ledger: sequence 1, all coins on one account.
    pub fn genesis(
        master: AccountId,
        start_amount: u64,
        map_store: Arc<dyn MapStore>,
    ) -> Result<Self> {
        let ledger = Self {
            hash: Hash256::ZERO,
            parent_hash: Hash256::ZERO,
            tx_hash: Hash256::ZERO,
            state_hash: Hash256::ZERO,
            total_coins: start_amount,
            sequence: 1,
            close_time: 0,
            parent_close_time: 0,
            close_time_resolution: DEFAULT_CLOSE_TIME_RESOLUTION,
            close_flags: 0,
            closed: false,
            accepted: false,
            immutable: false,
            validated: false,
            fees: OnceLock::new(),
            txn_map: map_store.make(MapKind::Transaction),
            state_map: map_store.make(MapKind::State),
            map_store,
            entry_cache: EntryCache::new(),
        };

        let root = LedgerEntry::new(
            indexes::account_index(&master),
            EntryData::AccountRoot(AccountRoot {
                account: master,
                balance: start_amount,
                sequence: 1,
                owner_count: 0,
                flags: 0,
            }),
        );
        trace!(account = %master, balance = start_amount, "genesis root account");
        match ledger.write_back(WriteMode::Create, &root) {
            WriteResult::Created => Ok(ledger),
            other => {
                error!(?other, "failed to seed genesis account");
                Err(LedgerError::Internal("genesis account not created".into()))
            }
        }
    }

    /// A mutable successor of `parent`.
    ///
    /// The successor snapshots the parent's state map copy-on-write and
    /// starts an empty transaction map. `now` supplies the wall clock used
    /// when the parent carries no close time.
    pub fn build_next(parent: &Ledger, now: Timestamp) -> Self {
        let sequence = parent.sequence + 1;
        let parent_hash = parent.hash();
        debug_assert!(!parent_hash.is_zero());

        let close_time_resolution = next_close_time_resolution(
            parent.close_time_resolution,
            parent.close_agree(),
            sequence,
        );
        let close_time = if parent.close_time == 0 {
            round_close_time(now, close_time_resolution)
        } else {
            parent.close_time + u32::from(close_time_resolution)
        };

        Self {
            hash: Hash256::ZERO,
            parent_hash,
            tx_hash: Hash256::ZERO,
            state_hash: Hash256::ZERO,
            total_coins: parent.total_coins,
            sequence,
            close_time,
            parent_close_time: parent.close_time,
            close_time_resolution,
            close_flags: 0,
            closed: false,
            accepted: false,
            immutable: false,
            validated: false,
            fees: OnceLock::new(),
            txn_map: parent.map_store.make(MapKind::Transaction),
            state_map: parent.state_map.snapshot(true),
            map_store: parent.map_store.clone(),
            entry_cache: parent.entry_cache.clone(),
        }
    }

    /// A copy of this ledger sharing the underlying maps copy-on-write.
    pub fn snapshot(&self, mutable: bool) -> Self {
        let mut copy = Self {
            hash: Hash256::ZERO,
            parent_hash: self.parent_hash,
            tx_hash: self.tx_hash,
            state_hash: self.state_hash,
            total_coins: self.total_coins,
            sequence: self.sequence,
            close_time: self.close_time,
            parent_close_time: self.parent_close_time,
            close_time_resolution: self.close_time_resolution,
            close_flags: self.close_flags,
            closed: self.closed,
            accepted: self.accepted,
            immutable: !mutable,
            validated: self.validated,
            fees: OnceLock::new(),
            txn_map: self.txn_map.snapshot(mutable),
            state_map: self.state_map.snapshot(mutable),
            map_store: self.map_store.clone(),
            entry_cache: self.entry_cache.clone(),
        };
        if let Some(fees) = self.fees.get() {
            let _ = copy.fees.set(*fees);
        }
        copy.tx_hash = copy.txn_map.root_hash();
        copy.state_hash = copy.state_map.root_hash();
        copy.hash = copy.header_from_fields().hash();
        copy
    }

    /// Rebuild a ledger from stored header fields.
    ///
    /// The maps are fetched from the map store's archive by root hash; the
    /// second return is false when either non-zero root could not be
    /// fetched, leaving the ledger partially loaded.
    pub fn from_header(header: LedgerHeader, map_store: Arc<dyn MapStore>) -> (Self, bool) {
        let txn_map = map_store.make(MapKind::Transaction);
        let state_map = map_store.make(MapKind::State);

        let mut loaded = true;
        if !txn_map.fetch_root(header.tx_hash) {
            warn!(seq = header.sequence, "no transaction root for ledger");
            loaded = false;
        }
        if !state_map.fetch_root(header.state_hash) {
            warn!(seq = header.sequence, "no state root for ledger");
            loaded = false;
        }
        txn_map.set_immutable();
        state_map.set_immutable();

        let ledger = Self {
            hash: header.hash(),
            parent_hash: header.parent_hash,
            tx_hash: header.tx_hash,
            state_hash: header.state_hash,
            total_coins: header.total_coins,
            sequence: header.sequence,
            close_time: header.close_time,
            parent_close_time: header.parent_close_time,
            close_time_resolution: header.close_time_resolution,
            close_flags: header.close_flags,
            closed: false,
            accepted: false,
            immutable: true,
            validated: false,
            fees: OnceLock::new(),
            txn_map,
            state_map,
            map_store,
            entry_cache: EntryCache::new(),
        };
        (ledger, loaded)
    }

    /// Decode a raw header (optionally prefixed) and attach its maps.
    pub fn decode(
        bytes: &[u8],
        has_prefix: bool,
        map_store: Arc<dyn MapStore>,
    ) -> Result<(Self, bool)> {
        let header = LedgerHeader::decode(bytes, has_prefix)?;
        Ok(Self::from_header(header, map_store))
    }

    // ------------------------------------------------------------------
    // Header access

    /// The header as currently observable.
    ///
    /// For a mutable ledger the map roots are read live; an immutable
    /// ledger serves the frozen fields.
    pub fn header(&self) -> LedgerHeader {
        if self.immutable {
            self.header_from_fields()
        } else {
            LedgerHeader {
                tx_hash: self.txn_map.root_hash(),
                state_hash: self.state_map.root_hash(),
                ..self.header_from_fields()
            }
        }
    }

    fn header_from_fields(&self) -> LedgerHeader {
        LedgerHeader {
            sequence: self.sequence,
            total_coins: self.total_coins,
            parent_hash: self.parent_hash,
            tx_hash: self.tx_hash,
            state_hash: self.state_hash,
            parent_close_time: self.parent_close_time,
            close_time: self.close_time,
            close_time_resolution: self.close_time_resolution,
            close_flags: self.close_flags,
        }
    }

    /// The identity hash. Recomputed on demand while mutable; final once
    /// immutable.
    pub fn hash(&self) -> Hash256 {
        if self.immutable {
            self.hash
        } else {
            self.header().hash()
        }
    }

    pub fn parent_hash(&self) -> Hash256 {
        self.parent_hash
    }

    pub fn tx_hash(&self) -> Hash256 {
        self.header().tx_hash
    }

    pub fn state_hash(&self) -> Hash256 {
        self.header().state_hash
    }

    pub fn sequence(&self) -> u32 {
        self.sequence
    }

    pub fn total_coins(&self) -> u64 {
        self.total_coins
    }

    pub fn close_time(&self) -> u32 {
        self.close_time
    }

    pub fn parent_close_time(&self) -> u32 {
        self.parent_close_time
    }

    pub fn close_time_resolution(&self) -> u8 {
        self.close_time_resolution
    }

    pub fn close_flags(&self) -> u8 {
        self.close_flags
    }

    /// Whether the close time was consensus-agreed.
    pub fn close_agree(&self) -> bool {
        self.close_flags & CLOSE_FLAG_NO_CONSENSUS_TIME == 0
    }

    // ------------------------------------------------------------------
    // Lifecycle

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn is_accepted(&self) -> bool {
        self.accepted
    }

    pub fn is_immutable(&self) -> bool {
        self.immutable
    }

    pub fn is_validated(&self) -> bool {
        self.validated
    }

    /// Closed or frozen: no further transactions.
    pub fn is_fixed(&self) -> bool {
        self.closed || self.immutable
    }

    /// Stop accepting transactions. The close time may still be
    /// re-rounded until the ledger is accepted.
    pub fn set_closed(&mut self) {
        self.closed = true;
    }

    /// Record external ratification of this ledger's hash.
    pub fn set_validated(&mut self) {
        self.validated = true;
    }

    /// Accept a closed ledger with the consensus close time.
    ///
    /// Rounds the close time when it was agreed (`correct_close_time`),
    /// otherwise records it verbatim under the no-consensus flag. Implies
    /// freezing.
    pub fn set_accepted(
        &mut self,
        close_time: u32,
        close_time_resolution: u8,
        correct_close_time: bool,
    ) {
        debug_assert!(self.closed && !self.accepted);
        self.close_time = if correct_close_time {
            round_close_time(close_time, close_time_resolution)
        } else {
            close_time
        };
        self.close_time_resolution = close_time_resolution;
        self.close_flags = if correct_close_time {
            0
        } else {
            CLOSE_FLAG_NO_CONSENSUS_TIME
        };
        self.accepted = true;
        self.set_immutable();
    }

    /// Accept a ledger acquired from the network, trusting its recorded
    /// close time.
    pub fn set_accepted_acquired(&mut self) {
        if self.close_agree() {
            self.close_time = round_close_time(self.close_time, self.close_time_resolution);
        }
        self.accepted = true;
        self.set_immutable();
    }

    /// Freeze the header and both maps; the identity hash becomes final.
    pub fn set_immutable(&mut self) {
        self.update_hash();
        self.immutable = true;
        self.txn_map.set_immutable();
        self.state_map.set_immutable();
    }

    /// Re-read the map roots and recompute the identity hash.
    pub fn update_hash(&mut self) {
        if !self.immutable {
            self.tx_hash = self.txn_map.root_hash();
            self.state_hash = self.state_map.root_hash();
        }
        self.hash = self.header_from_fields().hash();
    }

    /// Overwrite the close time on a mutable ledger.
    pub fn set_close_time(&mut self, close_time: u32) {
        debug_assert!(!self.immutable);
        if self.immutable {
            return;
        }
        self.close_time = close_time;
    }

    /// Burn `fee` drops from the total supply.
    pub fn destroy_coins(&mut self, fee: u64) {
        debug_assert!(!self.immutable);
        if self.immutable {
            return;
        }
        self.total_coins -= fee;
    }

    pub fn set_total_coins(&mut self, total_coins: u64) {
        debug_assert!(!self.immutable);
        if self.immutable {
            return;
        }
        self.total_coins = total_coins;
    }

    /// Whether trust-line freezes are enforced for this ledger.
    ///
    /// Enforcement is always on unless configuration disables it;
    /// standalone mode always enforces.
    pub fn enforce_freeze(&self, config: &Config) -> bool {
        config.run_standalone || config.enforce_freeze
    }

    // ------------------------------------------------------------------
    // Entry view

    /// Read an entry, immutable and cache-canonicalized.
    pub fn entry(&self, key: &Hash256) -> Result<Option<Arc<LedgerEntry>>> {
        let Some(item) = self.state_map.get(key)? else {
            return Ok(None);
        };
        let leaf_hash = item.leaf_hash(MapKind::State);
        if let Some(cached) = self.entry_cache.fetch(&leaf_hash) {
            return Ok(Some(cached));
        }
        let entry = LedgerEntry::decode(item.key(), item.data())?;
        Ok(Some(self.entry_cache.canonicalize(leaf_hash, entry)))
    }

    /// Read an entry as a fresh, mutable value.
    pub fn peek_entry(&self, key: &Hash256) -> Result<Option<LedgerEntry>> {
        let Some(item) = self.state_map.get(key)? else {
            return Ok(None);
        };
        Ok(Some(LedgerEntry::decode(item.key(), item.data())?))
    }

    /// Read an entry, requiring a kind. A stored entry of a different
    /// kind reads as absent.
    pub fn typed_entry(&self, key: &Hash256, kind: EntryKind) -> Result<Option<Arc<LedgerEntry>>> {
        match self.entry(key)? {
            Some(entry) if entry.kind() == kind => Ok(Some(entry)),
            Some(_) => Ok(None),
            None => Ok(None),
        }
    }

    /// Write an entry back into the state map.
    ///
    /// Writes are only legal on a mutable ledger; violating that is a
    /// programming error and reports [`WriteResult::Error`].
    pub fn write_back(&self, mode: WriteMode, entry: &LedgerEntry) -> WriteResult {
        if self.immutable {
            debug_assert!(false, "write_back on immutable ledger");
            return WriteResult::Error;
        }

        let key = entry.index();
        let exists = match self.state_map.has(&key) {
            Ok(exists) => exists,
            Err(err) => {
                warn!(%key, %err, "write_back lookup failed");
                return WriteResult::Error;
            }
        };

        if !exists && mode != WriteMode::Create {
            warn!(%key, "write_back of non-existent entry without create");
            return WriteResult::Missing;
        }

        let item = MapItem::new(key, entry.encode());
        if exists {
            match self.state_map.update(item) {
                Ok(()) => WriteResult::Ok,
                Err(err) => {
                    warn!(%key, %err, "write_back update failed");
                    debug_assert!(false);
                    WriteResult::Error
                }
            }
        } else {
            match self.state_map.add(item) {
                Ok(()) => WriteResult::Created,
                Err(err) => {
                    warn!(%key, %err, "write_back insert failed");
                    debug_assert!(false);
                    WriteResult::Error
                }
            }
        }
    }

    /// Insert an entry that must not already exist.
    pub fn add_state_entry(&self, entry: &LedgerEntry) -> Result<()> {
        if self.immutable {
            debug_assert!(false, "add_state_entry on immutable ledger");
            return Err(LedgerError::InvalidState);
        }
        self.state_map
            .add(MapItem::new(entry.index(), entry.encode()))?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Typed getters

    /// The account root for `account`, if present.
    pub fn account_root(&self, account: &AccountId) -> Result<Option<Arc<LedgerEntry>>> {
        self.typed_entry(&indexes::account_index(account), EntryKind::AccountRoot)
    }

    /// Whether `account` exists in this ledger.
    pub fn has_account(&self, account: &AccountId) -> Result<bool> {
        self.state_map
            .has(&indexes::account_index(account))
            .map_err(Into::into)
    }

    /// A directory page by key.
    pub fn dir_node(&self, key: &Hash256) -> Result<Option<Arc<LedgerEntry>>> {
        self.typed_entry(key, EntryKind::DirNode)
    }

    /// An offer by key.
    pub fn offer(&self, key: &Hash256) -> Result<Option<Arc<LedgerEntry>>> {
        self.typed_entry(key, EntryKind::Offer)
    }

    /// The offer created by `account` at `sequence`.
    pub fn offer_by(&self, account: &AccountId, sequence: u32) -> Result<Option<Arc<LedgerEntry>>> {
        self.offer(&indexes::offer_index(account, sequence))
    }

    /// The trust line between two accounts for a currency.
    pub fn ripple_state(
        &self,
        a: &AccountId,
        b: &AccountId,
        currency: &Currency,
    ) -> Result<Option<Arc<LedgerEntry>>> {
        self.typed_entry(
            &indexes::ripple_state_index(a, b, currency),
            EntryKind::RippleState,
        )
    }

    /// The generator map for `account`.
    pub fn generator(&self, account: &AccountId) -> Result<Option<Arc<LedgerEntry>>> {
        self.typed_entry(&indexes::generator_index(account), EntryKind::GeneratorMap)
    }

    // ------------------------------------------------------------------
    // Transaction map

    /// Add a transaction without metadata. Returns false if the id is
    /// already present.
    pub fn add_transaction(&self, id: Hash256, raw_tx: &[u8]) -> bool {
        if self.immutable {
            debug_assert!(false, "add_transaction on immutable ledger");
            return false;
        }
        match self.txn_map.add(MapItem::new(id, encode_tx(raw_tx))) {
            Ok(()) => true,
            Err(err) => {
                warn!(%id, %err, "transaction already in ledger");
                false
            }
        }
    }

    /// Add a transaction with its metadata. Returns false if the id is
    /// already present.
    pub fn add_transaction_with_meta(&self, id: Hash256, raw_tx: &[u8], meta: &TxMeta) -> bool {
        if self.immutable {
            debug_assert!(false, "add_transaction_with_meta on immutable ledger");
            return false;
        }
        match self
            .txn_map
            .add(MapItem::new(id, encode_tx_with_meta(raw_tx, meta)))
        {
            Ok(()) => true,
            Err(err) => {
                error!(%id, %err, "transaction+meta already in ledger");
                false
            }
        }
    }

    /// Whether a transaction is in this ledger.
    pub fn has_transaction(&self, id: &Hash256) -> Result<bool> {
        self.txn_map.has(id).map_err(Into::into)
    }

    /// Fetch a transaction and its metadata back out of the map.
    pub fn transaction(&self, id: &Hash256) -> Result<Option<AcceptedTx>> {
        let Some(item) = self.txn_map.get(id)? else {
            return Ok(None);
        };
        Ok(Some(decode_tx_item(item.key(), item.data())?))
    }

    /// Every transaction in the ledger, ordered by ledger position.
    ///
    /// Fails with [`LedgerError::MissingMapNode`] when the transaction map
    /// is not fully local.
    pub fn accepted_transactions(&self) -> Result<Vec<AcceptedTx>> {
        let mut out = Vec::new();
        let mut codec_error = None;
        self.txn_map.visit_leaves(&mut |item| {
            if codec_error.is_some() {
                return;
            }
            match decode_tx_item(item.key(), item.data()) {
                Ok(tx) => out.push(tx),
                Err(err) => codec_error = Some(err),
            }
        })?;
        if let Some(err) = codec_error {
            return Err(err.into());
        }
        out.sort_by_key(|tx| {
            (
                tx.meta
                    .as_ref()
                    .map(|meta| meta.transaction_index)
                    .unwrap_or(u32::MAX),
                tx.id,
            )
        });
        Ok(out)
    }

    // ------------------------------------------------------------------
    // Ordered state navigation

    /// Smallest state key.
    pub fn first_state_index(&self) -> Result<Option<Hash256>> {
        Ok(self.state_map.first()?.map(|item| item.key()))
    }

    /// Largest state key.
    pub fn last_state_index(&self) -> Result<Option<Hash256>> {
        Ok(self.state_map.last()?.map(|item| item.key()))
    }

    /// First state key strictly greater than `after`.
    pub fn next_state_index(&self, after: &Hash256) -> Result<Option<Hash256>> {
        Ok(self.state_map.next(after)?.map(|item| item.key()))
    }

    /// First state key strictly greater than `after` and not past `end`.
    pub fn next_state_index_bounded(
        &self,
        after: &Hash256,
        end: &Hash256,
    ) -> Result<Option<Hash256>> {
        Ok(self
            .next_state_index(after)?
            .filter(|key| key <= end))
    }

    /// Last state key strictly smaller than `before`.
    pub fn prev_state_index(&self, before: &Hash256) -> Result<Option<Hash256>> {
        Ok(self.state_map.prev(before)?.map(|item| item.key()))
    }

    /// Visit every state entry in key order.
    ///
    /// On a missing map node the inbound-ledger collaborator (when given)
    /// is asked to acquire this ledger before the error is surfaced.
    pub fn visit_state_entries(
        &self,
        inbound: Option<&dyn InboundLedgers>,
        f: &mut dyn FnMut(Arc<LedgerEntry>),
    ) -> Result<()> {
        let mut codec_error = None;
        let walk = self.state_map.visit_leaves(&mut |item| {
            if codec_error.is_some() {
                return;
            }
            match LedgerEntry::decode(item.key(), item.data()) {
                Ok(entry) => f(Arc::new(entry)),
                Err(err) => codec_error = Some(err),
            }
        });

        if let Err(err) = walk {
            let hash = self.hash();
            if !hash.is_zero() {
                if let Some(inbound) = inbound {
                    inbound.acquire(hash, self.sequence);
                }
            }
            return Err(err.into());
        }
        if let Some(err) = codec_error {
            return Err(err.into());
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Sync support

    /// Transaction-map hashes still needed locally.
    pub fn needed_transaction_hashes(&self, max: usize) -> Vec<Hash256> {
        self.txn_map.needed_hashes(max)
    }

    /// State-map hashes still needed locally.
    pub fn needed_state_hashes(&self, max: usize) -> Vec<Hash256> {
        self.state_map.needed_hashes(max)
    }

    /// Whether both maps are fully local.
    pub fn walk_maps(&self) -> bool {
        let missing_state = self.needed_state_hashes(32);
        if !missing_state.is_empty() {
            debug!(count = missing_state.len(), "missing state node(s)");
        }
        let missing_tx = self.needed_transaction_hashes(32);
        if !missing_tx.is_empty() {
            debug!(count = missing_tx.len(), "missing transaction node(s)");
        }
        missing_state.is_empty() && missing_tx.is_empty()
    }

    /// Consistency check between the header fields and the map roots.
    pub fn assert_sane(&self) -> bool {
        let header = self.header();
        let sane = !self.hash().is_zero()
            && !header.state_hash.is_zero()
            && header.state_hash == self.state_map.root_hash()
            && header.tx_hash == self.txn_map.root_hash();
        if !sane {
            error!(
                seq = self.sequence,
                state_hash = %header.state_hash,
                tx_hash = %header.tx_hash,
                "ledger is not sane"
            );
            debug_assert!(false, "ledger is not sane");
        }
        sane
    }

    pub(crate) fn fee_cell(&self) -> &OnceLock<FeeSchedule> {
        &self.fees
    }
}

impl std::fmt::Debug for Ledger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ledger")
            .field("sequence", &self.sequence)
            .field("hash", &self.hash())
            .field("parent_hash", &self.parent_hash)
            .field("closed", &self.closed)
            .field("accepted", &self.accepted)
            .field("immutable", &self.immutable)
            .field("validated", &self.validated)
            .finish_non_exhaustive()
    }
}
