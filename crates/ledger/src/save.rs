//! Validated-ledger persistence and the pending-save gate.
//!
//! Saving a validated ledger is idempotent at two levels: a per-hash flag
//! on the hash router catches repeat submissions of the same ledger, and
//! a process-wide set of in-flight sequences catches concurrent ones. The
//! save itself writes the prefixed header to the node store and then the
//! relational rows in a single database transaction; on any failure the
//! sequence leaves the pending set so the save can be retried.

use std::collections::BTreeSet;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, error, trace, warn};
use weft_common::Hash256;
use weft_db::{AccountTxRow, Database, LedgerQueries, LedgerRow, TxQueries, TxRow};
use weft_map::MapStore;
use weft_work::{JobKind, JobQueue};

use crate::header::LedgerHeader;
use crate::ledger::Ledger;
use crate::services::{HashRouter, NodeKind, NodeStore, SaveObserver, SF_SAVED};
use crate::{LedgerError, Result};

/// Ledgers handed to persistence whose database rows are not yet
/// trustworthy.
static PENDING_SAVES: Mutex<BTreeSet<u32>> = Mutex::new(BTreeSet::new());

/// Snapshot of the sequences currently being saved.
pub fn pending_saves() -> BTreeSet<u32> {
    PENDING_SAVES.lock().clone()
}

fn finish_pending(seq: u32) {
    PENDING_SAVES.lock().remove(&seq);
}

/// Everything `pend_save` needs to reach the outside world.
pub struct SaveContext {
    pub node_store: Arc<dyn NodeStore>,
    pub db: Database,
    pub job_queue: Arc<JobQueue>,
    pub hash_router: Arc<dyn HashRouter>,
    pub observer: Arc<dyn SaveObserver>,
}

impl Ledger {
    /// Save, or arrange to save, a fully validated ledger.
    ///
    /// Requires the ledger to be immutable. A redundant call (same hash
    /// already flagged, or the sequence already pending) succeeds without
    /// scheduling more work. Asynchronous saves are queued with current
    /// ledgers ahead of old ones.
    pub fn pend_save(
        self: Arc<Self>,
        ctx: &Arc<SaveContext>,
        is_synchronous: bool,
        is_current: bool,
    ) -> bool {
        if !ctx.hash_router.set_flag(self.hash(), SF_SAVED) {
            debug!(seq = self.sequence(), "double pend save");
            return true;
        }

        debug_assert!(self.is_immutable());

        if !PENDING_SAVES.lock().insert(self.sequence()) {
            debug!(seq = self.sequence(), "pend save with sequence already pending");
            return true;
        }

        if is_synchronous {
            return self.save_validated(ctx, is_current);
        }

        let ctx = ctx.clone();
        let queue = ctx.job_queue.clone();
        let (kind, name) = if is_current {
            (JobKind::PublishLedger, "ledger.pend_save")
        } else {
            (JobKind::PublishOldLedger, "ledger.pend_old_save")
        };
        queue.add_job(kind, name, move || {
            self.save_validated(&ctx, is_current);
        });
        true
    }

    /// Write this validated ledger to the node store and index database.
    ///
    /// Returns false on failure; the failure is also reported through the
    /// save observer, and the sequence is removed from the pending set
    /// either way.
    pub fn save_validated(&self, ctx: &SaveContext, current: bool) -> bool {
        trace!(
            seq = self.sequence(),
            from_acquire = !current,
            "save validated ledger"
        );
        let header = self.header();
        let hash = self.hash();
        let seq = self.sequence();

        if header.state_hash.is_zero() {
            error!(seq, "state hash is zero");
            debug_assert!(false, "saving ledger with zero state hash");
        }
        debug_assert!(self.assert_sane());

        // The raw header goes to the node store first; the relational rows
        // only index it.
        ctx.node_store
            .store(NodeKind::Ledger, seq, header.encode_prefixed(), hash);

        let transactions = match self.accepted_transactions() {
            Ok(transactions) => transactions,
            Err(err) => {
                warn!(seq, %err, "an accepted ledger was missing nodes");
                ctx.observer.failed_save(seq, hash);
                finish_pending(seq);
                return false;
            }
        };

        let result = ctx.db.transaction(|conn| {
            conn.delete_ledger(seq)?;
            conn.delete_transactions_for(seq)?;
            conn.delete_account_transactions_for(seq)?;

            for (position, tx) in transactions.iter().enumerate() {
                conn.delete_account_transactions_by_tx(&tx.id)?;

                let txn_seq = tx
                    .meta
                    .as_ref()
                    .map(|meta| meta.transaction_index)
                    .unwrap_or(position as u32);

                match &tx.meta {
                    Some(meta) if !meta.affected_accounts.is_empty() => {
                        for account in &meta.affected_accounts {
                            conn.insert_account_transaction(&AccountTxRow {
                                trans_id: tx.id,
                                account: *account,
                                ledger_seq: seq,
                                txn_seq,
                            })?;
                        }
                    }
                    _ => {
                        warn!(seq, id = %tx.id, "transaction affects no accounts");
                    }
                }

                conn.insert_transaction(&TxRow {
                    trans_id: tx.id,
                    ledger_seq: seq,
                    status: 'V',
                    raw_txn: tx.raw_tx.clone(),
                    txn_meta: tx.meta_bytes.clone(),
                })?;
            }

            conn.store_ledger(&LedgerRow {
                ledger_hash: hash,
                ledger_seq: seq,
                prev_hash: header.parent_hash,
                total_coins: header.total_coins,
                closing_time: header.close_time,
                prev_closing_time: header.parent_close_time,
                close_time_res: header.close_time_resolution,
                close_flags: header.close_flags,
                account_set_hash: header.state_hash,
                trans_set_hash: header.tx_hash,
            })?;
            Ok(())
        });

        if let Err(err) = result {
            warn!(seq, %err, "index database write failed");
            ctx.observer.failed_save(seq, hash);
            finish_pending(seq);
            return false;
        }

        // Clients can now trust the database for this sequence.
        finish_pending(seq);
        true
    }

    /// Load a validated ledger from the index database by sequence.
    pub fn load_by_index(
        db: &Database,
        map_store: Arc<dyn MapStore>,
        seq: u32,
    ) -> Result<Option<Ledger>> {
        let Some(row) = db.with_connection(|conn| conn.load_ledger_by_seq(seq))? else {
            return Ok(None);
        };
        Self::from_row(row, map_store).map(Some)
    }

    /// Load a validated ledger from the index database by identity hash.
    pub fn load_by_hash(
        db: &Database,
        map_store: Arc<dyn MapStore>,
        hash: &Hash256,
    ) -> Result<Option<Ledger>> {
        let Some(row) = db.with_connection(|conn| conn.load_ledger_by_hash(hash))? else {
            return Ok(None);
        };
        let ledger = Self::from_row(row, map_store)?;
        debug_assert_eq!(ledger.hash(), *hash);
        Ok(Some(ledger))
    }

    fn from_row(row: LedgerRow, map_store: Arc<dyn MapStore>) -> Result<Ledger> {
        let header = LedgerHeader {
            sequence: row.ledger_seq,
            total_coins: row.total_coins,
            parent_hash: row.prev_hash,
            tx_hash: row.trans_set_hash,
            state_hash: row.account_set_hash,
            parent_close_time: row.prev_closing_time,
            close_time: row.closing_time,
            close_time_resolution: row.close_time_res,
            close_flags: row.close_flags,
        };

        let (mut ledger, loaded) = Ledger::from_header(header, map_store);
        if !loaded {
            return Err(LedgerError::PartialLoad {
                seq: row.ledger_seq,
            });
        }
        ledger.set_closed();

        let actual = ledger.hash();
        if actual != row.ledger_hash {
            error!(
                seq = row.ledger_seq,
                expected = %row.ledger_hash,
                %actual,
                "stored ledger fails hash check"
            );
            return Err(LedgerError::HashMismatch {
                expected: row.ledger_hash,
                actual,
            });
        }
        trace!(seq = row.ledger_seq, hash = %actual, "loaded ledger");
        Ok(ledger)
    }
}
