//! Transaction and account-transaction row queries.

use rusqlite::{params, Connection, OptionalExtension};
use weft_common::{AccountId, Hash256};

use crate::error::DbError;
use crate::Result;

/// One row of the `Transactions` table.
#[derive(Clone, Debug)]
pub struct TxRow {
    pub trans_id: Hash256,
    pub ledger_seq: u32,
    /// Single-character status code ("V" for validated).
    pub status: char,
    pub raw_txn: Vec<u8>,
    pub txn_meta: Vec<u8>,
}

/// One row of the `AccountTransactions` table.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct AccountTxRow {
    pub trans_id: Hash256,
    pub account: AccountId,
    pub ledger_seq: u32,
    /// Position of the transaction within its ledger.
    pub txn_seq: u32,
}

/// Query trait for the transaction tables.
pub trait TxQueries {
    /// Delete every `Transactions` row for a ledger sequence.
    fn delete_transactions_for(&self, seq: u32) -> Result<()>;

    /// Delete every `AccountTransactions` row for a ledger sequence.
    fn delete_account_transactions_for(&self, seq: u32) -> Result<()>;

    /// Delete `AccountTransactions` rows for one transaction.
    fn delete_account_transactions_by_tx(&self, trans_id: &Hash256) -> Result<()>;

    /// Insert or replace a transaction row.
    fn insert_transaction(&self, row: &TxRow) -> Result<()>;

    /// Insert an account-transaction row.
    fn insert_account_transaction(&self, row: &AccountTxRow) -> Result<()>;

    /// The ledger a transaction was validated in, if stored.
    fn transaction_ledger(&self, trans_id: &Hash256) -> Result<Option<u32>>;

    /// All account-transaction rows for an account, ledger order.
    fn account_transactions(&self, account: &AccountId) -> Result<Vec<AccountTxRow>>;

    /// Number of transactions stored for a ledger.
    fn transaction_count_for(&self, seq: u32) -> Result<u32>;
}

impl TxQueries for Connection {
    fn delete_transactions_for(&self, seq: u32) -> Result<()> {
        self.execute("DELETE FROM Transactions WHERE LedgerSeq = ?1", params![seq])?;
        Ok(())
    }

    fn delete_account_transactions_for(&self, seq: u32) -> Result<()> {
        self.execute(
            "DELETE FROM AccountTransactions WHERE LedgerSeq = ?1",
            params![seq],
        )?;
        Ok(())
    }

    fn delete_account_transactions_by_tx(&self, trans_id: &Hash256) -> Result<()> {
        self.execute(
            "DELETE FROM AccountTransactions WHERE TransID = ?1",
            params![trans_id.to_hex()],
        )?;
        Ok(())
    }

    fn insert_transaction(&self, row: &TxRow) -> Result<()> {
        self.execute(
            "INSERT OR REPLACE INTO Transactions (TransID, LedgerSeq, Status, RawTxn, TxnMeta) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                row.trans_id.to_hex(),
                row.ledger_seq,
                row.status.to_string(),
                row.raw_txn,
                row.txn_meta,
            ],
        )?;
        Ok(())
    }

    fn insert_account_transaction(&self, row: &AccountTxRow) -> Result<()> {
        self.execute(
            "INSERT INTO AccountTransactions (TransID, Account, LedgerSeq, TxnSeq) \
             VALUES (?1, ?2, ?3, ?4)",
            params![
                row.trans_id.to_hex(),
                row.account.to_hex(),
                row.ledger_seq,
                row.txn_seq,
            ],
        )?;
        Ok(())
    }

    fn transaction_ledger(&self, trans_id: &Hash256) -> Result<Option<u32>> {
        Ok(self
            .query_row(
                "SELECT LedgerSeq FROM Transactions WHERE TransID = ?1",
                params![trans_id.to_hex()],
                |row| row.get(0),
            )
            .optional()?)
    }

    fn account_transactions(&self, account: &AccountId) -> Result<Vec<AccountTxRow>> {
        let mut stmt = self.prepare(
            "SELECT TransID, LedgerSeq, TxnSeq FROM AccountTransactions \
             WHERE Account = ?1 ORDER BY LedgerSeq ASC, TxnSeq ASC",
        )?;
        let rows = stmt.query_map(params![account.to_hex()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, u32>(1)?,
                row.get::<_, u32>(2)?,
            ))
        })?;

        let mut out = Vec::new();
        for row in rows {
            let (id_hex, ledger_seq, txn_seq) = row?;
            let trans_id = Hash256::from_hex(&id_hex)
                .map_err(|e| DbError::Integrity(format!("bad transaction id: {e}")))?;
            out.push(AccountTxRow {
                trans_id,
                account: *account,
                ledger_seq,
                txn_seq,
            });
        }
        Ok(out)
    }

    fn transaction_count_for(&self, seq: u32) -> Result<u32> {
        Ok(self.query_row(
            "SELECT COUNT(*) FROM Transactions WHERE LedgerSeq = ?1",
            params![seq],
            |row| row.get(0),
        )?)
    }
}
