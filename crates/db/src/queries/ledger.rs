//! Ledger row queries.

use std::collections::BTreeMap;

use rusqlite::{params, Connection, OptionalExtension, Row};
use weft_common::Hash256;

use crate::error::DbError;
use crate::Result;

/// One row of the `Ledgers` table: the header fields plus the identity
/// hash they produce.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct LedgerRow {
    pub ledger_hash: Hash256,
    pub ledger_seq: u32,
    pub prev_hash: Hash256,
    pub total_coins: u64,
    pub closing_time: u32,
    pub prev_closing_time: u32,
    pub close_time_res: u8,
    pub close_flags: u8,
    pub account_set_hash: Hash256,
    pub trans_set_hash: Hash256,
}

fn hash_column(row: &Row, idx: usize) -> rusqlite::Result<String> {
    row.get(idx)
}

const LEDGER_COLUMNS: &str = "LedgerHash, LedgerSeq, PrevHash, TotalCoins, ClosingTime, \
     PrevClosingTime, CloseTimeRes, CloseFlags, AccountSetHash, TransSetHash";

/// Query trait for the `Ledgers` table.
pub trait LedgerQueries {
    /// Insert or replace the row for a validated ledger.
    fn store_ledger(&self, row: &LedgerRow) -> Result<()>;

    /// Delete the row at a sequence, if any.
    fn delete_ledger(&self, seq: u32) -> Result<()>;

    /// Load the row at a sequence.
    fn load_ledger_by_seq(&self, seq: u32) -> Result<Option<LedgerRow>>;

    /// Load the row with a given identity hash.
    fn load_ledger_by_hash(&self, hash: &Hash256) -> Result<Option<LedgerRow>>;

    /// The identity hash stored at a sequence.
    fn ledger_hash_by_seq(&self, seq: u32) -> Result<Option<Hash256>>;

    /// (ledger hash, parent hash) for every sequence in `[min, max]`.
    fn ledger_hashes_by_range(&self, min: u32, max: u32)
        -> Result<BTreeMap<u32, (Hash256, Hash256)>>;

    /// Highest stored ledger sequence, if any.
    fn latest_ledger_seq(&self) -> Result<Option<u32>>;
}

impl LedgerQueries for Connection {
    fn store_ledger(&self, row: &LedgerRow) -> Result<()> {
        self.execute(
            "INSERT OR REPLACE INTO Ledgers \
             (LedgerHash, LedgerSeq, PrevHash, TotalCoins, ClosingTime, PrevClosingTime, \
              CloseTimeRes, CloseFlags, AccountSetHash, TransSetHash) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                row.ledger_hash.to_hex(),
                row.ledger_seq,
                row.prev_hash.to_hex(),
                row.total_coins as i64,
                row.closing_time,
                row.prev_closing_time,
                row.close_time_res,
                row.close_flags,
                row.account_set_hash.to_hex(),
                row.trans_set_hash.to_hex(),
            ],
        )?;
        Ok(())
    }

    fn delete_ledger(&self, seq: u32) -> Result<()> {
        self.execute("DELETE FROM Ledgers WHERE LedgerSeq = ?1", params![seq])?;
        Ok(())
    }

    fn load_ledger_by_seq(&self, seq: u32) -> Result<Option<LedgerRow>> {
        let row = self
            .query_row(
                &format!("SELECT {LEDGER_COLUMNS} FROM Ledgers WHERE LedgerSeq = ?1"),
                params![seq],
                |row| {
                    Ok((
                        hash_column(row, 0)?,
                        row.get::<_, u32>(1)?,
                        hash_column(row, 2)?,
                        row.get::<_, i64>(3)?,
                        row.get::<_, u32>(4)?,
                        row.get::<_, u32>(5)?,
                        row.get::<_, u8>(6)?,
                        row.get::<_, u8>(7)?,
                        hash_column(row, 8)?,
                        hash_column(row, 9)?,
                    ))
                },
            )
            .optional()?;

        row.map(|cols| from_columns(cols)).transpose()
    }

    fn load_ledger_by_hash(&self, hash: &Hash256) -> Result<Option<LedgerRow>> {
        let row = self
            .query_row(
                &format!("SELECT {LEDGER_COLUMNS} FROM Ledgers WHERE LedgerHash = ?1"),
                params![hash.to_hex()],
                |row| {
                    Ok((
                        hash_column(row, 0)?,
                        row.get::<_, u32>(1)?,
                        hash_column(row, 2)?,
                        row.get::<_, i64>(3)?,
                        row.get::<_, u32>(4)?,
                        row.get::<_, u32>(5)?,
                        row.get::<_, u8>(6)?,
                        row.get::<_, u8>(7)?,
                        hash_column(row, 8)?,
                        hash_column(row, 9)?,
                    ))
                },
            )
            .optional()?;

        row.map(|cols| from_columns(cols)).transpose()
    }

    fn ledger_hash_by_seq(&self, seq: u32) -> Result<Option<Hash256>> {
        let hex: Option<String> = self
            .query_row(
                "SELECT LedgerHash FROM Ledgers WHERE LedgerSeq = ?1",
                params![seq],
                |row| row.get(0),
            )
            .optional()?;

        hex.map(|hex| {
            Hash256::from_hex(&hex).map_err(|e| DbError::Integrity(format!("bad ledger hash: {e}")))
        })
        .transpose()
    }

    fn ledger_hashes_by_range(
        &self,
        min: u32,
        max: u32,
    ) -> Result<BTreeMap<u32, (Hash256, Hash256)>> {
        let mut stmt = self.prepare(
            "SELECT LedgerSeq, LedgerHash, PrevHash FROM Ledgers \
             WHERE LedgerSeq >= ?1 AND LedgerSeq <= ?2 ORDER BY LedgerSeq ASC",
        )?;
        let rows = stmt.query_map(params![min, max], |row| {
            Ok((
                row.get::<_, u32>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut out = BTreeMap::new();
        for row in rows {
            let (seq, hash_hex, prev_hex) = row?;
            let parse = |hex: String| {
                Hash256::from_hex(&hex)
                    .map_err(|e| DbError::Integrity(format!("bad hash column: {e}")))
            };
            out.insert(seq, (parse(hash_hex)?, parse(prev_hex)?));
        }
        Ok(out)
    }

    fn latest_ledger_seq(&self) -> Result<Option<u32>> {
        // MAX() on an empty table yields NULL.
        let result: Option<Option<u32>> = self
            .query_row("SELECT MAX(LedgerSeq) FROM Ledgers", [], |row| {
                row.get::<_, Option<u32>>(0)
            })
            .optional()?;
        Ok(result.flatten())
    }
}

type LedgerColumns = (String, u32, String, i64, u32, u32, u8, u8, String, String);

fn from_columns(cols: LedgerColumns) -> Result<LedgerRow> {
    let parse = |hex: &str| {
        Hash256::from_hex(hex).map_err(|e| DbError::Integrity(format!("bad hash column: {e}")))
    };
    Ok(LedgerRow {
        ledger_hash: parse(&cols.0)?,
        ledger_seq: cols.1,
        prev_hash: parse(&cols.2)?,
        total_coins: cols.3 as u64,
        closing_time: cols.4,
        prev_closing_time: cols.5,
        close_time_res: cols.6,
        close_flags: cols.7,
        account_set_hash: parse(&cols.8)?,
        trans_set_hash: parse(&cols.9)?,
    })
}
