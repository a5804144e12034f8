//! Database schema.
//!
//! The three tables mirror the external contract: `Ledgers` for header
//! fields, `Transactions` for per-transaction blobs and status, and
//! `AccountTransactions` for the account-history join. Hashes and account
//! ids are stored as uppercase hex.

/// Complete SQL schema for a fresh index database.
pub const CREATE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS Ledgers (
    LedgerHash      TEXT PRIMARY KEY,
    LedgerSeq       INTEGER UNIQUE NOT NULL,
    PrevHash        TEXT NOT NULL,
    TotalCoins      INTEGER NOT NULL,
    ClosingTime     INTEGER NOT NULL,
    PrevClosingTime INTEGER NOT NULL,
    CloseTimeRes    INTEGER NOT NULL,
    CloseFlags      INTEGER NOT NULL,
    AccountSetHash  TEXT NOT NULL,
    TransSetHash    TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS SeqLedger ON Ledgers(LedgerSeq);

CREATE TABLE IF NOT EXISTS Transactions (
    TransID   TEXT PRIMARY KEY,
    LedgerSeq INTEGER NOT NULL,
    Status    TEXT NOT NULL,
    RawTxn    BLOB,
    TxnMeta   BLOB
);
CREATE INDEX IF NOT EXISTS TxLgrIndex ON Transactions(LedgerSeq);

CREATE TABLE IF NOT EXISTS AccountTransactions (
    TransID   TEXT NOT NULL,
    Account   TEXT NOT NULL,
    LedgerSeq INTEGER NOT NULL,
    TxnSeq    INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS AcctTxIndex ON AccountTransactions(Account, LedgerSeq, TxnSeq);
CREATE INDEX IF NOT EXISTS AcctLgrIndex ON AccountTransactions(LedgerSeq);
"#;
