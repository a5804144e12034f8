//! Query traits implemented on `rusqlite::Connection`.

pub mod ledger;
pub mod tx;
