//! Transaction-map payloads.
//!
//! Items in the transaction map are length-prefixed blobs: a one-byte form
//! tag, the raw transaction, and (for the usual form) its metadata. The
//! metadata carried here is the slice the index database needs: the
//! transaction's position in its ledger and the accounts it touched.

use weft_common::{AccountId, Hash256};

use crate::entry::{CodecError, Reader, Writer};

const FORM_TX_ONLY: u8 = 0x00;
const FORM_TX_WITH_META: u8 = 0x01;

/// Metadata recorded alongside a transaction in the transaction map.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct TxMeta {
    /// Position of the transaction within its ledger.
    pub transaction_index: u32,
    /// Accounts whose state the transaction touched.
    pub affected_accounts: Vec<AccountId>,
}

impl TxMeta {
    pub fn new(transaction_index: u32, affected_accounts: Vec<AccountId>) -> Self {
        Self {
            transaction_index,
            affected_accounts,
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut w = Writer::new();
        w.put_u32(self.transaction_index);
        w.put_u32(self.affected_accounts.len() as u32);
        for account in &self.affected_accounts {
            w.put_account(account);
        }
        w.into_inner()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        let mut r = Reader::new(bytes);
        let transaction_index = r.get_u32()?;
        let count = r.get_u32()? as usize;
        let mut affected_accounts = Vec::with_capacity(count.min(4096));
        for _ in 0..count {
            affected_accounts.push(r.get_account()?);
        }
        r.finish()?;
        Ok(Self {
            transaction_index,
            affected_accounts,
        })
    }
}

/// A transaction pulled back out of the transaction map.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct AcceptedTx {
    pub id: Hash256,
    pub raw_tx: Vec<u8>,
    pub meta: Option<TxMeta>,
    /// The encoded metadata, as stored.
    pub meta_bytes: Vec<u8>,
}

/// Encode a transaction without metadata.
pub(crate) fn encode_tx(raw_tx: &[u8]) -> Vec<u8> {
    let mut w = Writer::new();
    w.put_u8(FORM_TX_ONLY);
    w.put_var_bytes(raw_tx);
    w.into_inner()
}

/// Encode a transaction with its metadata.
pub(crate) fn encode_tx_with_meta(raw_tx: &[u8], meta: &TxMeta) -> Vec<u8> {
    let mut w = Writer::new();
    w.put_u8(FORM_TX_WITH_META);
    w.put_var_bytes(raw_tx);
    w.put_var_bytes(&meta.encode());
    w.into_inner()
}

/// Decode a transaction-map item back into its parts.
pub(crate) fn decode_tx_item(id: Hash256, bytes: &[u8]) -> Result<AcceptedTx, CodecError> {
    let mut r = Reader::new(bytes);
    match r.get_u8()? {
        FORM_TX_ONLY => {
            let raw_tx = r.get_var_bytes()?;
            r.finish()?;
            Ok(AcceptedTx {
                id,
                raw_tx,
                meta: None,
                meta_bytes: Vec::new(),
            })
        }
        FORM_TX_WITH_META => {
            let raw_tx = r.get_var_bytes()?;
            let meta_bytes = r.get_var_bytes()?;
            r.finish()?;
            let meta = TxMeta::decode(&meta_bytes)?;
            Ok(AcceptedTx {
                id,
                raw_tx,
                meta: Some(meta),
                meta_bytes,
            })
        }
        other => Err(CodecError::UnknownTag(other)),
    }
}
