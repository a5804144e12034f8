//! Ledger entries.
//!
//! Every record in the state map is a *ledger entry*: a self-describing,
//! typed value keyed by a 256-bit index. The canonical encoding is a
//! 16-bit kind tag followed by the kind's payload, all fields big-endian,
//! optional fields behind a presence bitmap and hash vectors
//! length-prefixed. The encoding is what gets hashed into the map root,
//! so it must be byte-stable.

use thiserror::Error;
use weft_common::{AccountId, Amount, Currency, Hash256, Issue};

/// Entry codec errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    /// Payload ended before a field was complete.
    #[error("unexpected end of entry data")]
    UnexpectedEof,

    /// Kind tag is not a known entry kind.
    #[error("unknown entry kind 0x{0:04x}")]
    UnknownKind(u16),

    /// A tagged union carried an unknown tag.
    #[error("unknown tag {0}")]
    UnknownTag(u8),

    /// Bytes left over after the last field.
    #[error("trailing bytes after entry data")]
    TrailingBytes,
}

/// The kind tag of a ledger entry.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[repr(u16)]
pub enum EntryKind {
    AccountRoot = 0x0061,
    DirNode = 0x0064,
    Amendments = 0x0066,
    GeneratorMap = 0x0067,
    LedgerHashes = 0x0068,
    Offer = 0x006f,
    RippleState = 0x0072,
    FeeSettings = 0x0073,
    Ticket = 0x0054,
}

impl EntryKind {
    fn from_u16(value: u16) -> Result<Self, CodecError> {
        Ok(match value {
            0x0061 => EntryKind::AccountRoot,
            0x0064 => EntryKind::DirNode,
            0x0066 => EntryKind::Amendments,
            0x0067 => EntryKind::GeneratorMap,
            0x0068 => EntryKind::LedgerHashes,
            0x006f => EntryKind::Offer,
            0x0072 => EntryKind::RippleState,
            0x0073 => EntryKind::FeeSettings,
            0x0054 => EntryKind::Ticket,
            other => return Err(CodecError::UnknownKind(other)),
        })
    }
}

/// An account and its native balance.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct AccountRoot {
    pub account: AccountId,
    /// Native balance in drops.
    pub balance: u64,
    /// Next transaction sequence for the account.
    pub sequence: u32,
    /// Items in the account's owner directory.
    pub owner_count: u32,
    pub flags: u32,
}

/// Book fields stamped on an order-book directory page.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct BookAnnotation {
    pub taker_pays_currency: Currency,
    pub taker_pays_issuer: AccountId,
    pub taker_gets_currency: Currency,
    pub taker_gets_issuer: AccountId,
    pub exchange_rate: u64,
}

/// One page of a directory: a doubly linked list of child keys.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct DirNode {
    /// Key of page 0.
    pub root: Hash256,
    /// Child entry keys held by this page.
    pub indexes: Vec<Hash256>,
    /// Page index of the next page, 0 if none.
    pub index_next: u64,
    /// Page index of the previous page, 0 if none.
    pub index_previous: u64,
    /// Owner annotation, set on owner directories.
    pub owner: Option<AccountId>,
    /// Book annotation, set on order-book directories.
    pub book: Option<BookAnnotation>,
}

impl DirNode {
    /// A fresh, empty page of an owner directory.
    pub fn for_owner(root: Hash256, owner: AccountId) -> Self {
        Self {
            root,
            indexes: Vec::new(),
            index_next: 0,
            index_previous: 0,
            owner: Some(owner),
            book: None,
        }
    }

    /// A fresh, empty page of an order-book directory.
    pub fn for_book(root: Hash256, book: BookAnnotation) -> Self {
        Self {
            root,
            indexes: Vec::new(),
            index_next: 0,
            index_previous: 0,
            owner: None,
            book: Some(book),
        }
    }
}

/// A trust line between two accounts for one currency.
///
/// The two accounts are stored in canonical (low, high) order, matching
/// the key derivation.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct RippleState {
    pub low_account: AccountId,
    pub high_account: AccountId,
    pub currency: Currency,
    /// Balance from the low account's perspective.
    pub balance: i64,
    pub low_limit: i64,
    pub high_limit: i64,
    pub flags: u32,
}

/// An order-book offer.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Offer {
    pub account: AccountId,
    /// Sequence of the transaction that created the offer.
    pub sequence: u32,
    pub taker_pays: Amount,
    pub taker_gets: Amount,
    /// Key of the book directory page holding this offer.
    pub book_directory: Hash256,
    pub book_node: u64,
    pub owner_node: u64,
    pub expiration: Option<u32>,
    pub flags: u32,
}

/// Public generator blob for an account family.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct GeneratorMap {
    pub generator: Vec<u8>,
}

/// A skip-list entry: recent or epoch ledger hashes.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct LedgerHashes {
    /// Sequence of the last ledger whose hash is recorded.
    pub last_ledger_sequence: u32,
    /// Oldest first.
    pub hashes: Vec<Hash256>,
}

/// On-ledger fee schedule. Absent fields fall back to configuration.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct FeeSettings {
    pub base_fee: Option<u64>,
    pub reference_fee_units: Option<u32>,
    pub reserve_base: Option<u32>,
    pub reserve_increment: Option<u32>,
}

/// Enabled amendment hashes.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct Amendments {
    pub amendments: Vec<Hash256>,
}

/// A sequence-reservation ticket.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Ticket {
    pub account: AccountId,
    pub sequence: u32,
    pub target: Option<AccountId>,
    pub expiration: Option<u32>,
}

/// The typed payload of a ledger entry.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum EntryData {
    AccountRoot(AccountRoot),
    DirNode(DirNode),
    RippleState(RippleState),
    Offer(Offer),
    GeneratorMap(GeneratorMap),
    LedgerHashes(LedgerHashes),
    FeeSettings(FeeSettings),
    Amendments(Amendments),
    Ticket(Ticket),
}

impl EntryData {
    /// The kind tag for this payload.
    pub fn kind(&self) -> EntryKind {
        match self {
            EntryData::AccountRoot(_) => EntryKind::AccountRoot,
            EntryData::DirNode(_) => EntryKind::DirNode,
            EntryData::RippleState(_) => EntryKind::RippleState,
            EntryData::Offer(_) => EntryKind::Offer,
            EntryData::GeneratorMap(_) => EntryKind::GeneratorMap,
            EntryData::LedgerHashes(_) => EntryKind::LedgerHashes,
            EntryData::FeeSettings(_) => EntryKind::FeeSettings,
            EntryData::Amendments(_) => EntryKind::Amendments,
            EntryData::Ticket(_) => EntryKind::Ticket,
        }
    }
}

/// A ledger entry: a typed payload at a 256-bit index.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct LedgerEntry {
    index: Hash256,
    data: EntryData,
}

impl LedgerEntry {
    pub fn new(index: Hash256, data: EntryData) -> Self {
        Self { index, data }
    }

    pub fn index(&self) -> Hash256 {
        self.index
    }

    pub fn kind(&self) -> EntryKind {
        self.data.kind()
    }

    pub fn data(&self) -> &EntryData {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut EntryData {
        &mut self.data
    }

    pub fn as_account_root(&self) -> Option<&AccountRoot> {
        match &self.data {
            EntryData::AccountRoot(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_dir_node(&self) -> Option<&DirNode> {
        match &self.data {
            EntryData::DirNode(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_ripple_state(&self) -> Option<&RippleState> {
        match &self.data {
            EntryData::RippleState(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_offer(&self) -> Option<&Offer> {
        match &self.data {
            EntryData::Offer(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_ledger_hashes(&self) -> Option<&LedgerHashes> {
        match &self.data {
            EntryData::LedgerHashes(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_fee_settings(&self) -> Option<&FeeSettings> {
        match &self.data {
            EntryData::FeeSettings(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_amendments(&self) -> Option<&Amendments> {
        match &self.data {
            EntryData::Amendments(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_ticket(&self) -> Option<&Ticket> {
        match &self.data {
            EntryData::Ticket(v) => Some(v),
            _ => None,
        }
    }

    /// Canonical encoding: kind tag then payload.
    pub fn encode(&self) -> Vec<u8> {
        let mut w = Writer::new();
        w.put_u16(self.kind() as u16);
        match &self.data {
            EntryData::AccountRoot(v) => {
                w.put_account(&v.account);
                w.put_u64(v.balance);
                w.put_u32(v.sequence);
                w.put_u32(v.owner_count);
                w.put_u32(v.flags);
            }
            EntryData::DirNode(v) => {
                w.put_hash(&v.root);
                w.put_u32(v.indexes.len() as u32);
                for index in &v.indexes {
                    w.put_hash(index);
                }
                w.put_u64(v.index_next);
                w.put_u64(v.index_previous);
                let mut presence = 0u8;
                if v.owner.is_some() {
                    presence |= 0x01;
                }
                if v.book.is_some() {
                    presence |= 0x02;
                }
                w.put_u8(presence);
                if let Some(owner) = &v.owner {
                    w.put_account(owner);
                }
                if let Some(book) = &v.book {
                    w.put_currency(&book.taker_pays_currency);
                    w.put_account(&book.taker_pays_issuer);
                    w.put_currency(&book.taker_gets_currency);
                    w.put_account(&book.taker_gets_issuer);
                    w.put_u64(book.exchange_rate);
                }
            }
            EntryData::RippleState(v) => {
                w.put_account(&v.low_account);
                w.put_account(&v.high_account);
                w.put_currency(&v.currency);
                w.put_i64(v.balance);
                w.put_i64(v.low_limit);
                w.put_i64(v.high_limit);
                w.put_u32(v.flags);
            }
            EntryData::Offer(v) => {
                w.put_account(&v.account);
                w.put_u32(v.sequence);
                w.put_amount(&v.taker_pays);
                w.put_amount(&v.taker_gets);
                w.put_hash(&v.book_directory);
                w.put_u64(v.book_node);
                w.put_u64(v.owner_node);
                w.put_u32(v.flags);
                match v.expiration {
                    Some(expiration) => {
                        w.put_u8(0x01);
                        w.put_u32(expiration);
                    }
                    None => w.put_u8(0x00),
                }
            }
            EntryData::GeneratorMap(v) => {
                w.put_var_bytes(&v.generator);
            }
            EntryData::LedgerHashes(v) => {
                w.put_u32(v.last_ledger_sequence);
                w.put_u32(v.hashes.len() as u32);
                for hash in &v.hashes {
                    w.put_hash(hash);
                }
            }
            EntryData::FeeSettings(v) => {
                let mut presence = 0u8;
                if v.base_fee.is_some() {
                    presence |= 0x01;
                }
                if v.reference_fee_units.is_some() {
                    presence |= 0x02;
                }
                if v.reserve_base.is_some() {
                    presence |= 0x04;
                }
                if v.reserve_increment.is_some() {
                    presence |= 0x08;
                }
                w.put_u8(presence);
                if let Some(value) = v.base_fee {
                    w.put_u64(value);
                }
                if let Some(value) = v.reference_fee_units {
                    w.put_u32(value);
                }
                if let Some(value) = v.reserve_base {
                    w.put_u32(value);
                }
                if let Some(value) = v.reserve_increment {
                    w.put_u32(value);
                }
            }
            EntryData::Amendments(v) => {
                w.put_u32(v.amendments.len() as u32);
                for hash in &v.amendments {
                    w.put_hash(hash);
                }
            }
            EntryData::Ticket(v) => {
                w.put_account(&v.account);
                w.put_u32(v.sequence);
                let mut presence = 0u8;
                if v.target.is_some() {
                    presence |= 0x01;
                }
                if v.expiration.is_some() {
                    presence |= 0x02;
                }
                w.put_u8(presence);
                if let Some(target) = &v.target {
                    w.put_account(target);
                }
                if let Some(expiration) = v.expiration {
                    w.put_u32(expiration);
                }
            }
        }
        w.into_inner()
    }

    /// Decode an entry stored under `index`.
    pub fn decode(index: Hash256, bytes: &[u8]) -> Result<Self, CodecError> {
        let mut r = Reader::new(bytes);
        let kind = EntryKind::from_u16(r.get_u16()?)?;
        let data = match kind {
            EntryKind::AccountRoot => EntryData::AccountRoot(AccountRoot {
                account: r.get_account()?,
                balance: r.get_u64()?,
                sequence: r.get_u32()?,
                owner_count: r.get_u32()?,
                flags: r.get_u32()?,
            }),
            EntryKind::DirNode => {
                let root = r.get_hash()?;
                let count = r.get_u32()? as usize;
                let mut indexes = Vec::with_capacity(count.min(4096));
                for _ in 0..count {
                    indexes.push(r.get_hash()?);
                }
                let index_next = r.get_u64()?;
                let index_previous = r.get_u64()?;
                let presence = r.get_u8()?;
                let owner = if presence & 0x01 != 0 {
                    Some(r.get_account()?)
                } else {
                    None
                };
                let book = if presence & 0x02 != 0 {
                    Some(BookAnnotation {
                        taker_pays_currency: r.get_currency()?,
                        taker_pays_issuer: r.get_account()?,
                        taker_gets_currency: r.get_currency()?,
                        taker_gets_issuer: r.get_account()?,
                        exchange_rate: r.get_u64()?,
                    })
                } else {
                    None
                };
                EntryData::DirNode(DirNode {
                    root,
                    indexes,
                    index_next,
                    index_previous,
                    owner,
                    book,
                })
            }
            EntryKind::RippleState => EntryData::RippleState(RippleState {
                low_account: r.get_account()?,
                high_account: r.get_account()?,
                currency: r.get_currency()?,
                balance: r.get_i64()?,
                low_limit: r.get_i64()?,
                high_limit: r.get_i64()?,
                flags: r.get_u32()?,
            }),
            EntryKind::Offer => {
                let account = r.get_account()?;
                let sequence = r.get_u32()?;
                let taker_pays = r.get_amount()?;
                let taker_gets = r.get_amount()?;
                let book_directory = r.get_hash()?;
                let book_node = r.get_u64()?;
                let owner_node = r.get_u64()?;
                let flags = r.get_u32()?;
                let presence = r.get_u8()?;
                let expiration = if presence & 0x01 != 0 {
                    Some(r.get_u32()?)
                } else {
                    None
                };
                EntryData::Offer(Offer {
                    account,
                    sequence,
                    taker_pays,
                    taker_gets,
                    book_directory,
                    book_node,
                    owner_node,
                    expiration,
                    flags,
                })
            }
            EntryKind::GeneratorMap => EntryData::GeneratorMap(GeneratorMap {
                generator: r.get_var_bytes()?,
            }),
            EntryKind::LedgerHashes => {
                let last_ledger_sequence = r.get_u32()?;
                let count = r.get_u32()? as usize;
                let mut hashes = Vec::with_capacity(count.min(4096));
                for _ in 0..count {
                    hashes.push(r.get_hash()?);
                }
                EntryData::LedgerHashes(LedgerHashes {
                    last_ledger_sequence,
                    hashes,
                })
            }
            EntryKind::FeeSettings => {
                let presence = r.get_u8()?;
                EntryData::FeeSettings(FeeSettings {
                    base_fee: if presence & 0x01 != 0 {
                        Some(r.get_u64()?)
                    } else {
                        None
                    },
                    reference_fee_units: if presence & 0x02 != 0 {
                        Some(r.get_u32()?)
                    } else {
                        None
                    },
                    reserve_base: if presence & 0x04 != 0 {
                        Some(r.get_u32()?)
                    } else {
                        None
                    },
                    reserve_increment: if presence & 0x08 != 0 {
                        Some(r.get_u32()?)
                    } else {
                        None
                    },
                })
            }
            EntryKind::Amendments => {
                let count = r.get_u32()? as usize;
                let mut amendments = Vec::with_capacity(count.min(4096));
                for _ in 0..count {
                    amendments.push(r.get_hash()?);
                }
                EntryData::Amendments(Amendments { amendments })
            }
            EntryKind::Ticket => {
                let account = r.get_account()?;
                let sequence = r.get_u32()?;
                let presence = r.get_u8()?;
                let target = if presence & 0x01 != 0 {
                    Some(r.get_account()?)
                } else {
                    None
                };
                let expiration = if presence & 0x02 != 0 {
                    Some(r.get_u32()?)
                } else {
                    None
                };
                EntryData::Ticket(Ticket {
                    account,
                    sequence,
                    target,
                    expiration,
                })
            }
        };
        r.finish()?;
        Ok(Self { index, data })
    }
}

pub(crate) struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }

    pub fn put_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    pub fn put_u16(&mut self, value: u16) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    pub fn put_u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    pub fn put_u64(&mut self, value: u64) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    pub fn put_i64(&mut self, value: i64) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    pub fn put_hash(&mut self, value: &Hash256) {
        self.buf.extend_from_slice(value.as_bytes());
    }

    pub fn put_account(&mut self, value: &AccountId) {
        self.buf.extend_from_slice(value.as_bytes());
    }

    pub fn put_currency(&mut self, value: &Currency) {
        self.buf.extend_from_slice(value.as_bytes());
    }

    pub fn put_var_bytes(&mut self, value: &[u8]) {
        self.put_u32(value.len() as u32);
        self.buf.extend_from_slice(value);
    }

    pub fn put_amount(&mut self, value: &Amount) {
        match value {
            Amount::Drops(drops) => {
                self.put_u8(0x00);
                self.put_u64(*drops);
            }
            Amount::Issued {
                issue,
                mantissa,
                exponent,
            } => {
                self.put_u8(0x01);
                self.put_currency(&issue.currency);
                self.put_account(&issue.account);
                self.put_i64(*mantissa);
                self.put_u8(*exponent as u8);
            }
        }
    }
}

pub(crate) struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], CodecError> {
        let end = self.pos.checked_add(len).ok_or(CodecError::UnexpectedEof)?;
        if end > self.buf.len() {
            return Err(CodecError::UnexpectedEof);
        }
        let slice = &self.buf[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    pub fn get_u8(&mut self) -> Result<u8, CodecError> {
        Ok(self.take(1)?[0])
    }

    pub fn get_u16(&mut self) -> Result<u16, CodecError> {
        let bytes = self.take(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    pub fn get_u32(&mut self) -> Result<u32, CodecError> {
        let bytes = self.take(4)?;
        Ok(u32::from_be_bytes(bytes.try_into().unwrap()))
    }

    pub fn get_u64(&mut self) -> Result<u64, CodecError> {
        let bytes = self.take(8)?;
        Ok(u64::from_be_bytes(bytes.try_into().unwrap()))
    }

    pub fn get_i64(&mut self) -> Result<i64, CodecError> {
        let bytes = self.take(8)?;
        Ok(i64::from_be_bytes(bytes.try_into().unwrap()))
    }

    pub fn get_hash(&mut self) -> Result<Hash256, CodecError> {
        let bytes = self.take(32)?;
        Ok(Hash256::from_bytes(bytes.try_into().unwrap()))
    }

    pub fn get_account(&mut self) -> Result<AccountId, CodecError> {
        let bytes = self.take(20)?;
        Ok(AccountId::from_bytes(bytes.try_into().unwrap()))
    }

    pub fn get_currency(&mut self) -> Result<Currency, CodecError> {
        let bytes = self.take(20)?;
        Ok(Currency::from_bytes(bytes.try_into().unwrap()))
    }

    pub fn get_var_bytes(&mut self) -> Result<Vec<u8>, CodecError> {
        let len = self.get_u32()? as usize;
        Ok(self.take(len)?.to_vec())
    }

    pub fn get_amount(&mut self) -> Result<Amount, CodecError> {
        match self.get_u8()? {
            0x00 => Ok(Amount::Drops(self.get_u64()?)),
            0x01 => {
                let currency = self.get_currency()?;
                let account = self.get_account()?;
                let mantissa = self.get_i64()?;
                let exponent = self.get_u8()? as i8;
                Ok(Amount::Issued {
                    issue: Issue::new(currency, account),
                    mantissa,
                    exponent,
                })
            }
            other => Err(CodecError::UnknownTag(other)),
        }
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn finish(&self) -> Result<(), CodecError> {
        if self.remaining() != 0 {
            return Err(CodecError::TrailingBytes);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(byte: u8) -> Hash256 {
        Hash256::from_bytes([byte; 32])
    }

    #[test]
    fn account_root_round_trip() {
        let entry = LedgerEntry::new(
            index(1),
            EntryData::AccountRoot(AccountRoot {
                account: AccountId::from_bytes([0xAA; 20]),
                balance: 100_000,
                sequence: 1,
                owner_count: 0,
                flags: 0,
            }),
        );
        let decoded = LedgerEntry::decode(index(1), &entry.encode()).unwrap();
        assert_eq!(decoded, entry);
        assert_eq!(decoded.kind(), EntryKind::AccountRoot);
    }

    #[test]
    fn dir_node_round_trip_with_annotations() {
        let book = BookAnnotation {
            taker_pays_currency: Currency::from_bytes([1; 20]),
            taker_pays_issuer: AccountId::from_bytes([2; 20]),
            taker_gets_currency: Currency::NATIVE,
            taker_gets_issuer: AccountId::default(),
            exchange_rate: 77,
        };
        for data in [
            EntryData::DirNode(DirNode::for_owner(
                index(9),
                AccountId::from_bytes([3; 20]),
            )),
            EntryData::DirNode(DirNode::for_book(index(9), book)),
            EntryData::DirNode(DirNode {
                root: index(9),
                indexes: vec![index(1), index(2)],
                index_next: 1,
                index_previous: 0,
                owner: None,
                book: None,
            }),
        ] {
            let entry = LedgerEntry::new(index(5), data);
            assert_eq!(LedgerEntry::decode(index(5), &entry.encode()).unwrap(), entry);
        }
    }

    #[test]
    fn offer_round_trip_both_amount_forms() {
        let entry = LedgerEntry::new(
            index(4),
            EntryData::Offer(Offer {
                account: AccountId::from_bytes([7; 20]),
                sequence: 42,
                taker_pays: Amount::Drops(1_000),
                taker_gets: Amount::Issued {
                    issue: Issue::new(
                        Currency::from_bytes([8; 20]),
                        AccountId::from_bytes([9; 20]),
                    ),
                    mantissa: -5_000,
                    exponent: -3,
                },
                book_directory: index(0xB0),
                book_node: 0,
                owner_node: 2,
                expiration: Some(600),
                flags: 1,
            }),
        );
        assert_eq!(LedgerEntry::decode(index(4), &entry.encode()).unwrap(), entry);
    }

    #[test]
    fn fee_settings_presence_bitmap() {
        let sparse = LedgerEntry::new(
            index(6),
            EntryData::FeeSettings(FeeSettings {
                base_fee: Some(10),
                reference_fee_units: None,
                reserve_base: Some(20_000_000),
                reserve_increment: None,
            }),
        );
        assert_eq!(
            LedgerEntry::decode(index(6), &sparse.encode()).unwrap(),
            sparse
        );
    }

    #[test]
    fn ledger_hashes_round_trip() {
        let entry = LedgerEntry::new(
            index(2),
            EntryData::LedgerHashes(LedgerHashes {
                last_ledger_sequence: 256,
                hashes: (0..=3).map(index).collect(),
            }),
        );
        assert_eq!(LedgerEntry::decode(index(2), &entry.encode()).unwrap(), entry);
    }

    #[test]
    fn ticket_round_trip() {
        let entry = LedgerEntry::new(
            index(3),
            EntryData::Ticket(Ticket {
                account: AccountId::from_bytes([1; 20]),
                sequence: 9,
                target: None,
                expiration: Some(1_000),
            }),
        );
        assert_eq!(LedgerEntry::decode(index(3), &entry.encode()).unwrap(), entry);
    }

    #[test]
    fn decode_rejects_bad_input() {
        assert_eq!(
            LedgerEntry::decode(index(1), &[0x00]).unwrap_err(),
            CodecError::UnexpectedEof
        );
        assert_eq!(
            LedgerEntry::decode(index(1), &[0xFF, 0xFF]).unwrap_err(),
            CodecError::UnknownKind(0xFFFF)
        );

        let mut bytes = LedgerEntry::new(
            index(1),
            EntryData::Amendments(Amendments::default()),
        )
        .encode();
        bytes.push(0);
        assert_eq!(
            LedgerEntry::decode(index(1), &bytes).unwrap_err(),
            CodecError::TrailingBytes
        );
    }
}
