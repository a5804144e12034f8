//! Ledger-entry key derivation.
//!
//! Every entry key is `SHA-512-Half(space_tag || fields)`, where each kind
//! of entry owns a distinct 16-bit space tag. The tags make derivation
//! collision-free across kinds; the field layouts below are fixed and
//! big-endian.
//!
//! Two derivations are special:
//!
//! - a directory's page 0 *is* its root key (`dir_node_index(root, 0) ==
//!   root`), so the root entry needs no extra hash;
//! - an order-book key is the book base with the quality in the trailing
//!   8 bytes, so iterating the state map in key order walks a book in
//!   quality order.

use weft_common::{AccountId, Book, Currency, Hash256};
use weft_crypto::Sha512HalfHasher;

const SPACE_ACCOUNT: u16 = 0x0061; // 'a'
const SPACE_DIR_NODE: u16 = 0x0064; // 'd'
const SPACE_GENERATOR: u16 = 0x0067; // 'g'
const SPACE_RIPPLE: u16 = 0x0072; // 'r'
const SPACE_OFFER: u16 = 0x006f; // 'o'
const SPACE_OWNER_DIR: u16 = 0x004f; // 'O'
const SPACE_BOOK_DIR: u16 = 0x0042; // 'B'
const SPACE_FEE: u16 = 0x0065; // 'e'
const SPACE_AMENDMENT: u16 = 0x0066; // 'f'
const SPACE_SKIP_LIST: u16 = 0x0073; // 's'
const SPACE_TICKET: u16 = 0x0054; // 'T'

/// Key of an account's root entry.
pub fn account_index(account: &AccountId) -> Hash256 {
    let mut h = Sha512HalfHasher::new();
    h.update_u16(SPACE_ACCOUNT);
    h.update(account.as_bytes());
    h.finalize()
}

/// Key of an account's owner-directory root.
pub fn owner_dir_index(account: &AccountId) -> Hash256 {
    let mut h = Sha512HalfHasher::new();
    h.update_u16(SPACE_OWNER_DIR);
    h.update(account.as_bytes());
    h.finalize()
}

/// Key of the offer created by `account` at `sequence`.
pub fn offer_index(account: &AccountId, sequence: u32) -> Hash256 {
    let mut h = Sha512HalfHasher::new();
    h.update_u16(SPACE_OFFER);
    h.update(account.as_bytes());
    h.update_u32(sequence);
    h.finalize()
}

/// Key of the trust line between `a` and `b` for `currency`.
///
/// The account pair is canonicalized (smaller first), so both orderings
/// derive the same key.
pub fn ripple_state_index(a: &AccountId, b: &AccountId, currency: &Currency) -> Hash256 {
    let (low, high) = if a < b { (a, b) } else { (b, a) };
    let mut h = Sha512HalfHasher::new();
    h.update_u16(SPACE_RIPPLE);
    h.update(low.as_bytes());
    h.update(high.as_bytes());
    h.update(currency.as_bytes());
    h.finalize()
}

/// Key of an account's generator map.
pub fn generator_index(account: &AccountId) -> Hash256 {
    let mut h = Sha512HalfHasher::new();
    h.update_u16(SPACE_GENERATOR);
    h.update(account.as_bytes());
    h.finalize()
}

/// Base key of an order book, quality zeroed.
pub fn book_base(book: &Book) -> Hash256 {
    debug_assert!(book.is_consistent());
    let mut h = Sha512HalfHasher::new();
    h.update_u16(SPACE_BOOK_DIR);
    h.update(book.taker_pays.currency.as_bytes());
    h.update(book.taker_gets.currency.as_bytes());
    h.update(book.taker_pays.account.as_bytes());
    h.update(book.taker_gets.account.as_bytes());
    quality_index(h.finalize(), 0)
}

/// Key of directory page `page` under `root`. Page 0 is the root itself.
pub fn dir_node_index(root: Hash256, page: u64) -> Hash256 {
    if page == 0 {
        return root;
    }
    let mut h = Sha512HalfHasher::new();
    h.update_u16(SPACE_DIR_NODE);
    h.update(root.as_bytes());
    h.update_u64(page);
    h.finalize()
}

/// Place a quality in the trailing 8 bytes of a book key.
pub fn quality_index(base: Hash256, quality: u64) -> Hash256 {
    base.with_trailing_u64(quality)
}

/// The quality stored in a book key's trailing 8 bytes.
pub fn quality(key: &Hash256) -> u64 {
    key.trailing_u64()
}

/// The first key past the current quality bucket: `key + 2^64`.
pub fn quality_next(key: Hash256) -> Hash256 {
    let mut bytes = *key.as_bytes();
    for byte in bytes[..24].iter_mut().rev() {
        let (sum, overflow) = byte.overflowing_add(1);
        *byte = sum;
        if !overflow {
            break;
        }
    }
    Hash256::from_bytes(bytes)
}

/// Key of the fee-settings entry.
pub fn fee_index() -> Hash256 {
    let mut h = Sha512HalfHasher::new();
    h.update_u16(SPACE_FEE);
    h.finalize()
}

/// Key of the amendments entry.
pub fn amendment_index() -> Hash256 {
    let mut h = Sha512HalfHasher::new();
    h.update_u16(SPACE_AMENDMENT);
    h.finalize()
}

/// Key of the dense skip list (hashes of the most recent 256 ledgers).
pub fn skip_list_index() -> Hash256 {
    let mut h = Sha512HalfHasher::new();
    h.update_u16(SPACE_SKIP_LIST);
    h.finalize()
}

/// Key of the sparse skip-list page covering `ledger_seq`.
///
/// One page per 2^16-ledger span; each page holds one hash per 256-ledger
/// epoch.
pub fn skip_list_index_for(ledger_seq: u32) -> Hash256 {
    let mut h = Sha512HalfHasher::new();
    h.update_u16(SPACE_SKIP_LIST);
    h.update_u32(ledger_seq >> 16);
    h.finalize()
}

/// Key of the ticket created by `account` at `sequence`.
pub fn ticket_index(account: &AccountId, sequence: u32) -> Hash256 {
    let mut h = Sha512HalfHasher::new();
    h.update_u16(SPACE_TICKET);
    h.update(account.as_bytes());
    h.update_u32(sequence);
    h.finalize()
}
