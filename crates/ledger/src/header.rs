//! Ledger header codec and identity hash.
//!
//! The canonical header is exactly 118 bytes, big-endian, in a fixed field
//! order. The *identity hash* of a ledger is the SHA-512-Half of the
//! header behind the ledger-master domain tag; the prefixed form is also
//! what the node store keeps on disk.

use weft_common::Hash256;
use weft_crypto::{sha512_half, HashPrefix};

use crate::entry::CodecError;

/// Size of the canonical header encoding.
pub const HEADER_SIZE: usize = 118;

/// Close flag: the close time was not consensus-agreed.
pub const CLOSE_FLAG_NO_CONSENSUS_TIME: u8 = 1;

/// The fixed header fields of a ledger.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct LedgerHeader {
    pub sequence: u32,
    /// Total native coins in existence.
    pub total_coins: u64,
    pub parent_hash: Hash256,
    /// Transaction-map root hash.
    pub tx_hash: Hash256,
    /// State-map root hash.
    pub state_hash: Hash256,
    pub parent_close_time: u32,
    pub close_time: u32,
    /// Granularity of the close time, in seconds.
    pub close_time_resolution: u8,
    pub close_flags: u8,
}

impl LedgerHeader {
    /// Canonical 118-byte encoding.
    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        buf[0..4].copy_from_slice(&self.sequence.to_be_bytes());
        buf[4..12].copy_from_slice(&self.total_coins.to_be_bytes());
        buf[12..44].copy_from_slice(self.parent_hash.as_bytes());
        buf[44..76].copy_from_slice(self.tx_hash.as_bytes());
        buf[76..108].copy_from_slice(self.state_hash.as_bytes());
        buf[108..112].copy_from_slice(&self.parent_close_time.to_be_bytes());
        buf[112..116].copy_from_slice(&self.close_time.to_be_bytes());
        buf[116] = self.close_time_resolution;
        buf[117] = self.close_flags;
        buf
    }

    /// Encoding with the 4-byte ledger-master tag in front, as hashed and
    /// as stored in the node store.
    pub fn encode_prefixed(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(4 + HEADER_SIZE);
        buf.extend_from_slice(&HashPrefix::LedgerMaster.to_bytes());
        buf.extend_from_slice(&self.encode());
        buf
    }

    /// Decode a header, optionally discarding a leading 4-byte tag.
    pub fn decode(bytes: &[u8], has_prefix: bool) -> Result<Self, CodecError> {
        let bytes = if has_prefix {
            if bytes.len() < 4 {
                return Err(CodecError::UnexpectedEof);
            }
            &bytes[4..]
        } else {
            bytes
        };

        if bytes.len() < HEADER_SIZE {
            return Err(CodecError::UnexpectedEof);
        }
        if bytes.len() > HEADER_SIZE {
            return Err(CodecError::TrailingBytes);
        }

        let u32_at = |at: usize| u32::from_be_bytes(bytes[at..at + 4].try_into().unwrap());
        let hash_at = |at: usize| {
            Hash256::from_bytes(bytes[at..at + 32].try_into().unwrap())
        };

        Ok(Self {
            sequence: u32_at(0),
            total_coins: u64::from_be_bytes(bytes[4..12].try_into().unwrap()),
            parent_hash: hash_at(12),
            tx_hash: hash_at(44),
            state_hash: hash_at(76),
            parent_close_time: u32_at(108),
            close_time: u32_at(112),
            close_time_resolution: bytes[116],
            close_flags: bytes[117],
        })
    }

    /// The identity hash: SHA-512-Half of the prefixed encoding.
    pub fn hash(&self) -> Hash256 {
        sha512_half(&self.encode_prefixed())
    }

    /// Whether the close time was consensus-agreed.
    pub fn close_agree(&self) -> bool {
        self.close_flags & CLOSE_FLAG_NO_CONSENSUS_TIME == 0
    }
}
