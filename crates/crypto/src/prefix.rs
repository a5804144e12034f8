//! Hash-prefix domain tags.
//!
//! Each class of hashed object gets a distinct 4-byte tag, hashed ahead of
//! the payload, so the hash of one kind of object can never be confused
//! with another. The tags spell a three-letter mnemonic followed by a zero
//! byte.

/// 4-byte domain-separation tags for SHA-512-Half hashing.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[repr(u32)]
pub enum HashPrefix {
    /// Ledger header identity hash ("LWR").
    LedgerMaster = 0x4c57_5200,
    /// Transaction id ("TXN").
    TransactionId = 0x5458_4e00,
    /// Transaction-map leaf, transaction plus metadata ("SND").
    TxNode = 0x534e_4400,
    /// State-map leaf ("MLN").
    LeafNode = 0x4d4c_4e00,
    /// Map inner node ("MIN").
    InnerNode = 0x4d49_4e00,
}

impl HashPrefix {
    /// The tag as a big-endian 32-bit value.
    pub fn as_u32(self) -> u32 {
        self as u32
    }

    /// The tag bytes, as hashed.
    pub fn to_bytes(self) -> [u8; 4] {
        (self as u32).to_be_bytes()
    }
}
