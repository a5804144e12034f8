//! Primitive value types.

use std::fmt;

/// 32-byte hash, big-endian when treated numerically.
///
/// Ordering is byte-lexicographic, which for big-endian values coincides
/// with numeric ordering. Order-book keys rely on this: the quality field
/// lives in the trailing 8 bytes, so iterating keys in order traverses
/// offers in quality order.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Hash256(pub [u8; 32]);

impl Hash256 {
    /// Zero hash.
    pub const ZERO: Self = Self([0u8; 32]);

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Create from raw bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Create from a hex string.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        if bytes.len() != 32 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }

    /// Convert to an uppercase hex string.
    pub fn to_hex(&self) -> String {
        hex::encode_upper(self.0)
    }

    /// Check if this is the zero hash.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// Read the trailing 8 bytes as a big-endian 64-bit value.
    ///
    /// Order-book directory keys store the offer quality here.
    pub fn trailing_u64(&self) -> u64 {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(&self.0[24..]);
        u64::from_be_bytes(buf)
    }

    /// Replace the trailing 8 bytes with a big-endian 64-bit value.
    pub fn with_trailing_u64(mut self, value: u64) -> Self {
        self.0[24..].copy_from_slice(&value.to_be_bytes());
        self
    }
}

impl fmt::Debug for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash256({})", self.to_hex())
    }
}

impl fmt::Display for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl From<[u8; 32]> for Hash256 {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Hash256 {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// 20-byte account identifier.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct AccountId(pub [u8; 20]);

impl AccountId {
    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Create from raw bytes.
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Convert to an uppercase hex string.
    pub fn to_hex(&self) -> String {
        hex::encode_upper(self.0)
    }
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountId({})", self.to_hex())
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl From<[u8; 20]> for AccountId {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for AccountId {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// 20-byte currency code. All zeroes is the native currency.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Currency(pub [u8; 20]);

impl Currency {
    /// The native currency.
    pub const NATIVE: Self = Self([0u8; 20]);

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Create from raw bytes.
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Check whether this is the native currency.
    pub fn is_native(&self) -> bool {
        self.0 == [0u8; 20]
    }
}

impl fmt::Debug for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_native() {
            write!(f, "Currency(native)")
        } else {
            write!(f, "Currency({})", hex::encode_upper(self.0))
        }
    }
}

impl AsRef<[u8]> for Currency {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// A currency and its issuing account.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
pub struct Issue {
    pub currency: Currency,
    pub account: AccountId,
}

impl Issue {
    pub fn new(currency: Currency, account: AccountId) -> Self {
        Self { currency, account }
    }

    /// The native issue (native currency, no issuer).
    pub fn native() -> Self {
        Self::default()
    }
}

/// An order book: what the taker pays and what the taker gets.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Book {
    pub taker_pays: Issue,
    pub taker_gets: Issue,
}

impl Book {
    pub fn new(taker_pays: Issue, taker_gets: Issue) -> Self {
        Self {
            taker_pays,
            taker_gets,
        }
    }

    /// A book is consistent when both sides differ.
    pub fn is_consistent(&self) -> bool {
        self.taker_pays != self.taker_gets
    }
}

/// A protocol amount: native drops, or an issued-currency value in
/// mantissa/exponent form.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Amount {
    /// Native currency, in drops.
    Drops(u64),
    /// Issued currency.
    Issued {
        issue: Issue,
        mantissa: i64,
        exponent: i8,
    },
}

impl Amount {
    pub fn is_native(&self) -> bool {
        matches!(self, Amount::Drops(_))
    }

    /// The issue this amount is denominated in.
    pub fn issue(&self) -> Issue {
        match self {
            Amount::Drops(_) => Issue::native(),
            Amount::Issued { issue, .. } => *issue,
        }
    }
}
