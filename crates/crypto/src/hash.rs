//! SHA-512-Half hashing, single-shot and streaming.

use sha2::{Digest, Sha512};
use weft_common::Hash256;

/// Computes the SHA-512-Half of the given data: the first 32 bytes of the
/// SHA-512 digest.
///
/// # Example
///
/// ```
/// use weft_crypto::sha512_half;
///
/// let hash = sha512_half(b"hello world");
/// assert_eq!(hash.as_bytes().len(), 32);
/// ```
pub fn sha512_half(data: &[u8]) -> Hash256 {
    let mut hasher = Sha512::new();
    hasher.update(data);
    finalize(hasher)
}

/// Computes the SHA-512-Half of multiple data chunks.
///
/// Equivalent to concatenating the chunks and hashing the result, without
/// the intermediate buffer.
///
/// # Example
///
/// ```
/// use weft_crypto::{sha512_half, sha512_half_multi};
///
/// assert_eq!(sha512_half(b"helloworld"), sha512_half_multi(&[b"hello", b"world"]));
/// ```
pub fn sha512_half_multi(chunks: &[&[u8]]) -> Hash256 {
    let mut hasher = Sha512::new();
    for chunk in chunks {
        hasher.update(chunk);
    }
    finalize(hasher)
}

fn finalize(hasher: Sha512) -> Hash256 {
    let digest = hasher.finalize();
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&digest[..32]);
    Hash256(bytes)
}

/// A streaming SHA-512-Half hasher for incremental computation.
///
/// The index-derivation and header-hashing code feeds fixed-width
/// big-endian fields through this one at a time.
///
/// # Example
///
/// ```
/// use weft_crypto::Sha512HalfHasher;
///
/// let mut hasher = Sha512HalfHasher::new();
/// hasher.update(b"chunk 1");
/// hasher.update(b"chunk 2");
/// let hash = hasher.finalize();
/// ```
pub struct Sha512HalfHasher {
    inner: Sha512,
}

impl Sha512HalfHasher {
    /// Creates a new hasher.
    pub fn new() -> Self {
        Self {
            inner: Sha512::new(),
        }
    }

    /// Creates a hasher seeded with a 4-byte domain tag.
    pub fn with_prefix(prefix: u32) -> Self {
        let mut hasher = Self::new();
        hasher.update_u32(prefix);
        hasher
    }

    /// Feeds raw bytes into the hasher.
    pub fn update(&mut self, data: &[u8]) {
        self.inner.update(data);
    }

    /// Feeds a big-endian 16-bit value.
    pub fn update_u16(&mut self, value: u16) {
        self.inner.update(value.to_be_bytes());
    }

    /// Feeds a big-endian 32-bit value.
    pub fn update_u32(&mut self, value: u32) {
        self.inner.update(value.to_be_bytes());
    }

    /// Feeds a big-endian 64-bit value.
    pub fn update_u64(&mut self, value: u64) {
        self.inner.update(value.to_be_bytes());
    }

    /// Consumes the hasher and returns the half digest.
    pub fn finalize(self) -> Hash256 {
        finalize(self.inner)
    }
}

impl Default for Sha512HalfHasher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha512_half_vector() {
        // First half of the NIST SHA-512 test vector for "abc".
        let hash = sha512_half(b"abc");
        assert_eq!(
            hash.to_hex().to_lowercase(),
            "ddaf35a193617abacc417349ae20413112e6fa4e89a97ea20a9eeee64b55d39a"
        );
    }

    #[test]
    fn multi_matches_single() {
        assert_eq!(
            sha512_half(b"helloworld"),
            sha512_half_multi(&[b"hello", b"world"])
        );
    }

    #[test]
    fn streaming_matches_single() {
        let mut hasher = Sha512HalfHasher::new();
        hasher.update(b"hello");
        hasher.update(b"world");
        assert_eq!(hasher.finalize(), sha512_half(b"helloworld"));
    }

    #[test]
    fn streaming_fields_are_big_endian() {
        let mut hasher = Sha512HalfHasher::new();
        hasher.update_u16(0x0102);
        hasher.update_u32(0x0304_0506);
        hasher.update_u64(0x0708_090a_0b0c_0d0e);
        assert_eq!(
            hasher.finalize(),
            sha512_half(&[
                0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a, 0x0b, 0x0c, 0x0d, 0x0e
            ])
        );
    }
}
