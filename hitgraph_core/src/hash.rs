//! FNV-1a hashing for stable dataset fingerprints.
//!
//! Fingerprints end up in checkpoint file names, so the hash must be stable
//! across runs and platforms; `std`'s `DefaultHasher` makes no such promise.

// FNV-1a constants
const FNV_OFFSET_64: u64 = 0xcbf29ce484222325;
const FNV_PRIME_64: u64 = 0x00000100000001b3;

/// Default number of hex characters in a rendered fingerprint.
pub const FINGERPRINT_LEN: usize = 10;

/// Incremental FNV-1a 64-bit hasher.
#[derive(Clone, Copy, Debug)]
pub struct Fnv1a64 {
    state: u64,
}

impl Default for Fnv1a64 {
    fn default() -> Self {
        Self::new()
    }
}

impl Fnv1a64 {
    /// Create a hasher at the FNV offset basis.
    #[inline]
    pub const fn new() -> Self {
        Self {
            state: FNV_OFFSET_64,
        }
    }

    /// Feed raw bytes.
    #[inline]
    pub fn write(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.state ^= byte as u64;
            self.state = self.state.wrapping_mul(FNV_PRIME_64);
        }
    }

    /// Feed a string followed by a separator byte, so that
    /// `["ab", "c"]` and `["a", "bc"]` hash differently.
    #[inline]
    pub fn write_str(&mut self, s: &str) {
        self.write(s.as_bytes());
        self.write(&[0xff]);
    }

    /// Feed a little-endian u64.
    #[inline]
    pub fn write_u64(&mut self, value: u64) {
        self.write(&value.to_le_bytes());
    }

    /// Current hash value.
    #[inline]
    pub fn finish(&self) -> u64 {
        self.state
    }
}

/// FNV-1a 64-bit hash of a byte slice.
#[inline]
pub fn fnv1a_64(bytes: &[u8]) -> u64 {
    let mut hasher = Fnv1a64::new();
    hasher.write(bytes);
    hasher.finish()
}

/// Render the leading `len` hex digits of a hash (at most 16).
pub fn fingerprint_hex(hash: u64, len: usize) -> String {
    let full = format!("{:016x}", hash);
    full[..len.min(full.len())].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fnv1a_64_known_vectors() {
        assert_eq!(fnv1a_64(b""), 0xcbf29ce484222325);
        assert_eq!(fnv1a_64(b"a"), 0xaf63dc4c8601ec8c);
        assert_eq!(fnv1a_64(b"foobar"), 0x85944171f73967e8);
    }

    #[test]
    fn test_incremental_matches_oneshot() {
        let mut hasher = Fnv1a64::new();
        hasher.write(b"foo");
        hasher.write(b"bar");
        assert_eq!(hasher.finish(), fnv1a_64(b"foobar"));
    }

    #[test]
    fn test_write_str_separates_fields() {
        let mut a = Fnv1a64::new();
        a.write_str("ab");
        a.write_str("c");

        let mut b = Fnv1a64::new();
        b.write_str("a");
        b.write_str("bc");

        assert_ne!(a.finish(), b.finish());
    }

    #[test]
    fn test_fingerprint_hex() {
        assert_eq!(fingerprint_hex(0xcbf29ce484222325, FINGERPRINT_LEN), "cbf29ce484");
        assert_eq!(fingerprint_hex(0x1, 4), "0000");
        assert_eq!(fingerprint_hex(u64::MAX, 32).len(), 16);
    }
}
