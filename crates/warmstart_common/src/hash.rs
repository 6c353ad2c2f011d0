//! Content hashing for artifact identity tags and integrity checks.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Process-wide hash seed, passed explicitly into engine construction.
///
/// Every source-identity tag and flag hash is computed with this seed, so two
/// engines only agree on artifact identity when they were configured with the
/// same seed.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
pub struct HashSeed(pub u64);

impl HashSeed {
    /// Returns the raw seed value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for HashSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A 128-bit content hash computed using XXH3.
///
/// Two byte sequences with the same `ContentHash` (under the same seed) are
/// assumed to be identical. Used for source-identity tags, compiler flag
/// fingerprints, and artifact checksums.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash([u8; 16]);

impl ContentHash {
    /// Computes an unseeded content hash from a byte slice using XXH3-128.
    pub fn from_bytes(data: &[u8]) -> Self {
        let hash = xxhash_rust::xxh3::xxh3_128(data);
        Self(hash.to_le_bytes())
    }

    /// Computes a content hash from a byte slice using XXH3-128 with `seed`.
    pub fn from_bytes_seeded(data: &[u8], seed: HashSeed) -> Self {
        let hash = xxhash_rust::xxh3::xxh3_128_with_seed(data, seed.get());
        Self(hash.to_le_bytes())
    }

    /// Wraps raw little-endian hash bytes, e.g. read back from an artifact.
    pub fn from_raw(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Returns the raw little-endian hash bytes.
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({:02x}{:02x}..)", self.0[0], self.0[1])
    }
}
