//! Identity tags embedded in every artifact.

use std::sync::Arc;

use warmstart_common::{ContentHash, HashSeed};

/// Identity of a compilation backend build.
///
/// Two backends may exchange artifacts only if their engine version and flag
/// hash match. The flag hash is seeded, so a different hash seed is also a
/// mismatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendIdentity {
    engine_version: String,
    flag_hash: ContentHash,
    hash_seed: HashSeed,
}

impl BackendIdentity {
    /// Builds an identity from the engine version, a fingerprint of every
    /// flag that affects the compiled representation, and the hash seed.
    pub fn new(engine_version: impl Into<String>, flags_fingerprint: &str, seed: HashSeed) -> Self {
        Self {
            engine_version: engine_version.into(),
            flag_hash: ContentHash::from_bytes_seeded(flags_fingerprint.as_bytes(), seed),
            hash_seed: seed,
        }
    }

    /// The engine version string.
    pub fn engine_version(&self) -> &str {
        &self.engine_version
    }

    /// The seeded hash of the compiler flags.
    pub fn flag_hash(&self) -> ContentHash {
        self.flag_hash
    }

    /// The hash seed all identity tags are computed with.
    pub fn hash_seed(&self) -> HashSeed {
        self.hash_seed
    }

    /// Computes the source-identity tag for `source` under this backend's seed.
    pub fn source_tag(&self, source: &SourceDescriptor) -> ContentHash {
        ContentHash::from_bytes_seeded(source.text().as_bytes(), self.hash_seed)
    }
}

/// Source text plus its origin label.
///
/// Only the text participates in identity; the origin is used for
/// diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDescriptor {
    text: Arc<str>,
    origin: Arc<str>,
}

impl SourceDescriptor {
    /// Creates a descriptor for `text` labelled `origin`.
    pub fn new(text: impl Into<Arc<str>>, origin: impl Into<Arc<str>>) -> Self {
        Self {
            text: text.into(),
            origin: origin.into(),
        }
    }

    /// The source text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The origin label.
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Length of the source text in bytes.
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Returns `true` if the source text is empty.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}
