//! Immutable, self-describing cache artifacts.
//!
//! An artifact is the only thing that crosses from one execution context to
//! another. Its bytes are laid out as:
//!
//! ```text
//! [0..4)    magic b"WSCC"
//! [4..8)    declared total length, u32 little-endian
//! [8..24)   XXH3-128 checksum of bytes [24..)
//! [24..)    bincode ArtifactHeader, then the backend payload
//! ```
//!
//! The checksum covers the header and payload, so flipping any byte after
//! the length field is caught before the header is even decoded.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use warmstart_common::ContentHash;

use crate::error::{CacheError, RejectReason};
use crate::identity::{BackendIdentity, SourceDescriptor};

/// Magic bytes identifying a warmstart code cache artifact.
pub const ARTIFACT_MAGIC: [u8; 4] = *b"WSCC";

/// Current artifact format version. Increment on breaking changes to
/// the preamble or header layout.
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// Bytes before the bincode header: magic, declared length, checksum.
pub(crate) const PREAMBLE_LEN: usize = 24;

/// Identity header encoded after the preamble.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactHeader {
    /// Artifact format version.
    pub format_version: u32,
    /// Version of the engine that produced the artifact.
    pub engine_version: String,
    /// Seeded hash of the producing backend's compiler flags.
    pub flag_hash: ContentHash,
    /// Seeded hash of the source text the payload was compiled from.
    pub source_tag: ContentHash,
    /// Byte length of that source text.
    pub source_len: u32,
    /// Byte length of the payload following the header.
    pub payload_len: u32,
}

/// A serialized compiled unit.
///
/// Cloning is cheap and shares the same immutable bytes, so one artifact can
/// be handed to any number of contexts on any number of threads.
#[derive(Clone, PartialEq, Eq)]
pub struct CacheArtifact {
    bytes: Arc<[u8]>,
    length: usize,
}

impl CacheArtifact {
    /// Frames `payload` with the identity of `backend` and `source`.
    pub fn seal(
        identity: &BackendIdentity,
        source: &SourceDescriptor,
        payload: &[u8],
    ) -> Result<Self, CacheError> {
        let too_large = |what: &str| CacheError::Serialization {
            reason: format!("{what} exceeds u32::MAX bytes"),
        };
        let header = ArtifactHeader {
            format_version: ARTIFACT_FORMAT_VERSION,
            engine_version: identity.engine_version().to_string(),
            flag_hash: identity.flag_hash(),
            source_tag: identity.source_tag(source),
            source_len: u32::try_from(source.len()).map_err(|_| too_large("source"))?,
            payload_len: u32::try_from(payload.len()).map_err(|_| too_large("payload"))?,
        };

        let header_bytes = bincode::serde::encode_to_vec(&header, bincode::config::standard())
            .map_err(|e| CacheError::Serialization {
                reason: e.to_string(),
            })?;

        let total = PREAMBLE_LEN + header_bytes.len() + payload.len();
        let declared = u32::try_from(total).map_err(|_| too_large("artifact"))?;

        let mut output = Vec::with_capacity(total);
        output.extend_from_slice(&ARTIFACT_MAGIC);
        output.extend_from_slice(&declared.to_le_bytes());
        output.extend_from_slice(&[0u8; 16]);
        output.extend_from_slice(&header_bytes);
        output.extend_from_slice(payload);

        let checksum = ContentHash::from_bytes(&output[PREAMBLE_LEN..]);
        output[8..PREAMBLE_LEN].copy_from_slice(checksum.as_bytes());

        Ok(Self::from_bytes(output))
    }

    /// Adopts bytes received from a transport. Nothing is checked here; the
    /// validation gate decides whether the bytes are usable.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        let length = bytes.len();
        Self {
            bytes: bytes.into(),
            length,
        }
    }

    /// Adopts bytes whose length was communicated separately, e.g. by a
    /// framed transport. A disagreement is reported as `Malformed` by the gate.
    pub fn from_parts(bytes: Vec<u8>, length: usize) -> Self {
        Self {
            bytes: bytes.into(),
            length,
        }
    }

    /// Read-only view of the artifact bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The length the artifact was handed over with.
    pub fn len(&self) -> usize {
        self.length
    }

    /// Returns `true` if the artifact carries no bytes.
    pub fn is_empty(&self) -> bool {
        self.length == 0 || self.bytes.is_empty()
    }

    /// Decodes the header for inspection. Integrity is checked, identity is not.
    pub fn header(&self) -> Result<ArtifactHeader, CacheError> {
        self.parse()
            .map(|(header, _)| header)
            .map_err(CacheError::Rejected)
    }

    /// Checks the structure of the artifact and splits it into header and
    /// payload. Every failure here is [`RejectReason::Malformed`].
    pub(crate) fn parse(&self) -> Result<(ArtifactHeader, &[u8]), RejectReason> {
        let raw: &[u8] = &self.bytes;
        if raw.is_empty() || self.length != raw.len() || raw.len() < PREAMBLE_LEN {
            return Err(RejectReason::Malformed);
        }
        if raw[..4] != ARTIFACT_MAGIC {
            return Err(RejectReason::Malformed);
        }

        let declared = u32::from_le_bytes([raw[4], raw[5], raw[6], raw[7]]) as usize;
        if declared != raw.len() {
            return Err(RejectReason::Malformed);
        }

        let mut stored = [0u8; 16];
        stored.copy_from_slice(&raw[8..PREAMBLE_LEN]);
        let body = &raw[PREAMBLE_LEN..];
        if ContentHash::from_raw(stored) != ContentHash::from_bytes(body) {
            return Err(RejectReason::Malformed);
        }

        let (header, used): (ArtifactHeader, usize) =
            bincode::serde::decode_from_slice(body, bincode::config::standard())
                .map_err(|_| RejectReason::Malformed)?;

        let payload = &body[used..];
        if header.payload_len as usize != payload.len() {
            return Err(RejectReason::Malformed);
        }
        Ok((header, payload))
    }
}

impl fmt::Debug for CacheArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheArtifact")
            .field("length", &self.length)
            .finish_non_exhaustive()
    }
}
