//! The validation gate: decides whether an artifact may be consumed.
//!
//! The gate is purely inspective. It checks structure first, then backend
//! identity, then source identity, and reports the first failure.

use tracing::debug;

use crate::artifact::{CacheArtifact, ARTIFACT_FORMAT_VERSION};
use crate::error::RejectReason;
use crate::identity::{BackendIdentity, SourceDescriptor};

/// Outcome of running an artifact through the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The artifact may be handed to the backend.
    Accepted,
    /// The artifact must not be consumed.
    Rejected(RejectReason),
}

impl Verdict {
    /// Returns `true` for [`Verdict::Accepted`].
    pub fn is_accepted(self) -> bool {
        matches!(self, Verdict::Accepted)
    }
}

/// Checks `artifact` against the consuming backend and the source being compiled.
pub fn validate(
    artifact: &CacheArtifact,
    identity: &BackendIdentity,
    source: &SourceDescriptor,
) -> Verdict {
    match checked_payload(artifact, identity, source) {
        Ok(_) => Verdict::Accepted,
        Err(reason) => Verdict::Rejected(reason),
    }
}

/// Runs the gate and, on acceptance, returns the payload bytes.
pub(crate) fn checked_payload<'a>(
    artifact: &'a CacheArtifact,
    identity: &BackendIdentity,
    source: &SourceDescriptor,
) -> Result<&'a [u8], RejectReason> {
    let (header, payload) = artifact.parse().inspect_err(|_| {
        debug!(origin = source.origin(), len = artifact.len(), "artifact malformed");
    })?;

    if header.format_version != ARTIFACT_FORMAT_VERSION
        || header.engine_version != identity.engine_version()
        || header.flag_hash != identity.flag_hash()
    {
        debug!(
            origin = source.origin(),
            artifact_version = %header.engine_version,
            engine_version = identity.engine_version(),
            format_version = header.format_version,
            "artifact built by a different backend"
        );
        return Err(RejectReason::VersionMismatch);
    }

    if header.source_len as usize != source.len()
        || header.source_tag != identity.source_tag(source)
    {
        debug!(origin = source.origin(), "artifact built for different source text");
        return Err(RejectReason::SourceMismatch);
    }

    Ok(payload)
}
