//! Error types for cache production and consumption.

use std::fmt;

use crate::guard::GuardViolation;

/// Why the validation gate refused an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RejectReason {
    /// Empty, truncated, length-inconsistent, or checksum-failing bytes.
    Malformed,
    /// Produced by a different format, engine version, or flag set.
    VersionMismatch,
    /// Produced for different source text.
    SourceMismatch,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RejectReason::Malformed => "malformed",
            RejectReason::VersionMismatch => "version mismatch",
            RejectReason::SourceMismatch => "source mismatch",
        };
        f.write_str(s)
    }
}

/// A source text that failed to compile.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{origin}:{line}:{column}: {message}")]
pub struct CompileError {
    /// Origin label of the offending source.
    pub origin: String,
    /// 1-based line of the error.
    pub line: u32,
    /// 1-based column of the error.
    pub column: u32,
    /// Description of the failure.
    pub message: String,
}

/// Errors produced while compiling, serializing, or consuming code caches.
///
/// Only [`CacheError::Rejected`] is recoverable, by compiling fresh outside
/// the consumption guard. [`CacheError::GuardViolation`] means the backend
/// broke its contract and must never be swallowed.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// The source failed to compile.
    #[error("compile error: {0}")]
    Compile(#[from] CompileError),

    /// The compiled unit cannot be externalized.
    #[error("serialization unsupported: {reason}")]
    SerializationUnsupported {
        /// Why the unit is context-local.
        reason: String,
    },

    /// The validation gate refused the artifact.
    #[error("code cache rejected: {0}")]
    Rejected(RejectReason),

    /// Fresh compilation was attempted while consuming a code cache.
    #[error("guard violation: {0}")]
    GuardViolation(#[from] GuardViolation),

    /// Encoding the artifact header or payload failed.
    #[error("serialization error: {reason}")]
    Serialization {
        /// Description of the encoding failure.
        reason: String,
    },
}

impl CacheError {
    /// Returns `true` if the caller may recover by compiling from source.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, CacheError::Rejected(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compile_error_display() {
        let err = CompileError {
            origin: "test origin".to_string(),
            line: 2,
            column: 7,
            message: "unexpected ')'".to_string(),
        };
        assert_eq!(err.to_string(), "test origin:2:7: unexpected ')'");
        let wrapped: CacheError = err.into();
        assert!(wrapped.to_string().starts_with("compile error: test origin"));
    }

    #[test]
    fn rejected_display() {
        let err = CacheError::Rejected(RejectReason::SourceMismatch);
        assert_eq!(err.to_string(), "code cache rejected: source mismatch");
    }

    #[test]
    fn only_rejection_is_recoverable() {
        assert!(CacheError::Rejected(RejectReason::Malformed).is_recoverable());
        assert!(!CacheError::GuardViolation(GuardViolation { depth: 1 }).is_recoverable());
        assert!(!CacheError::SerializationUnsupported {
            reason: "context constant".to_string()
        }
        .is_recoverable());
    }

    #[test]
    fn guard_violation_display() {
        let err = CacheError::GuardViolation(GuardViolation { depth: 2 });
        let msg = err.to_string();
        assert!(msg.contains("guard violation"));
        assert!(msg.contains("depth 2"));
    }

    #[test]
    fn serialization_error_display() {
        let err = CacheError::Serialization {
            reason: "artifact exceeds 4 GiB".to_string(),
        };
        assert!(err.to_string().contains("4 GiB"));
    }
}
