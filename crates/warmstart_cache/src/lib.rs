//! Cross-context compiled-code cache.
//!
//! A unit compiled in one execution context is serialized into an immutable
//! [`CacheArtifact`] and later consumed in another context without
//! recompiling. Every artifact passes through the validation gate
//! ([`validate`]) before any payload byte is trusted, and consumption runs
//! under a [`DisallowCompilation`] scope so a backend that quietly recompiles
//! fails with [`CacheError::GuardViolation`] instead of masking the miss.

#![warn(missing_docs)]

pub mod artifact;
pub mod backend;
pub mod code_cache;
pub mod error;
pub mod guard;
pub mod identity;
pub mod validate;

pub use artifact::{ArtifactHeader, CacheArtifact, ARTIFACT_FORMAT_VERSION, ARTIFACT_MAGIC};
pub use backend::CompilationBackend;
pub use code_cache::{compile, compile_or_consume, consume, create_code_cache, CacheOutcome};
pub use error::{CacheError, CompileError, RejectReason};
pub use guard::{CompileGate, CompilePermit, DisallowCompilation, GuardViolation};
pub use identity::{BackendIdentity, SourceDescriptor};
pub use validate::{validate, Verdict};
