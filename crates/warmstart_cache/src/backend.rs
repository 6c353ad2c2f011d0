//! The contract a compilation backend fulfils for the cache core.

use crate::error::CacheError;
use crate::guard::{CompileGate, CompilePermit};
use crate::identity::{BackendIdentity, SourceDescriptor};

/// A compiler that can externalize its output and rebuild from it.
///
/// The core never looks inside `Unit` or the payload bytes. Backends must
/// route every fresh compilation through [`compile`](Self::compile), which
/// requires a [`CompilePermit`]; inside
/// [`compile_with_cache`](Self::compile_with_cache) the permit has to be
/// requested from the supplied gate, and that request fails while the cache
/// is being consumed.
pub trait CompilationBackend {
    /// The backend's compiled form.
    type Unit;

    /// Identity embedded into, and checked against, every artifact.
    fn identity(&self) -> &BackendIdentity;

    /// Compiles `source` from scratch.
    ///
    /// Fails with [`CacheError::Compile`] on syntax or semantic errors.
    fn compile(
        &mut self,
        permit: &CompilePermit<'_>,
        source: &SourceDescriptor,
    ) -> Result<Self::Unit, CacheError>;

    /// Externalizes `unit` into payload bytes.
    ///
    /// Fails with [`CacheError::SerializationUnsupported`] if the unit
    /// depends on per-context state.
    fn serialize(&self, unit: &Self::Unit) -> Result<Vec<u8>, CacheError>;

    /// Rebuilds a unit from payload bytes that already passed the gate.
    fn compile_with_cache(
        &mut self,
        gate: &CompileGate,
        source: &SourceDescriptor,
        payload: &[u8],
    ) -> Result<Self::Unit, CacheError>;
}
