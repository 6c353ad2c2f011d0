//! Producing and consuming code caches through a [`CompilationBackend`].

use tracing::{debug, error, warn};

use crate::artifact::CacheArtifact;
use crate::backend::CompilationBackend;
use crate::error::{CacheError, RejectReason};
use crate::guard::CompileGate;
use crate::identity::SourceDescriptor;
use crate::validate::checked_payload;

/// How [`compile_or_consume`] obtained its unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    /// Rebuilt from the artifact.
    Consumed,
    /// The artifact was rejected and the source was compiled fresh.
    Rejected(RejectReason),
    /// No artifact was supplied.
    NoCache,
}

/// Compiles `source` from scratch. Fails with a guard violation if called
/// inside a [`DisallowCompilation`](crate::DisallowCompilation) scope.
pub fn compile<B: CompilationBackend>(
    backend: &mut B,
    gate: &CompileGate,
    source: &SourceDescriptor,
) -> Result<B::Unit, CacheError> {
    let permit = gate.permit()?;
    debug!(origin = source.origin(), len = source.len(), "compiling from source");
    backend.compile(&permit, source)
}

/// Serializes `unit` and seals it with the backend's identity.
pub fn create_code_cache<B: CompilationBackend>(
    backend: &B,
    unit: &B::Unit,
    source: &SourceDescriptor,
) -> Result<CacheArtifact, CacheError> {
    let payload = backend.serialize(unit)?;
    let artifact = CacheArtifact::seal(backend.identity(), source, &payload)?;
    debug!(
        origin = source.origin(),
        payload_len = payload.len(),
        artifact_len = artifact.len(),
        "created code cache"
    );
    Ok(artifact)
}

/// Rebuilds a unit from `artifact` without compiling.
///
/// The artifact is validated first; a rejection comes back as
/// [`CacheError::Rejected`] and the caller may compile fresh. The backend then
/// runs under a [`DisallowCompilation`](crate::DisallowCompilation) scope that
/// is released on every exit path.
pub fn consume<B: CompilationBackend>(
    backend: &mut B,
    gate: &CompileGate,
    source: &SourceDescriptor,
    artifact: &CacheArtifact,
) -> Result<B::Unit, CacheError> {
    let payload = checked_payload(artifact, backend.identity(), source)
        .map_err(CacheError::Rejected)?;

    let result = {
        let _no_compile = gate.disallow();
        backend.compile_with_cache(gate, source, payload)
    };

    match &result {
        Ok(_) => debug!(origin = source.origin(), "consumed code cache"),
        Err(CacheError::GuardViolation(violation)) => error!(
            origin = source.origin(),
            depth = violation.depth,
            "backend fell back to fresh compilation while consuming a code cache"
        ),
        Err(e) => debug!(origin = source.origin(), error = %e, "code cache consumption failed"),
    }
    result
}

/// Consumes `artifact` when given one, compiling fresh if it is rejected.
///
/// The fallback compile runs after the guard scope has been released.
/// Anything other than a rejection, in particular a guard violation, is
/// returned unchanged.
pub fn compile_or_consume<B: CompilationBackend>(
    backend: &mut B,
    gate: &CompileGate,
    source: &SourceDescriptor,
    artifact: Option<&CacheArtifact>,
) -> Result<(B::Unit, CacheOutcome), CacheError> {
    let Some(artifact) = artifact else {
        return Ok((compile(backend, gate, source)?, CacheOutcome::NoCache));
    };

    match consume(backend, gate, source, artifact) {
        Ok(unit) => Ok((unit, CacheOutcome::Consumed)),
        Err(CacheError::Rejected(reason)) => {
            warn!(origin = source.origin(), %reason, "code cache rejected, compiling from source");
            let unit = compile(backend, gate, source)?;
            Ok((unit, CacheOutcome::Rejected(reason)))
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CompileError;
    use crate::guard::{CompilePermit, GuardViolation};
    use crate::identity::BackendIdentity;
    use warmstart_common::HashSeed;

    /// Compiles by upper-casing the text; rebuilds by reading it back.
    struct UpperBackend {
        identity: BackendIdentity,
        fresh: usize,
        rebuilt: usize,
        always_recompile: bool,
    }

    impl UpperBackend {
        fn new() -> Self {
            Self {
                identity: BackendIdentity::new("test", "upper", HashSeed(1337)),
                fresh: 0,
                rebuilt: 0,
                always_recompile: false,
            }
        }

        fn recompiling() -> Self {
            Self {
                always_recompile: true,
                ..Self::new()
            }
        }
    }

    impl CompilationBackend for UpperBackend {
        type Unit = String;

        fn identity(&self) -> &BackendIdentity {
            &self.identity
        }

        fn compile(
            &mut self,
            _permit: &CompilePermit<'_>,
            source: &SourceDescriptor,
        ) -> Result<String, CacheError> {
            if source.text().contains('!') {
                return Err(CompileError {
                    origin: source.origin().to_string(),
                    line: 1,
                    column: 1,
                    message: "bang".to_string(),
                }
                .into());
            }
            self.fresh += 1;
            Ok(source.text().to_uppercase())
        }

        fn serialize(&self, unit: &String) -> Result<Vec<u8>, CacheError> {
            if unit.is_empty() {
                return Err(CacheError::SerializationUnsupported {
                    reason: "empty unit".to_string(),
                });
            }
            Ok(unit.as_bytes().to_vec())
        }

        fn compile_with_cache(
            &mut self,
            gate: &CompileGate,
            source: &SourceDescriptor,
            payload: &[u8],
        ) -> Result<String, CacheError> {
            if self.always_recompile {
                let permit = gate.permit()?;
                return self.compile(&permit, source);
            }
            self.rebuilt += 1;
            Ok(String::from_utf8_lossy(payload).into_owned())
        }
    }

    fn src(text: &str) -> SourceDescriptor {
        SourceDescriptor::new(text, "unit test")
    }

    #[test]
    fn produce_then_consume() {
        let gate = CompileGate::new();
        let mut producer = UpperBackend::new();
        let unit = compile(&mut producer, &gate, &src("abc")).unwrap();
        let artifact = create_code_cache(&producer, &unit, &src("abc")).unwrap();

        let mut consumer = UpperBackend::new();
        let other_gate = CompileGate::new();
        let rebuilt = consume(&mut consumer, &other_gate, &src("abc"), &artifact).unwrap();
        assert_eq!(rebuilt, "ABC");
        assert_eq!(consumer.fresh, 0);
        assert_eq!(consumer.rebuilt, 1);
        assert!(other_gate.is_allowed());
    }

    #[test]
    fn compile_error_propagates() {
        let gate = CompileGate::new();
        let mut backend = UpperBackend::new();
        let err = compile(&mut backend, &gate, &src("oops!")).unwrap_err();
        assert!(matches!(err, CacheError::Compile(_)));
    }

    #[test]
    fn serialization_unsupported_propagates() {
        let backend = UpperBackend::new();
        let err = create_code_cache(&backend, &String::new(), &src("")).unwrap_err();
        assert!(matches!(err, CacheError::SerializationUnsupported { .. }));
    }

    #[test]
    fn recompiling_backend_hits_guard_violation() {
        let gate = CompileGate::new();
        let mut producer = UpperBackend::new();
        let unit = compile(&mut producer, &gate, &src("abc")).unwrap();
        let artifact = create_code_cache(&producer, &unit, &src("abc")).unwrap();

        let mut cheat = UpperBackend::recompiling();
        let err = consume(&mut cheat, &gate, &src("abc"), &artifact).unwrap_err();
        assert!(matches!(err, CacheError::GuardViolation(GuardViolation { depth: 1 })));
        assert_eq!(cheat.fresh, 0);
        assert!(gate.is_allowed(), "guard must be released after a violation");
    }

    #[test]
    fn guard_violation_is_not_swallowed_by_fallback() {
        let gate = CompileGate::new();
        let mut producer = UpperBackend::new();
        let unit = compile(&mut producer, &gate, &src("abc")).unwrap();
        let artifact = create_code_cache(&producer, &unit, &src("abc")).unwrap();

        let mut cheat = UpperBackend::recompiling();
        let err = compile_or_consume(&mut cheat, &gate, &src("abc"), Some(&artifact)).unwrap_err();
        assert!(matches!(err, CacheError::GuardViolation(_)));
    }

    #[test]
    fn rejection_falls_back_outside_the_guard() {
        let gate = CompileGate::new();
        let mut producer = UpperBackend::new();
        let unit = compile(&mut producer, &gate, &src("abc")).unwrap();
        let artifact = create_code_cache(&producer, &unit, &src("abc")).unwrap();

        let mut consumer = UpperBackend::new();
        let (unit, outcome) =
            compile_or_consume(&mut consumer, &gate, &src("abd"), Some(&artifact)).unwrap();
        assert_eq!(unit, "ABD");
        assert_eq!(outcome, CacheOutcome::Rejected(RejectReason::SourceMismatch));
        assert_eq!(consumer.fresh, 1);
        assert_eq!(consumer.rebuilt, 0);
    }

    #[test]
    fn consume_reports_rejection() {
        let gate = CompileGate::new();
        let mut backend = UpperBackend::new();
        let garbage = CacheArtifact::from_bytes(vec![1, 2, 3]);
        let err = consume(&mut backend, &gate, &src("abc"), &garbage).unwrap_err();
        assert!(matches!(err, CacheError::Rejected(RejectReason::Malformed)));
        assert!(err.is_recoverable());
    }

    #[test]
    fn no_artifact_compiles() {
        let gate = CompileGate::new();
        let mut backend = UpperBackend::new();
        let (unit, outcome) = compile_or_consume(&mut backend, &gate, &src("xy"), None).unwrap();
        assert_eq!(unit, "XY");
        assert_eq!(outcome, CacheOutcome::NoCache);
    }

    #[test]
    fn compile_inside_scope_is_violation() {
        let gate = CompileGate::new();
        let mut backend = UpperBackend::new();
        let _scope = gate.disallow();
        let err = compile(&mut backend, &gate, &src("abc")).unwrap_err();
        assert!(matches!(err, CacheError::GuardViolation(_)));
    }

    #[test]
    fn serializing_twice_gives_two_consumable_artifacts() {
        let gate = CompileGate::new();
        let mut backend = UpperBackend::new();
        let unit = compile(&mut backend, &gate, &src("twice")).unwrap();
        let first = create_code_cache(&backend, &unit, &src("twice")).unwrap();
        let second = create_code_cache(&backend, &unit, &src("twice")).unwrap();
        for artifact in [&first, &second] {
            let rebuilt = consume(&mut backend, &gate, &src("twice"), artifact).unwrap();
            assert_eq!(rebuilt, "TWICE");
        }
    }
}
