//! The engine's [`CompilationBackend`]: source text to bytecode and back.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};
use warmstart_cache::{
    BackendIdentity, CacheError, CompilationBackend, CompileError, CompileGate, CompilePermit,
    SourceDescriptor,
};
use warmstart_config::CompilerFlags;

use crate::bytecode::Chunk;
use crate::compiler::{compile_program, CompileOptions};
use crate::context::ContextId;
use crate::lexer::line_col;
use crate::parser::parse;
use crate::value::Value;

/// A compiled unit, valid only inside the context that produced it.
#[derive(Debug, Clone)]
pub struct Script {
    chunk: Arc<Chunk>,
    source: SourceDescriptor,
    context: ContextId,
    inlined: Vec<String>,
}

impl Script {
    /// The context this script belongs to.
    pub fn context(&self) -> ContextId {
        self.context
    }

    /// The source the script was compiled from.
    pub fn source(&self) -> &SourceDescriptor {
        &self.source
    }

    /// The script's bytecode.
    pub fn chunk(&self) -> &Chunk {
        &self.chunk
    }

    /// Returns `true` if the script inlined context constants and therefore
    /// cannot be serialized.
    pub fn is_context_bound(&self) -> bool {
        !self.inlined.is_empty()
    }
}

/// Per-context compiler state.
pub struct ScriptBackend {
    identity: BackendIdentity,
    flags: CompilerFlags,
    context: ContextId,
    constants: HashMap<String, Value>,
    fresh_compiles: u64,
}

impl ScriptBackend {
    /// Creates the backend for one context.
    pub fn new(identity: BackendIdentity, flags: CompilerFlags, context: ContextId) -> Self {
        Self {
            identity,
            flags,
            context,
            constants: HashMap::new(),
            fresh_compiles: 0,
        }
    }

    /// Defines a compile-time constant. Scripts that reference it have the
    /// value inlined and become context-bound.
    pub fn define_constant(&mut self, name: &str, value: Value) {
        self.constants.insert(name.to_string(), value);
    }

    /// How many times this backend compiled from source.
    pub fn fresh_compiles(&self) -> u64 {
        self.fresh_compiles
    }

    fn script(&self, chunk: Chunk, source: &SourceDescriptor, inlined: Vec<String>) -> Script {
        Script {
            chunk: Arc::new(chunk),
            source: source.clone(),
            context: self.context,
            inlined,
        }
    }

    /// Decodes and checks a payload; `None` if it cannot be trusted.
    fn rebuild(&self, source: &SourceDescriptor, payload: &[u8]) -> Option<Chunk> {
        let (chunk, used): (Chunk, usize) =
            match bincode::serde::decode_from_slice(payload, bincode::config::standard()) {
                Ok(decoded) => decoded,
                Err(e) => {
                    warn!(origin = source.origin(), error = %e, "cached payload does not decode");
                    return None;
                }
            };
        if used != payload.len() {
            warn!(origin = source.origin(), "cached payload has trailing bytes");
            return None;
        }
        if chunk.source_tag != self.identity.source_tag(source) {
            warn!(origin = source.origin(), "cached chunk was compiled from other source");
            return None;
        }
        if let Err(e) = chunk.verify() {
            warn!(origin = source.origin(), error = %e, "cached chunk failed verification");
            return None;
        }
        Some(chunk)
    }
}

impl CompilationBackend for ScriptBackend {
    type Unit = Script;

    fn identity(&self) -> &BackendIdentity {
        &self.identity
    }

    fn compile(
        &mut self,
        _permit: &CompilePermit<'_>,
        source: &SourceDescriptor,
    ) -> Result<Script, CacheError> {
        let error_at = |offset: usize, message: String| {
            let (line, column) = line_col(source.text(), offset);
            CompileError {
                origin: source.origin().to_string(),
                line,
                column,
                message,
            }
        };

        let program = parse(source.text()).map_err(|e| error_at(e.offset, e.message))?;
        let compiled = compile_program(
            &program,
            &CompileOptions {
                constant_folding: self.flags.constant_folding,
                source_tag: self.identity.source_tag(source),
                constants: &self.constants,
            },
        )
        .map_err(|e| error_at(e.offset, e.message))?;

        self.fresh_compiles += 1;
        debug!(
            origin = source.origin(),
            ops = compiled.chunk.ops.len(),
            context = %self.context,
            "compiled script"
        );
        Ok(self.script(compiled.chunk, source, compiled.inlined))
    }

    fn serialize(&self, unit: &Script) -> Result<Vec<u8>, CacheError> {
        if unit.is_context_bound() {
            return Err(CacheError::SerializationUnsupported {
                reason: format!(
                    "script inlines context constant(s): {}",
                    unit.inlined.join(", ")
                ),
            });
        }
        bincode::serde::encode_to_vec(unit.chunk.as_ref(), bincode::config::standard()).map_err(
            |e| CacheError::Serialization {
                reason: e.to_string(),
            },
        )
    }

    fn compile_with_cache(
        &mut self,
        gate: &CompileGate,
        source: &SourceDescriptor,
        payload: &[u8],
    ) -> Result<Script, CacheError> {
        match self.rebuild(source, payload) {
            Some(chunk) => Ok(self.script(chunk, source, Vec::new())),
            None => {
                let permit = gate.permit()?;
                self.compile(&permit, source)
            }
        }
    }
}
