//! Isolated execution contexts.
//!
//! A [`Context`] owns its compiler state, compile gate, native table,
//! globals and console. Nothing is shared with sibling contexts except the
//! immutable engine configuration and native registry. Disposal consumes the
//! context, so no operation can reach a disposed one.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, info, warn};
use warmstart_cache::{
    code_cache, CacheArtifact, CacheError, CacheOutcome, CompileGate, SourceDescriptor,
};

use crate::backend::{Script, ScriptBackend};
use crate::engine::Engine;
use crate::error::EngineError;
use crate::natives::{Console, NativeTable};
use crate::value::Value;
use crate::vm::{execute, Frame};

static NEXT_CONTEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identifier of a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId(u64);

impl ContextId {
    /// Wraps a raw id. Intended for tests and diagnostics.
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw id.
    pub fn as_raw(self) -> u64 {
        self.0
    }

    fn next() -> Self {
        Self(NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Counters kept by each context.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContextStats {
    /// Scripts compiled from source.
    pub fresh_compiles: u64,
    /// Scripts rebuilt from a code cache.
    pub cache_hits: u64,
    /// Artifacts refused by the validation gate.
    pub cache_rejections: u64,
    /// Successful or failed script runs.
    pub runs: u64,
}

/// An isolated execution environment.
pub struct Context {
    id: ContextId,
    gate: CompileGate,
    backend: ScriptBackend,
    table: NativeTable,
    console: Console,
    max_stack: usize,
    stats: ContextStats,
}

impl Context {
    /// Creates a context, resolving the engine's natives into it.
    pub fn create(engine: &Engine) -> Self {
        let id = ContextId::next();
        let backend = ScriptBackend::new(engine.identity().clone(), engine.flags().clone(), id);
        debug!(context = %id, "context created");
        Self {
            id,
            gate: CompileGate::new(),
            backend,
            table: NativeTable::resolve(engine.natives()),
            console: Console::new(),
            max_stack: engine.flags().max_stack,
            stats: ContextStats::default(),
        }
    }

    /// This context's id.
    pub fn id(&self) -> ContextId {
        self.id
    }

    /// The context's compile gate.
    pub fn gate(&self) -> &CompileGate {
        &self.gate
    }

    /// Compiles `source` from scratch.
    pub fn compile(&mut self, source: &SourceDescriptor) -> Result<Script, EngineError> {
        let script = code_cache::compile(&mut self.backend, &self.gate, source)?;
        self.stats.fresh_compiles += 1;
        Ok(script)
    }

    /// Serializes a script of this context into a portable artifact.
    pub fn create_code_cache(&self, script: &Script) -> Result<CacheArtifact, EngineError> {
        self.check_owner(script)?;
        Ok(code_cache::create_code_cache(
            &self.backend,
            script,
            script.source(),
        )?)
    }

    /// Rebuilds a script from `artifact` without compiling.
    ///
    /// Rejections come back as [`CacheError::Rejected`]; a backend that tried
    /// to recompile comes back as [`CacheError::GuardViolation`].
    pub fn consume_code_cache(
        &mut self,
        source: &SourceDescriptor,
        artifact: &CacheArtifact,
    ) -> Result<Script, EngineError> {
        let result = code_cache::consume(&mut self.backend, &self.gate, source, artifact);
        match &result {
            Ok(_) => self.stats.cache_hits += 1,
            Err(CacheError::Rejected(_)) => self.stats.cache_rejections += 1,
            Err(_) => {}
        }
        Ok(result?)
    }

    /// Consumes `artifact` if given, compiling from source when it is rejected.
    ///
    /// A rejection is counted even when the fallback compile then fails.
    pub fn compile_or_consume(
        &mut self,
        source: &SourceDescriptor,
        artifact: Option<&CacheArtifact>,
    ) -> Result<(Script, CacheOutcome), EngineError> {
        let Some(artifact) = artifact else {
            return Ok((self.compile(source)?, CacheOutcome::NoCache));
        };
        match self.consume_code_cache(source, artifact) {
            Ok(script) => Ok((script, CacheOutcome::Consumed)),
            Err(EngineError::Cache(CacheError::Rejected(reason))) => {
                warn!(
                    context = %self.id,
                    origin = source.origin(),
                    %reason,
                    "code cache rejected, compiling from source"
                );
                let script = self.compile(source)?;
                Ok((script, CacheOutcome::Rejected(reason)))
            }
            Err(e) => Err(e),
        }
    }

    /// Runs a script of this context and returns its completion value.
    pub fn run(&mut self, script: &Script) -> Result<Value, EngineError> {
        self.check_owner(script)?;
        self.stats.runs += 1;
        let value = execute(Frame {
            chunk: script.chunk(),
            origin: script.source().origin(),
            table: &self.table,
            console: &mut self.console,
            max_stack: self.max_stack,
        })?;
        Ok(value)
    }

    /// Sets a global visible to scripts at run time.
    pub fn set_global(&mut self, name: &str, value: impl Into<Value>) {
        self.table.set_global(name, value.into());
    }

    /// Defines a constant inlined into scripts compiled afterwards. Such
    /// scripts cannot be serialized.
    pub fn define_constant(&mut self, name: &str, value: impl Into<Value>) {
        self.backend.define_constant(name, value.into());
    }

    /// Drains the lines written by `print`.
    pub fn take_output(&mut self) -> Vec<String> {
        std::mem::take(&mut self.console)
    }

    /// The context's counters.
    pub fn stats(&self) -> ContextStats {
        self.stats
    }

    /// Releases the context and everything it owns.
    pub fn dispose(self) {
        drop(self);
    }

    fn check_owner(&self, script: &Script) -> Result<(), EngineError> {
        if script.context() == self.id {
            Ok(())
        } else {
            Err(EngineError::ForeignScript {
                script: script.context(),
                context: self.id,
            })
        }
    }
}

impl Drop for Context {
    fn drop(&mut self) {
        info!(
            context = %self.id,
            compiles = self.stats.fresh_compiles,
            cache_hits = self.stats.cache_hits,
            runs = self.stats.runs,
            "context disposed"
        );
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("id", &self.id)
            .field("stats", &self.stats)
            .field("table", &self.table)
            .finish_non_exhaustive()
    }
}
