//! Reference compilation backend and execution contexts for warmstart.
//!
//! Scripts are written in a small JavaScript-flavoured expression language,
//! compiled to bytecode by [`ScriptBackend`], and run inside an isolated
//! [`Context`]. A [`Script`] never leaves its context; only the
//! [`CacheArtifact`](warmstart_cache::CacheArtifact) produced by
//! [`Context::create_code_cache`] does.
//!
//! ```text
//! Engine (config, identity, native registry)
//!   ├── Context A: compile ──► Script ──► create_code_cache ──► artifact
//!   └── Context B: consume_code_cache(artifact) ──► Script ──► run
//! ```

#![warn(missing_docs)]

pub mod ast;
pub mod backend;
pub mod bytecode;
pub mod compiler;
pub mod context;
pub mod engine;
pub mod error;
pub mod lexer;
pub mod natives;
pub mod parser;
pub mod value;
mod vm;

pub use backend::{Script, ScriptBackend};
pub use context::{Context, ContextId, ContextStats};
pub use engine::Engine;
pub use error::{EngineError, ExecutionError};
pub use natives::{NativeFn, NativeRegistry};
pub use value::Value;

pub use warmstart_cache::{CacheArtifact, CacheOutcome, RejectReason, SourceDescriptor};
