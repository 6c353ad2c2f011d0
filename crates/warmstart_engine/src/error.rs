//! Error types for engine configuration, compilation and execution.

use warmstart_cache::CacheError;

use crate::context::ContextId;

/// A script raised an uncaught failure while running.
///
/// The context that ran the script stays usable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{origin}: {message}")]
pub struct ExecutionError {
    /// Origin label of the failing script.
    pub origin: String,
    /// Description of the failure.
    pub message: String,
}

/// Errors surfaced by [`Engine`](crate::Engine) and [`Context`](crate::Context).
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Compiling, serializing or consuming a code cache failed.
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// The script failed at run time.
    #[error("execution error: {0}")]
    Execution(#[from] ExecutionError),

    /// A script was used in a context other than the one that owns it.
    #[error("script belongs to context {script}, not context {context}")]
    ForeignScript {
        /// Context that compiled the script.
        script: ContextId,
        /// Context it was handed to.
        context: ContextId,
    },

    /// The configuration names a native the engine does not ship.
    #[error("unknown native function '{0}'")]
    UnknownNative(String),
}
