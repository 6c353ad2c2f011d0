//! Process-level engine: configuration, backend identity and natives.

use std::sync::Arc;

use tracing::info;
use warmstart_cache::BackendIdentity;
use warmstart_config::{CompilerFlags, EngineConfig};

use crate::error::EngineError;
use crate::natives::NativeRegistry;

/// Version embedded in artifacts unless the configuration overrides it.
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Shared, immutable engine state from which contexts are created.
///
/// `Engine` is `Send + Sync`; contexts created from it on different threads
/// share nothing mutable.
#[derive(Debug, Clone)]
pub struct Engine {
    identity: BackendIdentity,
    flags: CompilerFlags,
    natives: Arc<NativeRegistry>,
}

impl Engine {
    /// Builds an engine from a configuration and an explicit native registry.
    pub fn new(config: &EngineConfig, natives: NativeRegistry) -> Self {
        let version = config
            .engine
            .version
            .clone()
            .unwrap_or_else(|| ENGINE_VERSION.to_string());
        let identity = BackendIdentity::new(
            version,
            &config.compiler.fingerprint(),
            config.engine.seed(),
        );
        info!(
            version = identity.engine_version(),
            hash_seed = %identity.hash_seed(),
            flags = %identity.flag_hash(),
            natives = natives.len(),
            "engine initialized"
        );
        Self {
            identity,
            flags: config.compiler.clone(),
            natives: Arc::new(natives),
        }
    }

    /// Builds an engine whose natives are the ones enabled in the configuration.
    pub fn from_config(config: &EngineConfig) -> Result<Self, EngineError> {
        let natives = NativeRegistry::from_names(&config.natives.enabled)?;
        Ok(Self::new(config, natives))
    }

    /// Identity embedded in every artifact this engine produces.
    pub fn identity(&self) -> &BackendIdentity {
        &self.identity
    }

    /// Compiler flags in effect.
    pub fn flags(&self) -> &CompilerFlags {
        &self.flags
    }

    /// The native registry injected at construction.
    pub fn natives(&self) -> &Arc<NativeRegistry> {
        &self.natives
    }
}
