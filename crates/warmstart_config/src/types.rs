//! Configuration types deserialized from `warmstart.toml`.

use serde::Deserialize;
use warmstart_common::HashSeed;

/// Hash seed used when the configuration does not name one.
pub const DEFAULT_HASH_SEED: u64 = 1337;

/// Operand stack limit used when the configuration does not name one.
pub const DEFAULT_MAX_STACK: usize = 1024;

/// The top-level engine configuration parsed from `warmstart.toml`.
///
/// Every section is optional; an empty file yields [`EngineConfig::default`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EngineConfig {
    /// Engine identity settings (hash seed, version override).
    #[serde(default)]
    pub engine: EngineSection,
    /// Flags that change the compiled representation.
    #[serde(default)]
    pub compiler: CompilerFlags,
    /// Native extension functions to expose to scripts.
    #[serde(default)]
    pub natives: NativeConfig,
}

/// Engine identity settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EngineSection {
    /// Seed for every identity hash the engine computes.
    #[serde(default = "default_hash_seed")]
    pub hash_seed: u64,
    /// Overrides the engine version embedded in produced artifacts.
    ///
    /// Defaults to the engine crate's own version.
    #[serde(default)]
    pub version: Option<String>,
}

impl EngineSection {
    /// Returns the configured seed as a [`HashSeed`].
    pub fn seed(&self) -> HashSeed {
        HashSeed(self.hash_seed)
    }
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            hash_seed: DEFAULT_HASH_SEED,
            version: None,
        }
    }
}

fn default_hash_seed() -> u64 {
    DEFAULT_HASH_SEED
}

/// Compiler flags. All of them feed the backend's flag hash, so artifacts
/// produced under different flags are rejected as a version mismatch.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CompilerFlags {
    /// Fold arithmetic on literal operands at compile time.
    #[serde(default = "default_true")]
    pub constant_folding: bool,
    /// Maximum operand stack depth during execution.
    #[serde(default = "default_max_stack")]
    pub max_stack: usize,
}

impl CompilerFlags {
    /// Returns a stable textual fingerprint of the flags.
    pub fn fingerprint(&self) -> String {
        format!(
            "constant_folding={}::max_stack={}",
            self.constant_folding, self.max_stack
        )
    }
}

impl Default for CompilerFlags {
    fn default() -> Self {
        Self {
            constant_folding: true,
            max_stack: DEFAULT_MAX_STACK,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_max_stack() -> usize {
    DEFAULT_MAX_STACK
}

/// Selection of the built-in native extension functions.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NativeConfig {
    /// Names of natives to register in every context.
    #[serde(default = "default_natives")]
    pub enabled: Vec<String>,
}

impl Default for NativeConfig {
    fn default() -> Self {
        Self {
            enabled: default_natives(),
        }
    }
}

fn default_natives() -> Vec<String> {
    vec!["add".to_string(), "print".to_string()]
}
