//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::EngineConfig;
use std::path::Path;

/// Name of the configuration file looked up by [`load_config`].
pub const CONFIG_FILE_NAME: &str = "warmstart.toml";

/// Loads and validates a `warmstart.toml` configuration from a directory.
pub fn load_config(dir: &Path) -> Result<EngineConfig, ConfigError> {
    let path = dir.join(CONFIG_FILE_NAME);
    let content =
        std::fs::read_to_string(&path).map_err(|source| ConfigError::Io { path, source })?;
    load_config_from_str(&content)
}

/// Parses and validates a `warmstart.toml` configuration from a string.
pub fn load_config_from_str(content: &str) -> Result<EngineConfig, ConfigError> {
    let config: EngineConfig = toml::from_str(content)?;
    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &EngineConfig) -> Result<(), ConfigError> {
    let invalid = |field, reason: &str| ConfigError::Invalid {
        field,
        reason: reason.to_string(),
    };

    if config.compiler.max_stack == 0 {
        return Err(invalid("compiler.max_stack", "must be positive"));
    }
    if config
        .engine
        .version
        .as_deref()
        .is_some_and(|v| v.trim().is_empty())
    {
        return Err(invalid("engine.version", "must not be blank"));
    }
    if let Some(name) = config.natives.enabled.iter().find(|n| !is_native_name(n)) {
        return Err(invalid(
            "natives.enabled",
            &format!("'{name}' is not a valid native name"),
        ));
    }
    Ok(())
}

/// Native names are non-empty ASCII identifiers.
fn is_native_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}
