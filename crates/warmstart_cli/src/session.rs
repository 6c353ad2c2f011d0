//! Shared helpers for loading configuration, scripts and artifacts.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;
use warmstart_config::{load_config, load_config_from_str, EngineConfig, CONFIG_FILE_NAME};
use warmstart_engine::{CacheArtifact, Engine, SourceDescriptor};

use crate::GlobalArgs;

/// File extension appended to a script path for its default artifact.
pub const ARTIFACT_EXTENSION: &str = "wscc";

/// Result type shared by all subcommands; the value is the exit code.
pub type CommandResult = Result<i32, Box<dyn std::error::Error>>;

/// Loads the configuration named by `--config`, else `warmstart.toml` in the
/// current directory, else the defaults.
pub fn resolve_config(global: &GlobalArgs) -> Result<EngineConfig, Box<dyn std::error::Error>> {
    if let Some(path) = &global.config {
        let content = fs::read_to_string(path)
            .map_err(|e| format!("cannot read config {}: {e}", path.display()))?;
        debug!(path = %path.display(), "loading config");
        return Ok(load_config_from_str(&content)?);
    }
    let cwd = std::env::current_dir()?;
    if cwd.join(CONFIG_FILE_NAME).is_file() {
        debug!(dir = %cwd.display(), "loading {CONFIG_FILE_NAME}");
        return Ok(load_config(&cwd)?);
    }
    debug!("no config file, using defaults");
    Ok(EngineConfig::default())
}

/// Builds the engine from the resolved configuration.
pub fn load_engine(global: &GlobalArgs) -> Result<Engine, Box<dyn std::error::Error>> {
    let config = resolve_config(global)?;
    Ok(Engine::from_config(&config)?)
}

/// Reads a script, using its path as the origin label.
pub fn read_source(path: &Path) -> Result<SourceDescriptor, Box<dyn std::error::Error>> {
    let text = fs::read_to_string(path)
        .map_err(|e| format!("cannot read script {}: {e}", path.display()))?;
    Ok(SourceDescriptor::new(text, path.display().to_string()))
}

/// `main.js` -> `main.js.wscc`.
pub fn default_artifact_path(script: &Path) -> PathBuf {
    let mut name = script.as_os_str().to_owned();
    name.push(".");
    name.push(ARTIFACT_EXTENSION);
    PathBuf::from(name)
}

/// Reads artifact bytes. Validation is left to the consumer.
pub fn read_artifact(path: &Path) -> Result<CacheArtifact, Box<dyn std::error::Error>> {
    let bytes =
        fs::read(path).map_err(|e| format!("cannot read artifact {}: {e}", path.display()))?;
    Ok(CacheArtifact::from_bytes(bytes))
}

/// Writes artifact bytes.
pub fn write_artifact(
    path: &Path,
    artifact: &CacheArtifact,
) -> Result<(), Box<dyn std::error::Error>> {
    fs::write(path, artifact.as_bytes())
        .map_err(|e| format!("cannot write artifact {}: {e}", path.display()))?;
    Ok(())
}
