//! Parsing and validation of `warmstart.toml` engine configuration files.
//!
//! The configuration carries the process-wide hash seed, the compiler flags
//! that shape the compiled representation, and the set of native extension
//! functions exposed to scripts. It is loaded once and passed into engine
//! construction by value.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_from_str, CONFIG_FILE_NAME};
pub use types::*;
