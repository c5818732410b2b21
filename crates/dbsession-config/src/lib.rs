//! Configuration for dbsession.
//!
//! Provides TOML-based configuration with:
//! - `[database]`: database file and lock wait
//! - `[store]`: session TTL and payload table layout
//! - `[expiration]`: optional dedicated expiration table
//!
//! Table and column names are validated while parsing, so a loaded
//! configuration can be handed straight to the store builders.

pub mod discovery;
pub mod error;
pub mod types;

pub use discovery::{
    LoadedConfig, config_dir, config_path, data_dir, load_config, load_config_file, save_config,
};
pub use error::{ConfigError, Result};
pub use types::{DatabaseConfig, DbSessionConfig};
