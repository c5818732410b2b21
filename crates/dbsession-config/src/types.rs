//! Configuration file layout.
//!
//! ```toml
//! [database]
//! path = "/var/lib/app/sessions.db"
//! busy_timeout_ms = 5000
//!
//! [store]
//! ttl_secs = 1800
//!
//! [store.schema]
//! table_name = "USER_SESSION"
//!
//! [expiration.schema]
//! table_name = "SESSION_EXPIRATION"
//! ```

use std::path::PathBuf;
use std::time::Duration;

use dbsession::{DEFAULT_BUSY_TIMEOUT, ExpirationConfig, ExpirationSchema, StoreConfig};
use serde::{Deserialize, Serialize};

use crate::Result;

/// Default database filename within the data directory.
const DATABASE_FILE: &str = "sessions.db";

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DbSessionConfig {
    pub database: DatabaseConfig,
    pub store: StoreConfig,
    pub expiration: ExpirationConfig,
}

impl DbSessionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a TOML document.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check the table layouts the same way the store builders do.
    pub fn validate(&self) -> Result<()> {
        self.store.schema.validate()?;
        self.expiration_schema().validate()?;
        Ok(())
    }

    /// The expiration table, falling back to the payload table.
    pub fn expiration_schema(&self) -> ExpirationSchema {
        self.expiration.resolve(&self.store)
    }

    /// Whether expiration is tracked in its own table.
    pub fn has_dedicated_expiration_table(&self) -> bool {
        self.expiration_schema().table_name != self.store.schema.table_name
    }
}

/// Where the session database lives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database file. Defaults to `sessions.db` in the platform data directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// How long a connection waits on a locked database.
    pub busy_timeout_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: None,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT.as_millis() as u64,
        }
    }
}

impl DatabaseConfig {
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }

    /// The configured path, or the platform default.
    pub fn resolved_path(&self) -> Option<PathBuf> {
        self.path
            .clone()
            .or_else(|| crate::data_dir().map(|d| d.join(DATABASE_FILE)))
    }
}
