//! CLI command handlers.

pub mod delete;
pub mod init;
pub mod put;
pub mod show;
pub mod status;
pub mod touch;

use std::sync::Arc;

use anyhow::{Context as _, Result};
use dbsession::{DbStore, DbStoreBuilder, ExpirationTracker, SqliteExecutor};
use dbsession_config::DbSessionConfig;

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Effective configuration (file + command-line overrides).
    pub config: DbSessionConfig,
    /// Output as JSON for scripting.
    pub json_output: bool,
    /// Verbose output enabled.
    pub verbose: bool,
}

/// Store and tracker opened over the configured database.
pub struct Stores {
    pub store: DbStore,
    pub tracker: ExpirationTracker,
    /// Whether the tracker writes a table of its own.
    pub dedicated_expiration: bool,
}

impl Context {
    pub fn open(&self) -> Result<Stores> {
        let path = self
            .config
            .database
            .resolved_path()
            .context("no database path configured and no platform data directory")?;
        let executor = SqliteExecutor::open(&path)
            .with_context(|| format!("failed to open {}", path.display()))?
            .with_busy_timeout(self.config.database.busy_timeout());
        let executor = Arc::new(executor);

        let store = DbStoreBuilder::new(self.config.store.clone()).build(executor.clone())?;
        let tracker = ExpirationTracker::build(self.config.expiration_schema(), executor)?;

        Ok(Stores {
            store,
            tracker,
            dedicated_expiration: self.config.has_dedicated_expiration_table(),
        })
    }
}

/// Parse `key=value`; the value is JSON when it parses as JSON, a string otherwise.
pub fn parse_entry(raw: &str) -> Result<dbsession::SessionEntry> {
    let (key, value) = raw
        .split_once('=')
        .with_context(|| format!("expected key=value, got {raw:?}"))?;
    anyhow::ensure!(!key.is_empty(), "empty key in {raw:?}");
    let value = serde_json::from_str(value)
        .unwrap_or_else(|_| serde_json::Value::String(value.to_string()));
    Ok(dbsession::SessionEntry::new(key, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_entry() {
        assert_eq!(parse_entry("n=42").unwrap().value, json!(42));
        assert_eq!(parse_entry("user=alice").unwrap().value, json!("alice"));
        assert_eq!(
            parse_entry(r#"obj={"a":[1,2]}"#).unwrap().value,
            json!({"a": [1, 2]})
        );
        assert_eq!(parse_entry("eq=a=b").unwrap().value, json!("a=b"));
        assert!(parse_entry("novalue").is_err());
        assert!(parse_entry("=x").is_err());
    }
}
