//! Configuration for the session store and expiration tracker.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::schema::{ExpirationSchema, SessionSchema};

/// Default session time-to-live (30 minutes).
pub const DEFAULT_TTL: Duration = Duration::from_secs(30 * 60);

/// Configuration for [`DbStore`](crate::DbStore).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Time added to "now" to compute a session's expiration on every save.
    #[serde(rename = "ttl_secs", with = "duration_secs")]
    pub ttl: Duration,

    /// Payload table layout.
    pub schema: SessionSchema,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_TTL,
            schema: SessionSchema::default(),
        }
    }
}

impl StoreConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the session TTL.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Set the payload table layout.
    pub fn with_schema(mut self, schema: SessionSchema) -> Self {
        self.schema = schema;
        self
    }
}

/// Configuration for [`ExpirationTracker`](crate::ExpirationTracker).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpirationConfig {
    /// Dedicated expiration table. `None` tracks expiration in the payload table.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<ExpirationSchema>,
}

impl ExpirationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track expiration in a dedicated table.
    pub fn with_schema(mut self, schema: ExpirationSchema) -> Self {
        self.schema = Some(schema);
        self
    }

    /// The schema to use, falling back to the payload table's layout.
    pub fn resolve(&self, store: &StoreConfig) -> ExpirationSchema {
        self.schema
            .clone()
            .unwrap_or_else(|| ExpirationSchema::from(&store.schema))
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
