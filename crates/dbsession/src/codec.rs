//! Session entries and their byte encoding.
//!
//! Stores treat the payload as opaque bytes. The [`StateEncoder`] trait lets
//! applications pick the wire format; [`JsonStateEncoder`] is the default.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// One key/value pair held in a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionEntry {
    pub key: String,
    pub value: Value,
}

impl SessionEntry {
    pub fn new(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Converts session entries to and from the stored payload.
///
/// Implementations must preserve entry order.
pub trait StateEncoder: Send + Sync {
    fn encode(&self, entries: &[SessionEntry]) -> Result<Vec<u8>>;

    fn decode(&self, bytes: &[u8]) -> Result<Vec<SessionEntry>>;
}

/// Encodes entries as a JSON array of `{"key", "value"}` objects.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonStateEncoder;

impl StateEncoder for JsonStateEncoder {
    fn encode(&self, entries: &[SessionEntry]) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(entries)?)
    }

    fn decode(&self, bytes: &[u8]) -> Result<Vec<SessionEntry>> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
