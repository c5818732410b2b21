//! Error types for session store operations.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::ErrorCode;
use rusqlite::ffi;

use crate::codec::SessionEntry;

/// Error type for session store operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Database connection or statement failed.
    #[error("Database error: {0}")]
    Database(#[source] rusqlite::Error),

    /// A write was rejected because a row with the same session id already exists.
    #[error("Duplicate session id: {0}")]
    DuplicateKey(#[source] rusqlite::Error),

    /// A stored session was found but its expiration has passed.
    #[error("Session expired: {0}")]
    Expired(Box<ExpiredSession>),

    /// Session entries could not be encoded or decoded.
    #[error("Codec error: {0}")]
    Codec(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A table or column name is not a valid SQL identifier.
    #[error("Invalid identifier: {0:?}")]
    InvalidIdentifier(String),

    /// A stored expiration value is outside the representable range.
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(i64),

    /// Invalid store configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl SessionError {
    /// Wrap an encoder failure.
    pub fn codec(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Codec(err.into())
    }

    /// Whether this error is a uniqueness violation on the session id.
    pub fn is_duplicate_key(&self) -> bool {
        matches!(self, Self::DuplicateKey(_))
    }

    /// The expired session carried by this error, if any.
    pub fn as_expired(&self) -> Option<&ExpiredSession> {
        match self {
            Self::Expired(expired) => Some(expired),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for SessionError {
    fn from(err: rusqlite::Error) -> Self {
        if is_uniqueness_violation(&err) {
            Self::DuplicateKey(err)
        } else {
            Self::Database(err)
        }
    }
}

impl From<serde_json::Error> for SessionError {
    fn from(err: serde_json::Error) -> Self {
        Self::codec(err)
    }
}

/// Primary key and unique constraint failures; other constraint kinds
/// (NOT NULL, CHECK, ...) are ordinary database errors.
fn is_uniqueness_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(e, _) => {
            e.code == ErrorCode::ConstraintViolation
                && matches!(
                    e.extended_code,
                    ffi::SQLITE_CONSTRAINT_PRIMARYKEY | ffi::SQLITE_CONSTRAINT_UNIQUE
                )
        }
        _ => false,
    }
}

/// A session that was read after its expiration.
///
/// Carries the decoded entries so the caller can audit or salvage them
/// before the data is discarded.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpiredSession {
    /// Identifier of the expired session.
    pub session_id: String,
    /// Entries decoded from the stored payload.
    pub entries: Vec<SessionEntry>,
    /// When the session expired.
    pub expires_at: DateTime<Utc>,
    /// TTL configured on the store that read the session.
    pub ttl: Duration,
}

impl fmt::Display for ExpiredSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (expired at {}, ttl {}s)",
            self.session_id,
            self.expires_at.to_rfc3339(),
            self.ttl.as_secs()
        )
    }
}

/// Result type for session store operations.
pub type Result<T> = std::result::Result<T, SessionError>;
