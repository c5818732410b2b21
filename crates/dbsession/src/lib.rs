//! Relational session storage with a sliding TTL.
//!
//! This crate provides two components over a SQL table keyed by session id:
//! - [`DbStore`]: stores the encoded session entries and extends the
//!   session's expiration on every save
//! - [`ExpirationTracker`]: records and checks expiration only, without
//!   touching the payload
//!
//! Both write with update-then-insert and retry once when a concurrent first
//! write of the same id wins the insert.
//!
//! # Example
//!
//! ```rust,ignore
//! use dbsession::{DbStore, ExpirationSchema, ExpirationTracker, SqliteExecutor};
//!
//! let executor = Arc::new(SqliteExecutor::open("sessions.db")?);
//! let store = DbStore::builder().ttl(Duration::from_secs(1800)).build(executor.clone())?;
//! let tracker = ExpirationTracker::build(ExpirationSchema::default(), executor)?;
//! ```

mod clock;
mod codec;
mod config;
mod error;
mod executor;
mod expiration;
mod schema;
mod statements;
mod store;
mod upsert;

pub use clock::{Clock, ManualClock, SystemClock, is_past};
pub use codec::{JsonStateEncoder, SessionEntry, StateEncoder};
pub use config::{DEFAULT_TTL, ExpirationConfig, StoreConfig};
pub use error::{ExpiredSession, Result, SessionError};
pub use executor::{DEFAULT_BUSY_TIMEOUT, SqliteExecutor, TransactionExecutor};
pub use expiration::ExpirationTracker;
pub use schema::{
    DEFAULT_EXPIRATION_COLUMN, DEFAULT_PAYLOAD_COLUMN, DEFAULT_SESSION_ID_COLUMN,
    DEFAULT_TABLE_NAME, ExpirationSchema, Identifier, SessionSchema,
};
pub use statements::{ExpirationStatements, SessionStatements};
pub use store::{DbStore, DbStoreBuilder, STORE_NAME};

/// Re-exported so custom executors can name the transaction type.
pub use rusqlite;
