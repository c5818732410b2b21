//! Session payload storage.
//!
//! [`DbStore`] keeps one row per session holding the encoded entries and the
//! time the session expires. Every save pushes the expiration out to
//! `now + ttl`; expiry is only checked when the session is loaded.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use dbsession::{DbStore, SessionEntry, SqliteExecutor};
//!
//! let executor = Arc::new(SqliteExecutor::open("sessions.db")?);
//! let store = DbStore::builder()
//!     .ttl(Duration::from_secs(1800))
//!     .build(executor)?;
//! store.create_table()?;
//!
//! store.save("3f2a...", &[SessionEntry::new("user", "alice")])?;
//! let entries = store.load("3f2a...")?;
//! # Ok::<(), dbsession::SessionError>(())
//! ```

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use rusqlite::{OptionalExtension, params};
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock, from_millis, is_past, to_millis};
use crate::codec::{JsonStateEncoder, SessionEntry, StateEncoder};
use crate::config::StoreConfig;
use crate::error::{ExpiredSession, Result, SessionError};
use crate::executor::{SqliteExecutor, TransactionExecutor};
use crate::schema::SessionSchema;
use crate::statements::SessionStatements;
use crate::upsert::{retry_on_duplicate, update_or_insert};

/// Name under which the store registers itself.
pub const STORE_NAME: &str = "db";

/// Collects the store's collaborators before the statements are rendered.
pub struct DbStoreBuilder {
    config: StoreConfig,
    clock: Arc<dyn Clock>,
    encoder: Arc<dyn StateEncoder>,
}

impl Default for DbStoreBuilder {
    fn default() -> Self {
        Self::new(StoreConfig::default())
    }
}

impl DbStoreBuilder {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            clock: Arc::new(SystemClock),
            encoder: Arc::new(JsonStateEncoder),
        }
    }

    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.config.ttl = ttl;
        self
    }

    pub fn schema(mut self, schema: SessionSchema) -> Self {
        self.config.schema = schema;
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn encoder(mut self, encoder: Arc<dyn StateEncoder>) -> Self {
        self.encoder = encoder;
        self
    }

    /// Validate the configuration and render the statements.
    pub fn build<E: TransactionExecutor>(self, executor: Arc<E>) -> Result<DbStore<E>> {
        let StoreConfig { ttl, schema } = self.config;
        schema.validate()?;
        let ttl_delta = TimeDelta::from_std(ttl)
            .map_err(|_| SessionError::InvalidConfig(format!("ttl {ttl:?} is out of range")))?;
        let statements = SessionStatements::build(&schema);

        info!(table = %schema.table_name, ttl_secs = ttl.as_secs(), "Session store ready");
        Ok(DbStore {
            executor,
            clock: self.clock,
            encoder: self.encoder,
            schema,
            statements,
            ttl,
            ttl_delta,
        })
    }
}

/// Session store backed by a relational table.
///
/// Only obtainable through [`DbStoreBuilder::build`], so statements are always
/// rendered before first use.
pub struct DbStore<E = SqliteExecutor> {
    executor: Arc<E>,
    clock: Arc<dyn Clock>,
    encoder: Arc<dyn StateEncoder>,
    schema: SessionSchema,
    statements: SessionStatements,
    ttl: Duration,
    ttl_delta: TimeDelta,
}

impl<E> std::fmt::Debug for DbStore<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbStore")
            .field("table", &self.schema.table_name)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl DbStore {
    pub fn builder() -> DbStoreBuilder {
        DbStoreBuilder::default()
    }
}

impl<E: TransactionExecutor> DbStore<E> {
    /// Load the entries of a session.
    ///
    /// Returns an empty list when no row exists. A row past its expiration
    /// fails with [`SessionError::Expired`], which still carries the entries.
    pub fn load(&self, session_id: &str) -> Result<Vec<SessionEntry>> {
        let row = self.executor.run(|tx| {
            Ok(tx
                .query_row(self.statements.select(), params![session_id], |row| {
                    Ok((row.get::<_, Option<Vec<u8>>>(0)?, row.get::<_, i64>(1)?))
                })
                .optional()?)
        })?;

        let Some((payload, expires_millis)) = row else {
            debug!(session_id, "No stored session");
            return Ok(Vec::new());
        };

        // A NULL payload is a row created by an expiration tracker sharing the table.
        let entries = match payload {
            Some(bytes) => self.encoder.decode(&bytes)?,
            None => Vec::new(),
        };

        let expires_at = from_millis(expires_millis)?;
        if is_past(expires_at, self.clock.now()) {
            warn!(session_id, %expires_at, "Loaded an expired session");
            return Err(SessionError::Expired(Box::new(ExpiredSession {
                session_id: session_id.to_string(),
                entries,
                expires_at,
                ttl: self.ttl,
            })));
        }

        debug!(session_id, entries = entries.len(), "Session loaded");
        Ok(entries)
    }

    /// Store the entries of a session and extend its expiration to `now + ttl`.
    ///
    /// Saving no entries removes the session.
    pub fn save(&self, session_id: &str, entries: &[SessionEntry]) -> Result<()> {
        if entries.is_empty() {
            debug!(session_id, "Empty session, removing stored row");
            return self.delete(session_id);
        }

        let payload = self.encoder.encode(entries)?;
        let outcome = retry_on_duplicate(session_id, || {
            self.executor.run(|tx| {
                let expires_at = to_millis(self.expiration_from_now()?);
                update_or_insert(
                    tx,
                    self.statements.update(),
                    params![payload, expires_at, session_id],
                    self.statements.insert(),
                    params![session_id, payload, expires_at],
                )
            })
        })?;

        debug!(session_id, ?outcome, bytes = payload.len(), "Session saved");
        Ok(())
    }

    /// The stored expiration of the session, without decoding its payload.
    pub fn expires_at(&self, session_id: &str) -> Result<Option<DateTime<Utc>>> {
        let millis: Option<i64> = self.executor.run(|tx| {
            Ok(tx
                .query_row(self.statements.select(), params![session_id], |row| row.get(1))
                .optional()?)
        })?;
        millis.map(from_millis).transpose()
    }

    /// Remove a session. Removing an unknown session is not an error.
    pub fn delete(&self, session_id: &str) -> Result<()> {
        let removed = self
            .executor
            .run(|tx| Ok(tx.execute(self.statements.delete(), params![session_id])?))?;
        debug!(session_id, removed, "Session deleted");
        Ok(())
    }

    /// Invalidate a session; same as [`delete`](Self::delete).
    pub fn invalidate(&self, session_id: &str) -> Result<()> {
        self.delete(session_id)
    }

    /// Create the payload table if it does not exist.
    ///
    /// A table already created by an [`ExpirationTracker`](crate::ExpirationTracker)
    /// sharing it gets the missing payload column added.
    pub fn create_table(&self) -> Result<()> {
        let ddl = self.schema.create_table_sql();
        let table_info = self.schema.table_info_sql();
        let payload_column = self.schema.payload_column.as_str();
        self.executor.run(|tx| {
            tx.execute_batch(&ddl)?;
            let mut stmt = tx.prepare(&table_info)?;
            let columns = stmt
                .query_map([], |row| row.get::<_, String>(1))?
                .collect::<rusqlite::Result<Vec<String>>>()?;
            drop(stmt);
            if !columns.iter().any(|c| c.eq_ignore_ascii_case(payload_column)) {
                info!(table = %self.schema.table_name, column = payload_column, "Adding payload column");
                tx.execute_batch(&self.schema.add_payload_column_sql())?;
            }
            Ok(())
        })
    }

    pub fn name(&self) -> &'static str {
        STORE_NAME
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn schema(&self) -> &SessionSchema {
        &self.schema
    }

    pub fn statements(&self) -> &SessionStatements {
        &self.statements
    }

    fn expiration_from_now(&self) -> Result<DateTime<Utc>> {
        self.clock
            .now()
            .checked_add_signed(self.ttl_delta)
            .ok_or_else(|| SessionError::InvalidConfig("session expiration overflows".to_string()))
    }
}
