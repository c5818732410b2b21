//! Expiration tracking without the session payload.
//!
//! Used when a caller only needs to know whether a session is still alive,
//! e.g. to decide whether to rotate its id. The table may be the payload
//! table itself or a dedicated one.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, params};
use tracing::{debug, info};

use crate::clock::{from_millis, is_past, to_millis};
use crate::error::Result;
use crate::executor::{SqliteExecutor, TransactionExecutor};
use crate::schema::ExpirationSchema;
use crate::statements::ExpirationStatements;
use crate::upsert::{retry_on_duplicate, update_or_insert};

/// Tracks when sessions expire.
pub struct ExpirationTracker<E = SqliteExecutor> {
    executor: Arc<E>,
    schema: ExpirationSchema,
    statements: ExpirationStatements,
}

impl<E> std::fmt::Debug for ExpirationTracker<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExpirationTracker")
            .field("table", &self.schema.table_name)
            .finish_non_exhaustive()
    }
}

impl<E: TransactionExecutor> ExpirationTracker<E> {
    /// Validate the schema and render the statements.
    pub fn build(schema: ExpirationSchema, executor: Arc<E>) -> Result<Self> {
        schema.validate()?;
        let statements = ExpirationStatements::build(&schema);
        info!(table = %schema.table_name, "Expiration tracker ready");
        Ok(Self {
            executor,
            schema,
            statements,
        })
    }

    /// Whether the session is expired at `now`.
    ///
    /// Unknown sessions count as expired. A session expiring exactly at `now`
    /// is not expired yet.
    pub fn is_expired(&self, session_id: &str, now: DateTime<Utc>) -> Result<bool> {
        let expired = match self.expires_at(session_id)? {
            Some(expires_at) => is_past(expires_at, now),
            None => true,
        };
        debug!(session_id, expired, "Checked session expiration");
        Ok(expired)
    }

    /// Whether an expiration is recorded for the session at all.
    pub fn is_determinable(&self, session_id: &str) -> Result<bool> {
        let count: i64 = self.executor.run(|tx| {
            Ok(tx.query_row(self.statements.count(), params![session_id], |row| row.get(0))?)
        })?;
        Ok(count > 0)
    }

    /// The recorded expiration of the session, if any.
    pub fn expires_at(&self, session_id: &str) -> Result<Option<DateTime<Utc>>> {
        let millis: Option<i64> = self.executor.run(|tx| {
            Ok(tx
                .query_row(self.statements.select(), params![session_id], |row| row.get(0))
                .optional()?)
        })?;
        millis.map(from_millis).transpose()
    }

    /// Record when the session expires, creating the row on first use.
    pub fn save_expiration_date_time(
        &self,
        session_id: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        let millis = to_millis(expires_at);
        let outcome = retry_on_duplicate(session_id, || {
            self.executor.run(|tx| {
                update_or_insert(
                    tx,
                    self.statements.update(),
                    params![millis, session_id],
                    self.statements.insert(),
                    params![session_id, millis],
                )
            })
        })?;
        debug!(session_id, ?outcome, %expires_at, "Session expiration saved");
        Ok(())
    }

    /// Forget the session's expiration. Unknown sessions are ignored.
    pub fn delete(&self, session_id: &str) -> Result<()> {
        self.executor
            .run(|tx| Ok(tx.execute(self.statements.delete(), params![session_id])?))?;
        Ok(())
    }

    /// Create the expiration table if it does not exist.
    ///
    /// A no-op on an already provisioned table. A shared table created here
    /// first has only the id and expiration columns until
    /// [`DbStore::create_table`](crate::DbStore::create_table) completes it.
    pub fn create_table(&self) -> Result<()> {
        let ddl = self.schema.create_table_sql();
        self.executor.run(|tx| Ok(tx.execute_batch(&ddl)?))
    }

    pub fn schema(&self) -> &ExpirationSchema {
        &self.schema
    }

    pub fn statements(&self) -> &ExpirationStatements {
        &self.statements
    }
}
