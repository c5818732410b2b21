//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use dbsession::rusqlite::{Transaction, params};
use dbsession::{
    DbStore, ExpirationSchema, ExpirationTracker, ManualClock, Result, SessionError,
    SqliteExecutor, TransactionExecutor,
};

/// Store and tracker sharing one in-memory table, driven by a manual clock.
pub struct Fixture {
    pub store: DbStore,
    pub tracker: ExpirationTracker,
    pub clock: Arc<ManualClock>,
}

pub fn fixture(ttl: Duration) -> Fixture {
    let executor = Arc::new(SqliteExecutor::open_in_memory().unwrap());
    let clock = Arc::new(ManualClock::at_millis(0));
    let store = DbStore::builder()
        .ttl(ttl)
        .clock(clock.clone())
        .build(executor.clone())
        .unwrap();
    store.create_table().unwrap();
    let tracker = ExpirationTracker::build(ExpirationSchema::from(store.schema()), executor).unwrap();
    Fixture {
        store,
        tracker,
        clock,
    }
}

/// Executor that makes a competing writer win the insert race.
///
/// While armed, each unit of work is replaced by: another writer commits a
/// row for the session, then this unit's insert fails on the primary key.
/// Units run normally once the armed races are used up.
pub struct RacingExecutor {
    inner: SqliteExecutor,
    session_id: String,
    competitor_insert: String,
    losing_insert: String,
    races_left: AtomicUsize,
    attempts: AtomicUsize,
}

impl RacingExecutor {
    pub fn new(table: &str, id_column: &str, expiration_column: &str, session_id: &str) -> Self {
        Self {
            inner: SqliteExecutor::open_in_memory().unwrap(),
            session_id: session_id.to_string(),
            competitor_insert: format!(
                "INSERT OR IGNORE INTO {table} ({id_column}, {expiration_column}) VALUES (?1, 0)"
            ),
            losing_insert: format!(
                "INSERT INTO {table} ({id_column}, {expiration_column}) VALUES (?1, 0)"
            ),
            races_left: AtomicUsize::new(0),
            attempts: AtomicUsize::new(0),
        }
    }

    /// Lose the next `races` units of work and reset the attempt counter.
    pub fn arm(&self, races: usize) {
        self.races_left.store(races, Ordering::SeqCst);
        self.attempts.store(0, Ordering::SeqCst);
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn rows(&self, table: &str) -> i64 {
        let sql = format!("SELECT COUNT(*) FROM {table}");
        self.inner
            .run(|tx| Ok(tx.query_row(&sql, [], |r| r.get(0))?))
            .unwrap()
    }
}

impl TransactionExecutor for RacingExecutor {
    fn run<T, F>(&self, work: F) -> Result<T>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T>,
    {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let raced = self
            .races_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if !raced {
            return self.inner.run(work);
        }

        self.inner.run(|tx| {
            Ok(tx.execute(&self.competitor_insert, params![self.session_id])?)
        })?;
        self.inner.run(|tx| {
            tx.execute(&self.losing_insert, params![self.session_id])?;
            Err(SessionError::InvalidConfig(
                "competing row was not written".to_string(),
            ))
        })
    }
}
