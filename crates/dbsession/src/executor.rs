//! Transaction execution against SQLite.
//!
//! Stores never hold a connection themselves. Each public operation hands a
//! unit of work to a [`TransactionExecutor`], which acquires a connection, runs
//! the work inside one transaction and commits, or rolls back if the work fails.

use std::path::{Path, PathBuf};
use std::time::Duration;

use parking_lot::Mutex;
use rusqlite::{Connection, OpenFlags, Transaction, TransactionBehavior};
use tracing::{debug, info};

use crate::error::{Result, SessionError};

/// Default time a connection waits on a locked database before failing.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Runs units of work inside a committed-or-rolled-back transaction.
///
/// Implementations must report SQLite uniqueness violations as
/// [`SessionError::DuplicateKey`]; the `From<rusqlite::Error>` conversion does
/// that for any error propagated with `?`.
pub trait TransactionExecutor: Send + Sync {
    fn run<T, F>(&self, work: F) -> Result<T>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T>;
}

enum ConnectionSource {
    /// A fresh connection per unit of work.
    File(PathBuf),
    /// One connection shared by every unit of work.
    Shared(Mutex<Connection>),
}

/// SQLite-backed [`TransactionExecutor`].
pub struct SqliteExecutor {
    source: ConnectionSource,
    busy_timeout: Duration,
}

impl std::fmt::Debug for SqliteExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let source = match &self.source {
            ConnectionSource::File(path) => path.display().to_string(),
            ConnectionSource::Shared(_) => ":memory:".to_string(),
        };
        f.debug_struct("SqliteExecutor")
            .field("source", &source)
            .field("busy_timeout", &self.busy_timeout)
            .finish()
    }
}

impl SqliteExecutor {
    /// Open (or create) the database file at `path`.
    ///
    /// Each unit of work opens its own connection, so concurrent callers
    /// contend on SQLite's locks rather than on an in-process mutex.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|_| {
                SessionError::Database(rusqlite::Error::InvalidPath(path.to_path_buf()))
            })?;
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        conn.busy_timeout(DEFAULT_BUSY_TIMEOUT)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;

        info!("Session database opened at {:?}", path);
        Ok(Self {
            source: ConnectionSource::File(path.to_path_buf()),
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        })
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        debug!("In-memory session database created");
        Ok(Self {
            source: ConnectionSource::Shared(Mutex::new(conn)),
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        })
    }

    /// Set how long a connection waits on a locked database.
    pub fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    pub fn busy_timeout(&self) -> Duration {
        self.busy_timeout
    }

    /// Run a batch of SQL (DDL, pragmas) in its own transaction.
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        self.run(|tx| Ok(tx.execute_batch(sql)?))
    }

    fn acquire(&self, path: &Path) -> Result<Connection> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        conn.busy_timeout(self.busy_timeout)?;
        Ok(conn)
    }
}

impl TransactionExecutor for SqliteExecutor {
    fn run<T, F>(&self, work: F) -> Result<T>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T>,
    {
        match &self.source {
            ConnectionSource::File(path) => {
                let mut conn = self.acquire(path)?;
                in_transaction(&mut conn, work)
            }
            ConnectionSource::Shared(conn) => {
                let mut conn = conn.lock();
                in_transaction(&mut conn, work)
            }
        }
    }
}

/// Write intent is declared up front (`BEGIN IMMEDIATE`) so a read-then-write
/// unit never fails half way on a lock upgrade.
fn in_transaction<T, F>(conn: &mut Connection, work: F) -> Result<T>
where
    F: FnOnce(&Transaction<'_>) -> Result<T>,
{
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    // Dropping an uncommitted transaction rolls it back.
    let value = work(&tx)?;
    tx.commit()?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::params;
    use tempfile::TempDir;

    #[test]
    fn test_commit_on_success() {
        let exec = SqliteExecutor::open_in_memory().unwrap();
        exec.execute_batch("CREATE TABLE t (id TEXT PRIMARY KEY)").unwrap();

        exec.run(|tx| Ok(tx.execute("INSERT INTO t VALUES ('a')", [])?))
            .unwrap();

        let count: i64 = exec
            .run(|tx| Ok(tx.query_row("SELECT COUNT(*) FROM t", [], |r| r.get(0))?))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_rollback_on_error() {
        let exec = SqliteExecutor::open_in_memory().unwrap();
        exec.execute_batch("CREATE TABLE t (id TEXT PRIMARY KEY)").unwrap();

        let result: Result<()> = exec.run(|tx| {
            tx.execute("INSERT INTO t VALUES ('a')", [])?;
            Err(SessionError::InvalidConfig("abort".into()))
        });
        assert!(result.is_err());

        let count: i64 = exec
            .run(|tx| Ok(tx.query_row("SELECT COUNT(*) FROM t", [], |r| r.get(0))?))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_primary_key_violation_surfaces_as_duplicate() {
        let exec = SqliteExecutor::open_in_memory().unwrap();
        exec.execute_batch("CREATE TABLE t (id TEXT PRIMARY KEY)").unwrap();
        exec.run(|tx| Ok(tx.execute("INSERT INTO t VALUES (?1)", params!["a"])?))
            .unwrap();

        let err = exec
            .run(|tx| Ok(tx.execute("INSERT INTO t VALUES (?1)", params!["a"])?))
            .unwrap_err();
        assert!(err.is_duplicate_key(), "unexpected error: {err}");
    }

    #[test]
    fn test_file_executor_connection_per_unit() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("sessions.db");
        let exec = SqliteExecutor::open(&path)
            .unwrap()
            .with_busy_timeout(Duration::from_secs(1));
        assert!(path.exists());
        assert_eq!(exec.busy_timeout(), Duration::from_secs(1));

        exec.execute_batch("CREATE TABLE t (id TEXT PRIMARY KEY)").unwrap();
        exec.run(|tx| Ok(tx.execute("INSERT INTO t VALUES ('a')", [])?))
            .unwrap();

        // A second executor on the same file sees committed data.
        let other = SqliteExecutor::open(&path).unwrap();
        let count: i64 = other
            .run(|tx| Ok(tx.query_row("SELECT COUNT(*) FROM t", [], |r| r.get(0))?))
            .unwrap();
        assert_eq!(count, 1);
    }
}
