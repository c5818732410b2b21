//! Update-then-insert writes shared by both stores.

use rusqlite::{Params, Transaction};
use tracing::debug;

use crate::error::{Result, SessionError};

/// Which statement ended up writing the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UpsertOutcome {
    Updated,
    Inserted,
}

/// Update the row for a session, inserting it when the update matched nothing.
///
/// Updating first keeps an existing row in place (no window where it is
/// absent). The insert may still lose a race against a concurrent first write
/// of the same id; that surfaces as [`SessionError::DuplicateKey`].
pub(crate) fn update_or_insert<U, I>(
    tx: &Transaction<'_>,
    update_sql: &str,
    update_params: U,
    insert_sql: &str,
    insert_params: I,
) -> Result<UpsertOutcome>
where
    U: Params,
    I: Params,
{
    let updated = tx.execute(update_sql, update_params)?;
    if updated > 0 {
        return Ok(UpsertOutcome::Updated);
    }
    tx.execute(insert_sql, insert_params)?;
    Ok(UpsertOutcome::Inserted)
}

/// Run `attempt`, repeating it once if it fails with a uniqueness violation.
///
/// Two first writes for the same new id can both miss on update and both
/// insert; the loser retries and then takes the update path. A second
/// violation means something other than that race and is returned as is.
pub(crate) fn retry_on_duplicate<T, F>(session_id: &str, mut attempt: F) -> Result<T>
where
    F: FnMut() -> Result<T>,
{
    match attempt() {
        Err(SessionError::DuplicateKey(err)) => {
            debug!(session_id, error = %err, "concurrent first write, retrying upsert once");
            attempt()
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::{SqliteExecutor, TransactionExecutor};
    use rusqlite::{ffi, params};
    use std::cell::Cell;

    fn duplicate() -> SessionError {
        SessionError::from(rusqlite::Error::SqliteFailure(
            ffi::Error::new(ffi::SQLITE_CONSTRAINT_PRIMARYKEY),
            None,
        ))
    }

    #[test]
    fn test_update_or_insert_inserts_then_updates() {
        let exec = SqliteExecutor::open_in_memory().unwrap();
        exec.execute_batch("CREATE TABLE t (id TEXT PRIMARY KEY, v INTEGER NOT NULL)")
            .unwrap();

        let upsert = |v: i64| {
            exec.run(|tx| {
                update_or_insert(
                    tx,
                    "UPDATE t SET v = ?1 WHERE id = ?2",
                    params![v, "a"],
                    "INSERT INTO t (id, v) VALUES (?1, ?2)",
                    params!["a", v],
                )
            })
        };

        assert_eq!(upsert(1).unwrap(), UpsertOutcome::Inserted);
        assert_eq!(upsert(2).unwrap(), UpsertOutcome::Updated);

        let (count, v): (i64, i64) = exec
            .run(|tx| Ok(tx.query_row("SELECT COUNT(*), MAX(v) FROM t", [], |r| {
                Ok((r.get(0)?, r.get(1)?))
            })?))
            .unwrap();
        assert_eq!((count, v), (1, 2));
    }

    #[test]
    fn test_retry_once_then_succeed() {
        let calls = Cell::new(0);
        let result = retry_on_duplicate("s1", || {
            calls.set(calls.get() + 1);
            if calls.get() == 1 { Err(duplicate()) } else { Ok(calls.get()) }
        });
        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_second_duplicate_propagates() {
        let calls = Cell::new(0);
        let result: Result<()> = retry_on_duplicate("s1", || {
            calls.set(calls.get() + 1);
            Err(duplicate())
        });
        assert!(result.unwrap_err().is_duplicate_key());
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_other_errors_are_not_retried() {
        let calls = Cell::new(0);
        let result: Result<()> = retry_on_duplicate("s1", || {
            calls.set(calls.get() + 1);
            Err(SessionError::InvalidTimestamp(-1))
        });
        assert!(matches!(result, Err(SessionError::InvalidTimestamp(-1))));
        assert_eq!(calls.get(), 1);
    }
}
