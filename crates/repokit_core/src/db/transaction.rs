//! Atomic write boundary.
//!
//! # Responsibility
//! - Run a unit of work so that all of its storage effects commit, or none.
//!
//! # Invariants
//! - Implemented with SQLite savepoints on a shared `&Connection`, so a
//!   `run` nested inside another commits only when the outermost one does.
//! - The work's own error is always returned; a failed rollback is logged,
//!   never substituted.

use crate::db::DbError;
use log::{debug, warn};
use rusqlite::Connection;

const SAVEPOINT: &str = "repokit_tx";

/// Runs closures inside one atomic transaction boundary.
pub trait TransactionRunner {
    /// Commits when `work` returns `Ok`, rolls back when it returns `Err`.
    fn run<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
        E: From<DbError>;
}

/// Savepoint-based runner over a borrowed connection.
#[derive(Debug, Clone, Copy)]
pub struct SqliteTransactions<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTransactions<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn rollback(&self) {
        let sql = format!("ROLLBACK TO {SAVEPOINT}; RELEASE {SAVEPOINT};");
        if let Err(err) = self.conn.execute_batch(&sql) {
            warn!(
                "event=tx_rollback module=db status=error error_code=rollback_failed error={}",
                err
            );
        } else {
            debug!("event=tx_rollback module=db status=ok");
        }
    }
}

impl TransactionRunner for SqliteTransactions<'_> {
    fn run<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
        E: From<DbError>,
    {
        self.conn
            .execute_batch(&format!("SAVEPOINT {SAVEPOINT};"))
            .map_err(|err| E::from(DbError::Sqlite(err)))?;

        match work() {
            Ok(value) => match self.conn.execute_batch(&format!("RELEASE {SAVEPOINT};")) {
                Ok(()) => Ok(value),
                Err(err) => {
                    self.rollback();
                    Err(E::from(DbError::Sqlite(err)))
                }
            },
            Err(err) => {
                self.rollback();
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{SqliteTransactions, TransactionRunner};
    use crate::db::DbError;
    use rusqlite::Connection;

    fn counter_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE counters (value INTEGER NOT NULL);")
            .unwrap();
        conn
    }

    fn count(conn: &Connection) -> i64 {
        conn.query_row("SELECT COUNT(*) FROM counters;", [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn ok_commits_and_err_rolls_back() {
        let conn = counter_db();
        let tx = SqliteTransactions::new(&conn);

        tx.run(|| -> Result<(), DbError> {
            conn.execute("INSERT INTO counters (value) VALUES (1);", [])?;
            Ok(())
        })
        .unwrap();

        let err = tx
            .run(|| -> Result<(), DbError> {
                conn.execute("INSERT INTO counters (value) VALUES (2);", [])?;
                conn.execute("INSERT INTO missing_table VALUES (3);", [])?;
                Ok(())
            })
            .unwrap_err();

        assert!(matches!(err, DbError::Sqlite(_)));
        assert_eq!(count(&conn), 1);
        assert!(conn.is_autocommit());
    }

    #[test]
    fn inner_commit_is_undone_by_outer_rollback() {
        let conn = counter_db();
        let tx = SqliteTransactions::new(&conn);

        let result: Result<(), DbError> = tx.run(|| {
            tx.run(|| -> Result<(), DbError> {
                conn.execute("INSERT INTO counters (value) VALUES (1);", [])?;
                Ok(())
            })?;
            Err(DbError::InvalidMigrationOrder {
                previous: 1,
                next: 1,
            })
        });

        assert!(result.is_err());
        assert_eq!(count(&conn), 0);
    }
}
