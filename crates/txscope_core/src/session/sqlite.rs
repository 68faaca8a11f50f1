//! SQLite-backed session handles and factory.
//!
//! # Responsibility
//! - Wrap one migrated `rusqlite::Connection` as a `Session`.
//! - Open a transaction lazily on first use and close it on commit/rollback.
//!
//! # Invariants
//! - A closed session never touches its connection again.
//! - Closing a session with pending changes discards them.

use super::{FactoryError, Session, SessionFactory};
use crate::db::{open_db_with, DbError, DbResult, DEFAULT_BUSY_TIMEOUT};
use log::{debug, warn};
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::time::Duration;
use uuid::Uuid;

/// Session handle over one SQLite connection.
pub struct SqliteSession {
    id: Uuid,
    conn: Option<Connection>,
}

impl SqliteSession {
    /// Adopts an already bootstrapped connection.
    pub fn new(conn: Connection) -> Self {
        Self {
            id: Uuid::new_v4(),
            conn: Some(conn),
        }
    }

    /// Correlation id used in log events.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Returns the connection inside an open transaction.
    ///
    /// Starts a deferred transaction when none is active, so statements run
    /// by the caller are committed or rolled back as one unit.
    ///
    /// # Errors
    /// - `DbError::SessionClosed` after `close`.
    /// - `DbError::Sqlite` when `BEGIN` fails.
    pub fn connection(&self) -> DbResult<&Connection> {
        let conn = self.conn.as_ref().ok_or(DbError::SessionClosed)?;
        if conn.is_autocommit() {
            conn.execute_batch("BEGIN DEFERRED;")?;
        }
        Ok(conn)
    }

    fn open_transaction(&self) -> DbResult<Option<&Connection>> {
        let conn = self.conn.as_ref().ok_or(DbError::SessionClosed)?;
        Ok((!conn.is_autocommit()).then_some(conn))
    }
}

impl Session for SqliteSession {
    fn commit(&mut self) -> Result<(), DbError> {
        if let Some(conn) = self.open_transaction()? {
            conn.execute_batch("COMMIT;")?;
        }
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), DbError> {
        if let Some(conn) = self.open_transaction()? {
            conn.execute_batch("ROLLBACK;")?;
        }
        Ok(())
    }

    fn close(&mut self) {
        let Some(conn) = self.conn.take() else {
            return;
        };
        if !conn.is_autocommit() {
            if let Err(err) = conn.execute_batch("ROLLBACK;") {
                warn!(
                    "event=session_close module=session status=rollback_failed session_id={} error={}",
                    self.id, err
                );
            }
        }
        if let Err((_, err)) = conn.close() {
            warn!(
                "event=session_close module=session status=error session_id={} error={}",
                self.id, err
            );
            return;
        }
        debug!(
            "event=session_close module=session status=ok session_id={}",
            self.id
        );
    }

    fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    fn has_pending_changes(&self) -> bool {
        self.conn
            .as_ref()
            .is_some_and(|conn| !conn.is_autocommit())
    }
}

impl Drop for SqliteSession {
    fn drop(&mut self) {
        self.close();
    }
}

/// Connection settings for `SqliteSessionFactory`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub path: PathBuf,
    /// How long a statement waits on a competing lock before `SQLITE_BUSY`.
    pub busy_timeout: Duration,
}

impl SessionConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }

    pub fn busy_timeout(mut self, busy_timeout: Duration) -> Self {
        self.busy_timeout = busy_timeout;
        self
    }
}

/// Opens one fresh connection per session. No pooling.
#[derive(Debug, Clone)]
pub struct SqliteSessionFactory {
    config: SessionConfig,
}

impl SqliteSessionFactory {
    pub fn new(config: SessionConfig) -> Self {
        Self { config }
    }

    /// Factory for `path` with default settings.
    pub fn open(path: impl AsRef<Path>) -> Self {
        Self::new(SessionConfig::new(path.as_ref()))
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }
}

impl SessionFactory for SqliteSessionFactory {
    type Session = SqliteSession;

    fn new_session(&self) -> Result<SqliteSession, FactoryError> {
        let conn = open_db_with(&self.config.path, self.config.busy_timeout)?;
        let session = SqliteSession::new(conn);
        debug!(
            "event=session_open module=session status=ok session_id={} path={}",
            session.id,
            self.config.path.display()
        );
        Ok(session)
    }
}
