//! SQLite implementation of the `Database` capability.
//!
//! The handle is a connection factory: every session opens its own
//! connection to the database file and closes it when the session ends.
//! Several Butler processes may share the file; SQLite's file locks plus
//! a busy timeout serialize their writers.

use std::path::Path;

use rusqlite::{Connection, OpenFlags, TransactionBehavior};

use super::retry::retry_transient;
use super::schema::{self, CREATE_TABLE_SQL};
use super::{classify, Database, DbConfig, SchemaState, Session, SessionMode};
use crate::errors::{ButlerError, Result};

/// Handle to a SQLite credential database.
#[derive(Debug)]
pub struct SqliteDatabase {
    config: DbConfig,
    state: SchemaState,
}

impl SqliteDatabase {
    /// Path of the database file.
    pub fn path(&self) -> &Path {
        &self.config.path
    }

    /// Create the credential table if it does not exist yet.
    ///
    /// Creates the database file (owner-only) when missing.  Does not
    /// change the schema state; call `reflect` afterwards.
    pub fn install_schema(&self) -> Result<()> {
        if let Some(parent) = self.config.path.parent() {
            if !parent.as_os_str().is_empty() {
                crate::fsutil::ensure_private_dir(parent)?;
            }
        }

        let conn = self.open(true)?;
        conn.execute_batch(CREATE_TABLE_SQL).map_err(classify)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&self.config.path, perms)?;
        }

        tracing::info!(path = %self.config.path.display(), "Credential schema installed");
        Ok(())
    }

    /// Open a connection for a caller-managed session.
    ///
    /// Pair with `SqliteDatabase::begin` and pass the resulting session to
    /// the store methods to group several operations in one transaction.
    pub fn connection(&self) -> Result<Connection> {
        self.ensure_ready()?;
        self.open(false)
    }

    /// Begin a transaction on `conn` with the lock intent of `mode`.
    pub fn begin(conn: &mut Connection, mode: SessionMode) -> Result<Session<'_>> {
        let behavior = match mode {
            SessionMode::Read => TransactionBehavior::Deferred,
            SessionMode::Write => TransactionBehavior::Immediate,
        };
        conn.transaction_with_behavior(behavior).map_err(classify)
    }

    fn ensure_ready(&self) -> Result<()> {
        match self.state {
            SchemaState::Ready => Ok(()),
            SchemaState::Unready | SchemaState::Failed => Err(ButlerError::StoreNotReady),
        }
    }

    fn open(&self, create: bool) -> Result<Connection> {
        let mut flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        if create {
            flags |= OpenFlags::SQLITE_OPEN_CREATE;
        }

        let conn = Connection::open_with_flags(&self.config.path, flags).map_err(classify)?;
        conn.busy_timeout(self.config.busy_timeout).map_err(classify)?;
        Ok(conn)
    }
}

impl Database for SqliteDatabase {
    fn connect(config: &DbConfig) -> Result<Self> {
        if config.path.as_os_str().is_empty() {
            return Err(ButlerError::ConfigError("database path is empty".into()));
        }
        Ok(Self {
            config: config.clone(),
            state: SchemaState::Unready,
        })
    }

    fn reflect(&mut self) -> Result<()> {
        let outcome = retry_transient(&self.config.retry, |attempt| {
            tracing::debug!(attempt, path = %self.config.path.display(), "Reflecting schema");
            let conn = self.open(false)?;
            schema::validate(&conn)
        });

        self.state = if outcome.is_ok() {
            SchemaState::Ready
        } else {
            SchemaState::Failed
        };
        outcome
    }

    fn state(&self) -> SchemaState {
        self.state
    }

    fn with_session<T, F>(&self, session: Option<&Session<'_>>, mode: SessionMode, f: F) -> Result<T>
    where
        F: FnOnce(&Session<'_>) -> Result<T>,
    {
        if let Some(session) = session {
            return f(session);
        }

        let mut conn = self.connection()?;
        let tx = Self::begin(&mut conn, mode)?;

        match f(&tx) {
            Ok(value) => {
                tx.commit().map_err(classify)?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback_err) = tx.rollback() {
                    tracing::warn!(error = %rollback_err, "Rollback failed");
                }
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    use crate::db::RetryPolicy;

    fn config(dir: &TempDir) -> DbConfig {
        DbConfig {
            path: dir.path().join("test.db"),
            busy_timeout: Duration::from_millis(100),
            retry: RetryPolicy {
                max_attempts: 2,
                backoff: Duration::ZERO,
            },
        }
    }

    #[test]
    fn fresh_handle_is_unready() {
        let dir = TempDir::new().unwrap();
        let db = SqliteDatabase::connect(&config(&dir)).unwrap();
        assert_eq!(db.state(), SchemaState::Unready);
        assert!(matches!(
            db.with_session(None, SessionMode::Read, |_| Ok(())),
            Err(ButlerError::StoreNotReady)
        ));
    }

    #[test]
    fn install_then_reflect_is_ready() {
        let dir = TempDir::new().unwrap();
        let mut db = SqliteDatabase::connect(&config(&dir)).unwrap();
        db.install_schema().unwrap();
        db.reflect().unwrap();
        assert_eq!(db.state(), SchemaState::Ready);
    }

    #[test]
    fn failed_reflect_marks_failed() {
        let dir = TempDir::new().unwrap();
        let mut db = SqliteDatabase::connect(&config(&dir)).unwrap();
        assert!(db.reflect().is_err());
        assert_eq!(db.state(), SchemaState::Failed);
    }

    #[test]
    fn reflect_does_not_create_the_file() {
        let dir = TempDir::new().unwrap();
        let cfg = config(&dir);
        let mut db = SqliteDatabase::connect(&cfg).unwrap();
        let _ = db.reflect();
        assert!(!cfg.path.exists());
    }

    #[test]
    fn empty_path_is_rejected() {
        let cfg = DbConfig::new("");
        assert!(matches!(
            SqliteDatabase::connect(&cfg),
            Err(ButlerError::ConfigError(_))
        ));
    }

    #[test]
    fn failing_session_rolls_back() {
        let dir = TempDir::new().unwrap();
        let mut db = SqliteDatabase::connect(&config(&dir)).unwrap();
        db.install_schema().unwrap();
        db.reflect().unwrap();

        let result: Result<()> = db.with_session(None, SessionMode::Write, |s| {
            s.execute(
                "INSERT INTO credential (app_site, salt, username, password)
                 VALUES ('a', x'00', 'u', 'p')",
                [],
            )?;
            Err(ButlerError::CommandFailed("boom".into()))
        });
        assert!(result.is_err());

        let count: i64 = db
            .with_session(None, SessionMode::Read, |s| {
                Ok(s.query_row("SELECT COUNT(*) FROM credential", [], |r| r.get(0))?)
            })
            .unwrap();
        assert_eq!(count, 0);
    }
}
