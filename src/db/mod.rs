//! Credential store: relational persistence of encrypted credential rows.
//!
//! This module provides:
//! - The `Database` capability trait and its SQLite implementation (`sqlite`)
//! - Bounded retry for a backend that is still starting (`retry`)
//! - The `credential` table declaration and validation (`schema`)
//! - Row types (`models`) and the query layer `CredentialStore` (`store`)

pub mod models;
pub mod retry;
pub mod schema;
pub mod sqlite;
pub mod store;

use std::path::PathBuf;
use std::time::Duration;

use rusqlite::ErrorCode;

use crate::errors::{ButlerError, Result};

// Re-export the most commonly used items.
pub use models::{CredentialRow, PasswordRow, UsernameRow};
pub use retry::{retry_transient, RetryPolicy};
pub use sqlite::SqliteDatabase;
pub use store::CredentialStore;

/// An open database transaction.  Queries run through it; it rolls back
/// on drop unless committed.
pub type Session<'conn> = rusqlite::Transaction<'conn>;

/// Connection parameters handed to `Database::connect`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    /// Database file.
    pub path: PathBuf,
    /// How long a connection waits for another process's lock.
    pub busy_timeout: Duration,
    /// Retry policy for `reflect`.
    pub retry: RetryPolicy,
}

impl DbConfig {
    /// Config for `path` with default timeouts and retry policy.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout: Duration::from_secs(5),
            retry: RetryPolicy::default(),
        }
    }
}

/// Schema availability of a connected database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaState {
    /// `reflect` has not succeeded yet.
    Unready,
    /// The credential table was found with every expected column.
    Ready,
    /// `reflect` gave up; the handle cannot serve sessions.
    Failed,
}

/// Lock intent of a session opened by `with_session`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    /// Deferred transaction; no lock is taken up front.
    Read,
    /// Immediate transaction; takes the write lock before the first statement.
    Write,
}

/// Capability interface over the relational backend.
pub trait Database {
    /// Build a handle from connection parameters.  No schema is assumed yet.
    fn connect(config: &DbConfig) -> Result<Self>
    where
        Self: Sized;

    /// Validate the live schema, retrying while the backend is not ready.
    fn reflect(&mut self) -> Result<()>;

    /// Current schema availability.
    fn state(&self) -> SchemaState;

    /// Run `f` inside a session.
    ///
    /// With `Some(session)` the caller owns the transaction and `f` simply
    /// runs in it.  With `None` a fresh connection and transaction are opened
    /// for the call: committed if `f` succeeds, rolled back otherwise, and
    /// closed on every path.
    fn with_session<T, F>(&self, session: Option<&Session<'_>>, mode: SessionMode, f: F) -> Result<T>
    where
        F: FnOnce(&Session<'_>) -> Result<T>;
}

/// Map a `rusqlite` error onto the retry taxonomy.
///
/// A database that cannot be opened yet, or is held by another process,
/// is transient; everything else is a plain database error.
pub(crate) fn classify(err: rusqlite::Error) -> ButlerError {
    match err.sqlite_error_code() {
        Some(ErrorCode::CannotOpen | ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked) => {
            ButlerError::TransientConnection(err.to_string())
        }
        _ => ButlerError::Database(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn busy_is_transient() {
        let err = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_BUSY),
            None,
        );
        assert!(classify(err).is_transient());
    }

    #[test]
    fn cannot_open_is_transient() {
        let err = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CANTOPEN),
            None,
        );
        assert!(classify(err).is_transient());
    }

    #[test]
    fn other_errors_are_permanent() {
        let err = rusqlite::Error::QueryReturnedNoRows;
        assert!(matches!(classify(err), ButlerError::Database(_)));
    }
}
