//! Query layer over the `credential` table.
//!
//! Every method takes an optional caller-owned session.  Passing `None`
//! makes the method open, commit (or roll back) and close its own.
//! Mutations always run under the write lock, so `add`'s existence check
//! and insert cannot interleave with another process.

use rusqlite::{params, OptionalExtension};

use super::models::{CredentialRow, PasswordRow, UsernameRow};
use super::{Database, DbConfig, Session, SessionMode, SqliteDatabase};
use crate::errors::{ButlerError, Result};

/// Credential persistence on top of a `Database`.
pub struct CredentialStore<D = SqliteDatabase> {
    db: D,
}

impl<D: Database> CredentialStore<D> {
    /// Wrap an already reflected database handle.
    pub fn new(db: D) -> Self {
        Self { db }
    }

    /// Connect to the database described by `config` and reflect its schema.
    pub fn connect(config: &DbConfig) -> Result<Self> {
        let mut db = D::connect(config)?;
        db.reflect()?;
        Ok(Self { db })
    }

    /// The underlying database handle.
    pub fn database(&self) -> &D {
        &self.db
    }

    /// Every row's site, in storage order.  A site with several accounts
    /// appears once per account.
    pub fn get_all_sites(&self, session: Option<&Session<'_>>) -> Result<Vec<String>> {
        self.db.with_session(session, SessionMode::Read, |s| {
            let mut stmt = s.prepare("SELECT app_site FROM credential ORDER BY rowid")?;
            let sites = stmt
                .query_map([], |row| row.get(0))?
                .collect::<std::result::Result<Vec<String>, _>>()?;
            Ok(sites)
        })
    }

    /// Username tokens (with their salts) stored for `site`.
    pub fn get_username_rows(
        &self,
        session: Option<&Session<'_>>,
        site: &str,
    ) -> Result<Vec<UsernameRow>> {
        self.db.with_session(session, SessionMode::Read, |s| {
            let mut stmt = s.prepare(
                "SELECT username, salt FROM credential
                 WHERE app_site = ?1
                 ORDER BY rowid",
            )?;
            let rows = stmt
                .query_map(params![site], |row| {
                    Ok(UsernameRow {
                        username_token: row.get(0)?,
                        salt: row.get(1)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Password token for the row identified by `site` + `username_token`.
    pub fn get_password(
        &self,
        session: Option<&Session<'_>>,
        site: &str,
        username_token: &str,
    ) -> Result<PasswordRow> {
        self.db.with_session(session, SessionMode::Read, |s| {
            s.query_row(
                "SELECT password, salt FROM credential
                 WHERE app_site = ?1 AND username = ?2",
                params![site, username_token],
                |row| {
                    Ok(PasswordRow {
                        password_token: row.get(0)?,
                        salt: row.get(1)?,
                    })
                },
            )
            .optional()?
            .ok_or_else(|| ButlerError::NotFound(site.to_string()))
        })
    }

    /// Salt of the single row stored for `site`.
    ///
    /// Only meaningful when the site has exactly one account: several rows
    /// give `Ambiguous`, none gives `NotFound`.
    pub fn get_salt(&self, session: Option<&Session<'_>>, site: &str) -> Result<Vec<u8>> {
        self.db.with_session(session, SessionMode::Read, |s| {
            let mut stmt = s.prepare("SELECT salt FROM credential WHERE app_site = ?1")?;
            let mut salts = stmt
                .query_map(params![site], |row| row.get::<_, Vec<u8>>(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            match salts.len() {
                0 => Err(ButlerError::NotFound(site.to_string())),
                1 => Ok(salts.remove(0)),
                count => Err(ButlerError::Ambiguous {
                    site: site.to_string(),
                    count,
                }),
            }
        })
    }

    /// Insert `row`, refusing an existing `(site, username_token)` pair.
    pub fn add(&self, session: Option<&Session<'_>>, row: &CredentialRow) -> Result<()> {
        self.db.with_session(session, SessionMode::Write, |s| {
            let exists: bool = s.query_row(
                "SELECT EXISTS(SELECT 1 FROM credential WHERE app_site = ?1 AND username = ?2)",
                params![row.site, row.username_token],
                |r| r.get(0),
            )?;
            if exists {
                return Err(ButlerError::Duplicate(row.site.clone()));
            }

            s.execute(
                "INSERT INTO credential (app_site, salt, username, password)
                 VALUES (?1, ?2, ?3, ?4)",
                params![row.site, row.salt, row.username_token, row.password_token],
            )
            .map_err(|e| match e.sqlite_error_code() {
                Some(rusqlite::ErrorCode::ConstraintViolation) => {
                    ButlerError::Duplicate(row.site.clone())
                }
                _ => ButlerError::Database(e),
            })?;

            tracing::info!(site = %row.site, "Credential stored");
            Ok(())
        })
    }

    /// Delete the row identified by `site` + `username_token`.
    ///
    /// Returns `false` (and logs) when no row matched.
    pub fn remove(
        &self,
        session: Option<&Session<'_>>,
        site: &str,
        username_token: &str,
    ) -> Result<bool> {
        self.db.with_session(session, SessionMode::Write, |s| {
            let deleted = s.execute(
                "DELETE FROM credential WHERE app_site = ?1 AND username = ?2",
                params![site, username_token],
            )?;

            if deleted == 0 {
                tracing::warn!(site, "No credential matched, nothing removed");
                return Ok(false);
            }

            tracing::info!(site, "Credential removed");
            Ok(true)
        })
    }

    /// Number of stored rows.
    pub fn count(&self, session: Option<&Session<'_>>) -> Result<usize> {
        self.db.with_session(session, SessionMode::Read, |s| {
            let count: i64 = s.query_row("SELECT COUNT(*) FROM credential", [], |r| r.get(0))?;
            Ok(usize::try_from(count).unwrap_or_default())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    use crate::db::RetryPolicy;

    fn store(dir: &TempDir) -> CredentialStore {
        let cfg = DbConfig {
            path: dir.path().join("cred.db"),
            busy_timeout: Duration::from_millis(500),
            retry: RetryPolicy {
                max_attempts: 1,
                backoff: Duration::ZERO,
            },
        };
        let db = SqliteDatabase::connect(&cfg).unwrap();
        db.install_schema().unwrap();
        CredentialStore::connect(&cfg).unwrap()
    }

    fn row(site: &str, user: &str) -> CredentialRow {
        CredentialRow {
            site: site.into(),
            salt: vec![0x5a; 16],
            username_token: user.into(),
            password_token: format!("pw-of-{user}"),
        }
    }

    #[test]
    fn get_password_returns_pair() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.add(None, &row("times", "tok-a")).unwrap();

        let pw = store.get_password(None, "times", "tok-a").unwrap();
        assert_eq!(pw.password_token, "pw-of-tok-a");
        assert_eq!(pw.salt, vec![0x5a; 16]);
    }

    #[test]
    fn get_password_missing_is_not_found() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        assert!(matches!(
            store.get_password(None, "times", "nobody"),
            Err(ButlerError::NotFound(_))
        ));
    }

    #[test]
    fn remove_reports_missing_row() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        assert!(!store.remove(None, "times", "nobody").unwrap());
    }

    #[test]
    fn count_tracks_rows() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        assert_eq!(store.count(None).unwrap(), 0);
        store.add(None, &row("a", "1")).unwrap();
        store.add(None, &row("b", "2")).unwrap();
        assert_eq!(store.count(None).unwrap(), 2);
    }
}
