//! The `credential` table: its declaration and live validation.

use rusqlite::Connection;

use crate::errors::{ButlerError, Result};

/// Name of the table holding credential rows.
pub const CRED_TABLE: &str = "credential";

/// Plaintext site identifier.
pub const SITE_COLUMN: &str = "app_site";
/// Per-row random salt (BLOB).
pub const SALT_COLUMN: &str = "salt";
/// Encrypted username token (TEXT).
pub const USERNAME_COLUMN: &str = "username";
/// Encrypted password token (TEXT).
pub const PASSWORD_COLUMN: &str = "password";

/// Columns the store relies on.
pub const EXPECTED_COLUMNS: [&str; 4] =
    [SITE_COLUMN, SALT_COLUMN, USERNAME_COLUMN, PASSWORD_COLUMN];

/// DDL used by `butler init` to provision an empty database.
pub const CREATE_TABLE_SQL: &str = "
    CREATE TABLE IF NOT EXISTS credential (
        app_site  TEXT NOT NULL,
        salt      BLOB NOT NULL,
        username  TEXT NOT NULL,
        password  TEXT NOT NULL,
        UNIQUE (app_site, username)
    );

    CREATE INDEX IF NOT EXISTS idx_credential_site
        ON credential(app_site);
";

/// Check that the live database has the credential table and every
/// expected column.
///
/// Returns `SchemaNotFound` otherwise.  Connection-level failures come
/// back as `TransientConnection` or `Database` depending on their cause.
pub fn validate(conn: &Connection) -> Result<()> {
    let mut stmt = conn
        .prepare("SELECT name FROM pragma_table_info(?1)")
        .map_err(super::classify)?;

    let columns = stmt
        .query_map([CRED_TABLE], |row| row.get::<_, String>(0))
        .map_err(super::classify)?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(super::classify)?;

    if columns.is_empty() {
        return Err(ButlerError::SchemaNotFound(format!(
            "table '{CRED_TABLE}' does not exist"
        )));
    }

    for expected in EXPECTED_COLUMNS {
        if !columns.iter().any(|c| c == expected) {
            return Err(ButlerError::SchemaNotFound(format!(
                "column '{expected}' missing from '{CRED_TABLE}'"
            )));
        }
    }

    tracing::debug!(columns = ?columns, "Credential schema validated");
    Ok(())
}
