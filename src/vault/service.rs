//! High-level credential operations used by CLI commands.
//!
//! Username tokens are non-deterministic ciphertexts, so a lookup by
//! username cannot be pushed into SQL: the rows of a site are decrypted
//! one by one until the plaintext username matches.

use zeroize::{Zeroize, Zeroizing};

use crate::auth::RootPassword;
use crate::crypto::{decrypt, derive_key_with_params, encrypt, generate_salt, DerivedKey};
use crate::db::{
    CredentialRow, CredentialStore, Database, DbConfig, Session, SessionMode, SqliteDatabase,
    UsernameRow,
};
use crate::errors::{ButlerError, Result};

/// Longest site identifier we accept.
const MAX_SITE_LEN: usize = 256;

/// The credential vault.
///
/// Row keys are derived with the KDF parameters carried by the
/// `RootPassword`, which come from the root record rather than the config.
pub struct Vault<D = SqliteDatabase> {
    store: CredentialStore<D>,
}

impl<D: Database> Vault<D> {
    /// Build a vault over an existing store.
    pub fn new(store: CredentialStore<D>) -> Self {
        Self { store }
    }

    /// Connect to the database and reflect its schema.
    pub fn connect(config: &DbConfig) -> Result<Self> {
        Ok(Self::new(CredentialStore::connect(config)?))
    }

    /// The underlying credential store.
    pub fn store(&self) -> &CredentialStore<D> {
        &self.store
    }

    // ------------------------------------------------------------------
    // Credential operations
    // ------------------------------------------------------------------

    /// Store a new credential for `site`.
    ///
    /// One fresh salt keys both the username and the password token.
    /// Fails with `Duplicate` if `site` already holds `username`.
    pub fn add(
        &self,
        root: &RootPassword,
        site: &str,
        username: &str,
        password: &str,
    ) -> Result<()> {
        Self::validate_site(site)?;
        if username.is_empty() {
            return Err(ButlerError::CommandFailed("username cannot be empty".into()));
        }

        self.store
            .database()
            .with_session(None, SessionMode::Write, |s| {
                if self.find_row(s, root, site, username)?.is_some() {
                    return Err(ButlerError::Duplicate(site.to_string()));
                }

                let salt = generate_salt();
                let key = derive_key_with_params(&salt, root.expose(), root.params())?;
                let row = CredentialRow {
                    site: site.to_string(),
                    salt: salt.to_vec(),
                    username_token: encrypt(&key, username.as_bytes())?,
                    password_token: encrypt(&key, password.as_bytes())?,
                };

                self.store.add(Some(s), &row)
            })
    }

    /// All sites, sorted case-insensitively, each listed once.
    pub fn list_sites(&self) -> Result<Vec<String>> {
        let mut sites = self.store.get_all_sites(None)?;
        sites.sort_by(|a, b| {
            a.to_lowercase()
                .cmp(&b.to_lowercase())
                .then_with(|| a.cmp(b))
        });
        sites.dedup();
        Ok(sites)
    }

    /// Decrypt every username stored for `site`.
    pub fn retrieve_usernames(&self, root: &RootPassword, site: &str) -> Result<Vec<String>> {
        let rows = self.store.get_username_rows(None, site)?;

        rows.iter()
            .map(|row| {
                let key = derive_key_with_params(&row.salt, root.expose(), root.params())?;
                into_string(decrypt(&key, &row.username_token)?)
            })
            .collect()
    }

    /// Decrypt the password stored for `site` + `username`.
    ///
    /// Returns `None` (and logs) when the site has no such username.
    pub fn retrieve_password(
        &self,
        root: &RootPassword,
        site: &str,
        username: &str,
    ) -> Result<Option<Zeroizing<String>>> {
        self.store
            .database()
            .with_session(None, SessionMode::Read, |s| {
                let Some((row, key)) = self.find_row(s, root, site, username)? else {
                    tracing::warn!(site, "No matching username, no password retrieved");
                    return Ok(None);
                };

                let pw = self.store.get_password(Some(s), site, &row.username_token)?;
                let plaintext = into_string(decrypt(&key, &pw.password_token)?)?;
                Ok(Some(Zeroizing::new(plaintext)))
            })
    }

    /// Delete the credential for `site` + `username`.
    ///
    /// Returns `false` (and logs) when the site has no such username.
    pub fn remove(&self, root: &RootPassword, site: &str, username: &str) -> Result<bool> {
        self.store
            .database()
            .with_session(None, SessionMode::Write, |s| {
                let Some((row, _key)) = self.find_row(s, root, site, username)? else {
                    tracing::warn!(site, "No matching username, nothing removed");
                    return Ok(false);
                };

                self.store.remove(Some(s), site, &row.username_token)
            })
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    /// Scan the rows of `site` for one whose username decrypts to `username`.
    ///
    /// Returns the row together with its derived key, which also opens the
    /// row's password token.
    fn find_row(
        &self,
        session: &Session<'_>,
        root: &RootPassword,
        site: &str,
        username: &str,
    ) -> Result<Option<(UsernameRow, DerivedKey)>> {
        for row in self.store.get_username_rows(Some(session), site)? {
            let key = derive_key_with_params(&row.salt, root.expose(), root.params())?;
            let candidate = Zeroizing::new(decrypt(&key, &row.username_token)?);
            if candidate.as_slice() == username.as_bytes() {
                return Ok(Some((row, key)));
            }
        }
        Ok(None)
    }

    /// Validate that a site identifier is usable.
    ///
    /// Must be non-empty, not padded with whitespace, and at most 256 bytes.
    fn validate_site(site: &str) -> Result<()> {
        if site.is_empty() {
            return Err(ButlerError::CommandFailed("site cannot be empty".into()));
        }
        if site.len() > MAX_SITE_LEN {
            return Err(ButlerError::CommandFailed(format!(
                "site cannot exceed {MAX_SITE_LEN} characters"
            )));
        }
        if site.trim() != site {
            return Err(ButlerError::CommandFailed(format!(
                "site '{site}' has leading or trailing whitespace"
            )));
        }
        Ok(())
    }
}

/// Convert decrypted bytes to a `String`, wiping them if they are not UTF-8.
fn into_string(bytes: Vec<u8>) -> Result<String> {
    String::from_utf8(bytes).map_err(|e| {
        let mut bad_bytes = e.into_bytes();
        bad_bytes.zeroize();
        ButlerError::SerializationError("decrypted value is not valid UTF-8".to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn site_validation() {
        assert!(Vault::<SqliteDatabase>::validate_site("github.com").is_ok());
        assert!(Vault::<SqliteDatabase>::validate_site("").is_err());
        assert!(Vault::<SqliteDatabase>::validate_site(" padded").is_err());
        assert!(Vault::<SqliteDatabase>::validate_site(&"x".repeat(257)).is_err());
    }

    #[test]
    fn into_string_rejects_invalid_utf8() {
        assert!(matches!(
            into_string(vec![0xff, 0xfe]),
            Err(ButlerError::SerializationError(_))
        ));
        assert_eq!(into_string(b"alice".to_vec()).unwrap(), "alice");
    }
}
