//! Root password authentication.
//!
//! The root password itself is never stored.  `initialize` persists a
//! salted PBKDF2 hash of it; `verify` recomputes the hash for a
//! candidate password and compares in constant time.  A successful
//! `authenticate` hands back the `RootPassword` capability that every
//! vault operation requires.

pub mod record;

use std::path::{Path, PathBuf};

use chrono::Utc;
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use crate::crypto::{derive_key_with_params, generate_salt, KdfParams};
use crate::errors::{ButlerError, Result};

use record::AuthRecord;

/// A root password that has been checked against the auth record.
///
/// Only `AuthStore::authenticate` creates one.  It carries the KDF
/// parameters of the record it was checked against; credential keys are
/// derived with those, not with whatever the config currently says.
/// The bytes are wiped from memory on drop.
pub struct RootPassword {
    secret: Zeroizing<Vec<u8>>,
    params: KdfParams,
}

impl RootPassword {
    /// The raw password bytes, for key derivation.
    pub fn expose(&self) -> &[u8] {
        &self.secret
    }

    /// KDF parameters bound to this root password.
    pub fn params(&self) -> &KdfParams {
        &self.params
    }
}

impl std::fmt::Debug for RootPassword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("RootPassword(..)")
    }
}

/// File-backed store for the single root password record.
#[derive(Debug, Clone)]
pub struct AuthStore {
    path: PathBuf,
    params: KdfParams,
}

impl AuthStore {
    /// `params` applies to newly initialized records; verification always
    /// uses the iteration count stored in the record.
    pub fn new(path: impl Into<PathBuf>, params: KdfParams) -> Self {
        Self {
            path: path.into(),
            params,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns `true` if a record exists on disk.
    pub fn is_initialized(&self) -> bool {
        self.path.exists()
    }

    /// Hash and persist the root password.
    ///
    /// Refuses to touch an existing record; use `reinitialize` once the
    /// owner has confirmed the overwrite.
    pub fn initialize(&self, password: &[u8]) -> Result<()> {
        if self.is_initialized() {
            return Err(ButlerError::AlreadyInitialized(self.path.clone()));
        }
        self.write(password)
    }

    /// Replace the root password record unconditionally.
    ///
    /// Credentials encrypted under the old root password become unreadable.
    pub fn reinitialize(&self, password: &[u8]) -> Result<()> {
        self.write(password)
    }

    /// Check `password` against the stored hash.
    ///
    /// Returns `Ok(false)` for a wrong password and `NotInitialized` when
    /// there is no record at all.
    pub fn verify(&self, password: &[u8]) -> Result<bool> {
        self.check(password).map(|(ok, _)| ok)
    }

    /// Verify `password` and, on success, return it as a `RootPassword`
    /// bound to the record's iteration count.
    pub fn authenticate(&self, password: &[u8]) -> Result<RootPassword> {
        let (ok, params) = self.check(password)?;
        if !ok {
            tracing::warn!(path = %self.path.display(), "Root password rejected");
            return Err(ButlerError::AuthenticationFailed);
        }
        if params != self.params {
            tracing::debug!(
                stored = params.iterations,
                configured = self.params.iterations,
                "Using the root record's KDF iterations"
            );
        }
        Ok(RootPassword {
            secret: Zeroizing::new(password.to_vec()),
            params,
        })
    }

    /// Compare `password` against the record, returning the record's params.
    fn check(&self, password: &[u8]) -> Result<(bool, KdfParams)> {
        let record = record::read_record(&self.path)?;
        let params = KdfParams {
            iterations: record.kdf_iterations,
        };
        let candidate = derive_key_with_params(&record.salt, password, &params)?;
        let candidate = Zeroizing::new(candidate.encoded());

        let ok: bool = candidate
            .as_bytes()
            .ct_eq(record.password_hash.as_bytes())
            .into();
        Ok((ok, params))
    }

    fn write(&self, password: &[u8]) -> Result<()> {
        let salt = generate_salt();
        let hash = derive_key_with_params(&salt, password, &self.params)?;

        let record = AuthRecord {
            salt: salt.to_vec(),
            password_hash: hash.encoded(),
            kdf_iterations: self.params.iterations,
            created_at: Utc::now(),
        };
        record::write_record(&self.path, &record)?;

        tracing::info!(path = %self.path.display(), "Root password initialized");
        Ok(())
    }
}
