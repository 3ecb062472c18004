//! Password-based key derivation using PBKDF2-HMAC-SHA256.
//!
//! Every stored credential row carries its own random salt.  The root
//! password and that salt are stretched into a 32-byte key, which is
//! what the authenticated-encryption layer consumes.  Derivation is
//! deterministic: encryption and decryption happen in unrelated calls
//! and must arrive at the same key.

use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use rand::RngCore;
use sha2::Sha256;
use zeroize::Zeroize;

use crate::errors::{ButlerError, Result};

/// Length of a freshly generated salt in bytes (128 bits).
pub const SALT_LEN: usize = 16;

/// Length of the derived key in bytes (256 bits, for AES-256).
pub const KEY_LEN: usize = 32;

/// Default PBKDF2 iteration count.
pub const DEFAULT_ITERATIONS: u32 = 480_000;

/// Lowest iteration count we accept from configuration.
const MIN_ITERATIONS: u32 = 10_000;

/// Configurable PBKDF2 parameters.
///
/// Maps to `kdf_iterations` in `config.toml`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    /// Number of HMAC-SHA256 rounds (default: 480 000).
    pub iterations: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
        }
    }
}

/// A 32-byte derived key that zeroes its memory when dropped.
#[derive(Zeroize)]
#[zeroize(drop)]
pub struct DerivedKey {
    bytes: [u8; KEY_LEN],
}

impl DerivedKey {
    /// Access the raw key bytes (e.g. to build a cipher).
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }

    /// URL-safe base64 encoding of the key, padding included.
    ///
    /// This is the form persisted as the root password hash.
    pub fn encoded(&self) -> String {
        URL_SAFE.encode(self.bytes)
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("DerivedKey(..)")
    }
}

/// Derive a key from a salt and password using the default iteration count.
///
/// Prefer `derive_key_with_params` when you have `Settings`.
pub fn derive_key(salt: &[u8], password: &[u8]) -> Result<DerivedKey> {
    derive_key_with_params(salt, password, &KdfParams::default())
}

/// Derive a key with explicit PBKDF2 parameters.
///
/// The same salt + password + params always produce the same key.
pub fn derive_key_with_params(
    salt: &[u8],
    password: &[u8],
    params: &KdfParams,
) -> Result<DerivedKey> {
    if params.iterations < MIN_ITERATIONS {
        return Err(ButlerError::KeyDerivationFailed(format!(
            "kdf iterations must be at least {MIN_ITERATIONS} (got {})",
            params.iterations
        )));
    }
    if salt.is_empty() {
        return Err(ButlerError::KeyDerivationFailed("salt is empty".into()));
    }

    let mut bytes = [0u8; KEY_LEN];
    pbkdf2::pbkdf2_hmac::<Sha256>(password, salt, params.iterations, &mut bytes);

    let key = DerivedKey { bytes };
    bytes.zeroize();
    Ok(key)
}

/// Generate a cryptographically random 16-byte salt.
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    rand::rng().fill_bytes(&mut salt);
    salt
}
