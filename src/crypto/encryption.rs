//! AES-256-GCM authenticated encryption into self-contained text tokens.
//!
//! Each call to `encrypt` generates a fresh random 12-byte nonce and
//! prepends it to the ciphertext.  The whole buffer is then encoded as
//! URL-safe base64 so it can live in a TEXT column.
//!
//! Token layout before encoding:
//!   [ 12-byte nonce | ciphertext + 16-byte auth tag ]

use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{AeadCore, Aes256Gcm, Nonce};
use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;

use super::kdf::{derive_key_with_params, generate_salt, DerivedKey, KdfParams, SALT_LEN};
use crate::errors::{ButlerError, Result};

/// Size of the AES-256-GCM nonce in bytes.
const NONCE_LEN: usize = 12;

/// Size of the GCM authentication tag in bytes.
const TAG_LEN: usize = 16;

/// Encrypt `plaintext` under `key` and return an encoded token.
pub fn encrypt(key: &DerivedKey, plaintext: &[u8]) -> Result<String> {
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| ButlerError::EncryptionFailed(format!("invalid key length: {e}")))?;

    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

    let ciphertext = cipher
        .encrypt(&nonce, plaintext)
        .map_err(|e| ButlerError::EncryptionFailed(format!("encryption error: {e}")))?;

    let mut output = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    output.extend_from_slice(&nonce);
    output.extend_from_slice(&ciphertext);
    Ok(URL_SAFE.encode(output))
}

/// Decrypt a token produced by `encrypt`.
///
/// Any failure (bad encoding, truncation, tag mismatch) is reported as
/// `AuthenticationFailed` so callers cannot tell a wrong key from
/// tampered data.
pub fn decrypt(key: &DerivedKey, token: &str) -> Result<Vec<u8>> {
    let raw = URL_SAFE
        .decode(token.as_bytes())
        .map_err(|_| ButlerError::AuthenticationFailed)?;

    if raw.len() < NONCE_LEN + TAG_LEN {
        return Err(ButlerError::AuthenticationFailed);
    }

    let (nonce_bytes, ciphertext) = raw.split_at(NONCE_LEN);
    let nonce = Nonce::from_slice(nonce_bytes);

    let cipher =
        Aes256Gcm::new_from_slice(key.as_bytes()).map_err(|_| ButlerError::AuthenticationFailed)?;

    cipher
        .decrypt(nonce, ciphertext)
        .map_err(|_| ButlerError::AuthenticationFailed)
}

/// Derive a key from `password` + `salt` and encrypt `secret` with it.
pub fn encrypt_with_salt(
    password: &[u8],
    salt: &[u8],
    secret: &[u8],
    params: &KdfParams,
) -> Result<String> {
    let key = derive_key_with_params(salt, password, params)?;
    encrypt(&key, secret)
}

/// Derive a key from `password` + `salt` and decrypt `token` with it.
pub fn decrypt_with_salt(
    password: &[u8],
    salt: &[u8],
    token: &str,
    params: &KdfParams,
) -> Result<Vec<u8>> {
    let key = derive_key_with_params(salt, password, params)?;
    decrypt(&key, token)
}

/// Encrypt `secret` under a brand-new salt.  Returns the token and the salt
/// the caller must store alongside it.
pub fn encrypt_with_fresh_salt(
    password: &[u8],
    secret: &[u8],
    params: &KdfParams,
) -> Result<(String, [u8; SALT_LEN])> {
    let salt = generate_salt();
    let token = encrypt_with_salt(password, &salt, secret, params)?;
    Ok((token, salt))
}
