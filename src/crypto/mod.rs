//! Cryptographic primitives for Butler.
//!
//! This module provides:
//! - PBKDF2-HMAC-SHA256 password-based key derivation (`kdf`)
//! - AES-256-GCM token encryption and decryption (`encryption`)

pub mod encryption;
pub mod kdf;

// Re-export the most commonly used items so callers can write:
//   use crate::crypto::{encrypt, decrypt, derive_key, ...};
pub use encryption::{
    decrypt, decrypt_with_salt, encrypt, encrypt_with_fresh_salt, encrypt_with_salt,
};
pub use kdf::{derive_key, derive_key_with_params, generate_salt, DerivedKey, KdfParams, SALT_LEN};
