//! On-disk format of the root password record.
//!
//! An `auth.bin` file has this layout:
//!
//! ```text
//! [BTLR: 4 bytes][version: 1 byte][record JSON]
//! ```
//!
//! - **Magic** (`BTLR`): identifies the file as a Butler auth record.
//! - **Version**: format version (currently `1`).
//! - **Record JSON**: serialized `AuthRecord`.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{ButlerError, Result};

/// Magic bytes at the start of every auth record.
const MAGIC: &[u8; 4] = b"BTLR";

/// Current record format version.
pub const CURRENT_VERSION: u8 = 1;

/// Fixed-size prefix: 4 (magic) + 1 (version).
const PREFIX_LEN: usize = 5;

/// Salted hash of the root password.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthRecord {
    /// Salt fed to the KDF together with the root password (base64 in JSON).
    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub salt: Vec<u8>,

    /// URL-safe base64 encoding of the derived 32-byte key.
    pub password_hash: String,

    /// Iteration count used to derive `password_hash`.
    pub kdf_iterations: u32,

    /// When the root password was set.
    pub created_at: DateTime<Utc>,
}

/// Serialize `record` and write it to `path` atomically (owner-only).
pub fn write_record(path: &Path, record: &AuthRecord) -> Result<()> {
    let body = serde_json::to_vec(record)
        .map_err(|e| ButlerError::SerializationError(format!("auth record: {e}")))?;

    let mut buf = Vec::with_capacity(PREFIX_LEN + body.len());
    buf.extend_from_slice(MAGIC);
    buf.push(CURRENT_VERSION);
    buf.extend_from_slice(&body);

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            crate::fsutil::ensure_private_dir(parent)?;
        }
    }
    crate::fsutil::write_private(path, &buf)
}

/// Read and parse the record at `path`.
///
/// A missing file is reported as `NotInitialized`.
pub fn read_record(path: &Path) -> Result<AuthRecord> {
    if !path.exists() {
        return Err(ButlerError::NotInitialized(path.to_path_buf()));
    }

    let data = fs::read(path)?;

    if data.len() < PREFIX_LEN {
        return Err(ButlerError::InvalidAuthRecord(
            "file too small to be an auth record".into(),
        ));
    }

    if &data[0..4] != MAGIC {
        return Err(ButlerError::InvalidAuthRecord(
            "missing BTLR magic bytes".into(),
        ));
    }

    let version = data[4];
    if version != CURRENT_VERSION {
        return Err(ButlerError::InvalidAuthRecord(format!(
            "unsupported version {version}, expected {CURRENT_VERSION}"
        )));
    }

    serde_json::from_slice(&data[PREFIX_LEN..])
        .map_err(|e| ButlerError::InvalidAuthRecord(format!("record JSON: {e}")))
}

// ---------------------------------------------------------------------------
// Serde helpers for base64-encoded Vec<u8> fields
// ---------------------------------------------------------------------------

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

fn base64_encode<S>(data: &[u8], serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&BASE64.encode(data))
}

fn base64_decode<'de, D>(deserializer: D) -> std::result::Result<Vec<u8>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    BASE64.decode(&s).map_err(serde::de::Error::custom)
}
