use std::path::PathBuf;
use thiserror::Error;

/// All errors that can occur in Butler.
#[derive(Debug, Error)]
pub enum ButlerError {
    // --- Crypto errors ---
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    /// Wrong root password or a token that fails its integrity check.
    /// The two cases are deliberately indistinguishable.
    #[error("Authentication failed; wrong password or corrupted data")]
    AuthenticationFailed,

    #[error("Key derivation failed: {0}")]
    KeyDerivationFailed(String),

    // --- Authentication store errors ---
    #[error("Root password not initialized at {0}; run `butler init` first")]
    NotInitialized(PathBuf),

    #[error("Root password already initialized at {0}")]
    AlreadyInitialized(PathBuf),

    #[error("Invalid authentication record: {0}")]
    InvalidAuthRecord(String),

    // --- Credential store errors ---
    #[error("Schema not found: {0}")]
    SchemaNotFound(String),

    #[error("Database not reachable: {0}")]
    TransientConnection(String),

    #[error("Credential store is not ready; schema has not been reflected")]
    StoreNotReady,

    #[error("A credential for '{0}' with this username already exists")]
    Duplicate(String),

    #[error("No credential found for '{0}'")]
    NotFound(String),

    #[error("Expected one credential for '{site}', found {count}")]
    Ambiguous { site: String, count: usize },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    // --- Config errors ---
    #[error("Config file error: {0}")]
    ConfigError(String),

    // --- IO errors ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // --- Serialization errors ---
    #[error("Serialization error: {0}")]
    SerializationError(String),

    // --- CLI errors ---
    #[error("Command failed: {0}")]
    CommandFailed(String),
}

impl ButlerError {
    /// Whether the error means "backend not ready yet" and is worth retrying.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::TransientConnection(_))
    }
}

/// Convenience type alias for Butler results.
pub type Result<T> = std::result::Result<T, ButlerError>;
