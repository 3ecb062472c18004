use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::crypto::KdfParams;
use crate::db::{DbConfig, RetryPolicy};
use crate::errors::{ButlerError, Result};

/// Butler configuration, loaded from `<home>/config.toml`.
///
/// Every field has a sensible default so Butler works out-of-the-box
/// without any config file at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Credential database file (relative paths resolve against home).
    #[serde(default = "default_database")]
    pub database: String,

    /// Root password record (relative paths resolve against home).
    #[serde(default = "default_auth_file")]
    pub auth_file: String,

    /// PBKDF2 iteration count for new keys (default: 480 000).
    #[serde(default = "default_kdf_iterations")]
    pub kdf_iterations: u32,

    /// How many times `reflect` tries to reach the database (default: 5).
    #[serde(default = "default_connect_attempts")]
    pub connect_attempts: u32,

    /// Pause between connection attempts in milliseconds (default: 1000).
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// How long a connection waits on a locked database (default: 5000).
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_database() -> String {
    "credentials.db".to_string()
}

fn default_auth_file() -> String {
    "auth.bin".to_string()
}

fn default_kdf_iterations() -> u32 {
    crate::crypto::kdf::DEFAULT_ITERATIONS
}

fn default_connect_attempts() -> u32 {
    5
}

fn default_retry_backoff_ms() -> u64 {
    1_000
}

fn default_busy_timeout_ms() -> u64 {
    5_000
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            database: default_database(),
            auth_file: default_auth_file(),
            kdf_iterations: default_kdf_iterations(),
            connect_attempts: default_connect_attempts(),
            retry_backoff_ms: default_retry_backoff_ms(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

impl Settings {
    /// Name of the config file inside the Butler home directory.
    pub const FILE_NAME: &'static str = "config.toml";

    /// Load settings from `<home>/config.toml`.
    ///
    /// If the file does not exist, sensible defaults are returned.
    /// If the file exists but cannot be parsed, an error is returned.
    pub fn load(home: &Path) -> Result<Self> {
        let config_path = home.join(Self::FILE_NAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)?;

        let settings: Settings = toml::from_str(&contents).map_err(|e| {
            ButlerError::ConfigError(format!("Failed to parse {}: {e}", config_path.display()))
        })?;

        Ok(settings)
    }

    /// Write these settings to `<home>/config.toml` with owner-only permissions.
    pub fn save(&self, home: &Path) -> Result<PathBuf> {
        let config_path = home.join(Self::FILE_NAME);
        let contents = toml::to_string_pretty(self)
            .map_err(|e| ButlerError::ConfigError(format!("Failed to serialize settings: {e}")))?;

        crate::fsutil::ensure_private_dir(home)?;
        crate::fsutil::write_private(&config_path, contents.as_bytes())?;
        Ok(config_path)
    }

    /// Full path of the credential database.
    pub fn database_path(&self, home: &Path) -> PathBuf {
        home.join(&self.database)
    }

    /// Full path of the root password record.
    pub fn auth_path(&self, home: &Path) -> PathBuf {
        home.join(&self.auth_file)
    }

    /// Convert the KDF setting into crypto-layer params.
    pub fn kdf_params(&self) -> KdfParams {
        KdfParams {
            iterations: self.kdf_iterations,
        }
    }

    /// Build the structured connection record handed to `Database::connect`.
    pub fn db_config(&self, home: &Path) -> DbConfig {
        DbConfig {
            path: self.database_path(home),
            busy_timeout: Duration::from_millis(self.busy_timeout_ms),
            retry: RetryPolicy {
                max_attempts: self.connect_attempts,
                backoff: Duration::from_millis(self.retry_backoff_ms),
            },
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────
