//! Configuration: the Butler home directory and `config.toml` settings.

pub mod settings;

use std::path::PathBuf;

pub use settings::Settings;

use crate::errors::{ButlerError, Result};

/// Environment variable that overrides the home directory.
pub const HOME_ENV: &str = "BUTLER_HOME";

/// Directory name used under `$HOME` when nothing else is configured.
const DEFAULT_DIR_NAME: &str = ".pw_butler";

/// Resolve the Butler home directory.
///
/// Order: explicit path, then `BUTLER_HOME`, then `$HOME/.pw_butler`.
pub fn resolve_home(explicit: Option<&str>) -> Result<PathBuf> {
    if let Some(dir) = explicit {
        return Ok(PathBuf::from(dir));
    }

    if let Ok(dir) = std::env::var(HOME_ENV) {
        if !dir.is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }

    match std::env::var_os("HOME") {
        Some(home) if !home.is_empty() => Ok(PathBuf::from(home).join(DEFAULT_DIR_NAME)),
        _ => Err(ButlerError::ConfigError(format!(
            "cannot locate home directory; set {HOME_ENV} or pass --home"
        ))),
    }
}
