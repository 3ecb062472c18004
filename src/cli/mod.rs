//! CLI module: Clap argument parser, output helpers, and command implementations.

pub mod commands;
pub mod output;

use std::path::PathBuf;

use clap::Parser;
use zeroize::Zeroizing;

use crate::auth::{AuthStore, RootPassword};
use crate::config::{self, Settings};
use crate::errors::{ButlerError, Result};
use crate::vault::Vault;

/// Environment variable consulted before prompting for the root password.
pub const PASSWORD_ENV: &str = "BUTLER_PASSWORD";

/// Minimum root password length to prevent trivially weak passwords.
const MIN_PASSWORD_LEN: usize = 8;

/// Butler CLI: personal credential vault.
#[derive(Parser)]
#[command(name = "butler", about = "Personal credential vault", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Butler home directory (default: ~/.pw_butler)
    #[arg(long, global = true, env = "BUTLER_HOME")]
    pub home: Option<String>,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Set up the database and the root password
    Init {
        /// Overwrite an existing root password without asking
        #[arg(long)]
        force: bool,
    },

    /// Store a credential for a site
    Add {
        /// Site or app name (e.g. github.com)
        site: String,
        /// Username (omit for interactive prompt)
        #[arg(short, long)]
        username: Option<String>,
    },

    /// List all sites
    Ls,

    /// Show the usernames stored for a site
    Get {
        /// Site or app name
        site: String,
    },

    /// Print the password for a site and username
    Pw {
        /// Site or app name
        site: String,
        /// Username
        username: String,
    },

    /// Remove a credential
    Rm {
        /// Site or app name
        site: String,
        /// Username
        username: String,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// Resolve the home directory from the CLI arguments.
pub fn home_dir(cli: &Cli) -> Result<PathBuf> {
    config::resolve_home(cli.home.as_deref())
}

/// Build the auth store described by `settings`.
pub fn auth_store(home: &std::path::Path, settings: &Settings) -> AuthStore {
    AuthStore::new(settings.auth_path(home), settings.kdf_params())
}

/// A vault opened with an authenticated root password.
pub struct Unlocked {
    pub vault: Vault,
    pub root: RootPassword,
}

/// Authenticate the root password, then connect to the credential database.
///
/// Nothing touches the database before the password is verified.
pub fn unlock(cli: &Cli) -> Result<Unlocked> {
    let home = home_dir(cli)?;
    let settings = Settings::load(&home)?;
    let auth = auth_store(&home, &settings);

    if !auth.is_initialized() {
        output::tip("Run `butler init` to set a root password.");
        return Err(ButlerError::NotInitialized(auth.path().to_path_buf()));
    }

    let password = prompt_password()?;
    let root = auth.authenticate(password.as_bytes())?;
    let vault = Vault::connect(&settings.db_config(&home))?;

    Ok(Unlocked { vault, root })
}

/// Get the root password, trying in order:
/// 1. `BUTLER_PASSWORD` env var (scripts)
/// 2. Interactive prompt
///
/// Returns `Zeroizing<String>` so the password is wiped from memory on drop.
pub fn prompt_password() -> Result<Zeroizing<String>> {
    if let Ok(pw) = std::env::var(PASSWORD_ENV) {
        if !pw.is_empty() {
            return Ok(Zeroizing::new(pw));
        }
    }

    let pw = dialoguer::Password::new()
        .with_prompt("Your root password")
        .interact()
        .map_err(|e| ButlerError::CommandFailed(format!("password prompt: {e}")))?;
    Ok(Zeroizing::new(pw))
}

/// Prompt for a new root password with confirmation (used during `init`).
///
/// Also respects `BUTLER_PASSWORD` for scripted usage.
/// Enforces a minimum password length.
pub fn prompt_new_password() -> Result<Zeroizing<String>> {
    if let Ok(pw) = std::env::var(PASSWORD_ENV) {
        if !pw.is_empty() {
            if pw.len() < MIN_PASSWORD_LEN {
                return Err(ButlerError::CommandFailed(format!(
                    "password must be at least {MIN_PASSWORD_LEN} characters"
                )));
            }
            return Ok(Zeroizing::new(pw));
        }
    }

    loop {
        let password = dialoguer::Password::new()
            .with_prompt("Choose root password")
            .with_confirmation("Confirm root password", "Passwords do not match, try again")
            .interact()
            .map_err(|e| ButlerError::CommandFailed(format!("password prompt: {e}")))?;

        if password.len() < MIN_PASSWORD_LEN {
            output::warning(&format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters. Try again."
            ));
            continue;
        }

        return Ok(Zeroizing::new(password));
    }
}

/// Ask a yes/no question, defaulting to "no".
pub fn confirm(prompt: &str) -> Result<bool> {
    dialoguer::Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .map_err(|e| ButlerError::CommandFailed(format!("confirm prompt: {e}")))
}
