//! `butler add`: store a credential for a site.

use std::io::{self, IsTerminal, Read};

use crate::cli::output;
use crate::cli::{unlock, Cli};
use crate::errors::{ButlerError, Result};

/// Execute the `add` command.
pub fn execute(cli: &Cli, site: &str, username: Option<&str>) -> Result<()> {
    // Authenticate first so we never ask for a secret we cannot store.
    let unlocked = unlock(cli)?;

    let username = match username {
        Some(u) => u.to_string(),
        None => dialoguer::Input::<String>::new()
            .with_prompt(format!("Username for {site}"))
            .interact_text()
            .map_err(|e| ButlerError::CommandFailed(format!("input prompt: {e}")))?,
    };

    // The site password comes from a pipe or a hidden prompt, never argv.
    let password = if io::stdin().is_terminal() {
        zeroize::Zeroizing::new(
            dialoguer::Password::new()
                .with_prompt(format!("Password for {username}@{site}"))
                .interact()
                .map_err(|e| ButlerError::CommandFailed(format!("input prompt: {e}")))?,
        )
    } else {
        let mut buf = zeroize::Zeroizing::new(String::new());
        io::stdin().read_to_string(&mut buf)?;
        let trimmed_len = buf.trim_end().len();
        buf.truncate(trimmed_len);
        buf
    };

    if password.is_empty() {
        return Err(ButlerError::CommandFailed("password cannot be empty".into()));
    }

    unlocked
        .vault
        .add(&unlocked.root, site, &username, &password)?;

    output::success(&format!("Stored credential for '{username}' at '{site}'"));
    Ok(())
}
