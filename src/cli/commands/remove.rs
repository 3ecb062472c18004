//! `butler rm`: remove a credential.

use crate::cli::output;
use crate::cli::{confirm, unlock, Cli};
use crate::errors::Result;

/// Execute the `rm` command.
pub fn execute(cli: &Cli, site: &str, username: &str, force: bool) -> Result<()> {
    // Unless --force is set, ask for confirmation before deleting.
    if !force && !confirm(&format!("Remove credential '{username}' at '{site}'?"))? {
        output::info("Cancelled.");
        return Ok(());
    }

    let unlocked = unlock(cli)?;

    if unlocked.vault.remove(&unlocked.root, site, username)? {
        output::success(&format!("Removed credential '{username}' at '{site}'"));
    } else {
        output::warning(&format!("No credential '{username}' at '{site}', nothing removed"));
    }

    Ok(())
}
