//! `butler get`: print the usernames stored for a site.

use crate::cli::output;
use crate::cli::{unlock, Cli};
use crate::errors::Result;

/// Execute the `get` command.
pub fn execute(cli: &Cli, site: &str) -> Result<()> {
    let unlocked = unlock(cli)?;
    let usernames = unlocked.vault.retrieve_usernames(&unlocked.root, site)?;

    if usernames.is_empty() {
        output::warning(&format!("No credentials stored for '{site}'"));
        return Ok(());
    }

    for username in usernames {
        println!("{username}");
    }

    Ok(())
}
