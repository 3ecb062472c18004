//! `butler pw`: print the password for a site and username.

use crate::cli::output;
use crate::cli::{unlock, Cli};
use crate::errors::{ButlerError, Result};

/// Execute the `pw` command.
pub fn execute(cli: &Cli, site: &str, username: &str) -> Result<()> {
    let unlocked = unlock(cli)?;

    match unlocked
        .vault
        .retrieve_password(&unlocked.root, site, username)?
    {
        Some(password) => {
            println!("{}", password.as_str());
            Ok(())
        }
        None => {
            output::tip(&format!("Run `butler get {site}` to see stored usernames."));
            Err(ButlerError::NotFound(format!("{username}@{site}")))
        }
    }
}
