//! `butler ls`: display all sites in a table.

use crate::cli::output;
use crate::cli::{unlock, Cli};
use crate::errors::Result;

/// Execute the `ls` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let unlocked = unlock(cli)?;
    let sites = unlocked.vault.list_sites()?;

    output::info(&format!("{} site(s)", sites.len()));
    output::print_sites_table(&sites);

    Ok(())
}
