//! `butler init`: provision the database and set the root password.

use crate::cli::output;
use crate::cli::{auth_store, confirm, home_dir, prompt_new_password, Cli};
use crate::config::Settings;
use crate::db::{Database, SqliteDatabase};
use crate::errors::Result;
use crate::fsutil;

/// Execute the `init` command.
pub fn execute(cli: &Cli, force: bool) -> Result<()> {
    let home = home_dir(cli)?;

    // 1. Create the home directory and a default config if missing.
    if !home.exists() {
        fsutil::ensure_private_dir(&home)?;
        output::info(&format!("Created Butler home: {}", home.display()));
    }
    if !home.join(Settings::FILE_NAME).exists() {
        let path = Settings::default().save(&home)?;
        output::info(&format!("Wrote default config to {}", path.display()));
    }
    let settings = Settings::load(&home)?;

    // 2. Make sure the credential table exists.
    let db = SqliteDatabase::connect(&settings.db_config(&home))?;
    db.install_schema()?;
    output::success(&format!("Credential database ready at {}", db.path().display()));

    // 3. Set the root password, asking before replacing an existing one.
    let auth = auth_store(&home, &settings);
    if auth.is_initialized() {
        if !force {
            let proceed = confirm(
                "A root password already exists. Replace it? Stored credentials will become unreadable.",
            )?;
            if !proceed {
                output::info("Cancelled. Existing root password kept.");
                return Ok(());
            }
        }

        let password = prompt_new_password()?;
        auth.reinitialize(password.as_bytes())?;
        output::warning("Root password replaced.");
    } else {
        let password = prompt_new_password()?;
        auth.initialize(password.as_bytes())?;
        output::success("Root password initialized.");
    }

    output::tip("Run `butler add <SITE>` to store a credential.");
    output::tip("Run `butler ls` to see all sites.");

    Ok(())
}
