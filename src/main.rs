use clap::Parser;
use tracing_subscriber::EnvFilter;

use butler::cli::{Cli, Commands};

fn main() {
    // Diagnostics go to stderr (RUST_LOG=butler=debug for verbose output)
    // so stdout only carries command output such as a retrieved password.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("butler=warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init { force } => butler::cli::commands::init::execute(&cli, force),
        Commands::Add {
            ref site,
            ref username,
        } => butler::cli::commands::add::execute(&cli, site, username.as_deref()),
        Commands::Ls => butler::cli::commands::list::execute(&cli),
        Commands::Get { ref site } => butler::cli::commands::get::execute(&cli, site),
        Commands::Pw {
            ref site,
            ref username,
        } => butler::cli::commands::password::execute(&cli, site, username),
        Commands::Rm {
            ref site,
            ref username,
            force,
        } => butler::cli::commands::remove::execute(&cli, site, username, force),
    };

    if let Err(e) = result {
        butler::cli::output::error(&e.to_string());
        std::process::exit(1);
    }
}
