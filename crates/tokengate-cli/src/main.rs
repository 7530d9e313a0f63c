mod cli;
mod commands;
mod observability;
mod output;

use anyhow::Result;
use clap::Parser;

use cli::{Cli, Commands, ConfigCommands, PkceCommands};
use output::print_error;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        print_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    observability::init_tracing_with_level(&cli.log_level);

    let format = cli.format.unwrap_or_default();
    let config_path = cli.config.as_deref();

    match &cli.command {
        Commands::Verify(args) => {
            commands::verify::verify(args, config_path, format).await?;
        }
        Commands::Pkce(args) => match &args.command {
            PkceCommands::Challenge { verifier } => commands::pkce::challenge(verifier, format)?,
            PkceCommands::Generate => commands::pkce::generate(format),
        },
        Commands::Config(args) => match &args.command {
            ConfigCommands::Check => commands::config::check(config_path, format)?,
        },
    }

    Ok(())
}
