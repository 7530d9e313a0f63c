use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "tokengate")]
#[command(about = "Tokengate CLI: check client assertions, PKCE values and provider configuration")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Provider configuration file (defaults to ./tokengate.toml when present)
    #[arg(short, long, global = true, env = "TOKENGATE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, env = "TOKENGATE_LOG", default_value = "warn")]
    pub log_level: String,

    /// Output format
    #[arg(short, long, global = true)]
    pub format: Option<OutputFormat>,
}

#[derive(Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Text,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Authenticate a client assertion against registered clients
    Verify(VerifyArgs),
    /// PKCE helpers
    Pkce(PkceArgs),
    /// Inspect provider configuration
    Config(ConfigArgs),
}

#[derive(clap::Args)]
pub struct VerifyArgs {
    /// JSON file with an array of registered clients
    #[arg(long)]
    pub clients: PathBuf,
    /// JSON file with an array of authorizations
    #[arg(long)]
    pub authorizations: Option<PathBuf>,
    /// The client assertion JWT
    #[arg(long)]
    pub assertion: String,
    /// Client identifier (taken from the assertion when omitted)
    #[arg(long)]
    pub client_id: Option<String>,
    /// Grant type of the token request
    #[arg(long, default_value = "client_credentials")]
    pub grant_type: String,
    /// Authorization code being exchanged
    #[arg(long)]
    pub code: Option<String>,
    /// PKCE code verifier
    #[arg(long)]
    pub code_verifier: Option<String>,
}

#[derive(clap::Args)]
pub struct PkceArgs {
    #[command(subcommand)]
    pub command: PkceCommands,
}

#[derive(Subcommand)]
pub enum PkceCommands {
    /// Print the S256 challenge for a verifier
    Challenge {
        /// Code verifier (43-128 unreserved characters)
        verifier: String,
    },
    /// Generate a random verifier and its S256 challenge
    Generate,
}

#[derive(clap::Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Load and validate configuration
    Check,
}
