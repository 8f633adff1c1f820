//! Command-line interface

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Bearer-token gated OAuth credential store backed by AWS Secrets Manager
#[derive(Parser, Debug)]
#[command(name = "token-vault")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file (YAML)
    #[arg(short, long, env = "TOKEN_VAULT_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Host to bind to
    #[arg(long)]
    pub host: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(
        long,
        default_value = "info",
        env = "TOKEN_VAULT_LOG_LEVEL",
        global = true
    )]
    pub log_level: String,

    /// Log format (text, json)
    #[arg(long, env = "TOKEN_VAULT_LOG_FORMAT", global = true)]
    pub log_format: Option<String>,

    /// Subcommand (optional - defaults to server mode)
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the server (default)
    Serve,

    /// Load and validate configuration, print the resolved settings, and exit
    CheckConfig,
}
