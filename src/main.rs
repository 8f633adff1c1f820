//! token-vault - OAuth credential store gated by RS256 bearer tokens

use std::process::ExitCode;

use clap::Parser;
use tracing::{debug, error, info};

use token_vault::{
    cli::{Cli, Command},
    config::{Config, KeyBackend},
    server::Server,
    setup_tracing,
};

#[tokio::main]
async fn main() -> ExitCode {
    // .env must be loaded before clap reads env-backed flags
    let dotenv = dotenvy::dotenv();

    let cli = Cli::parse();

    if let Err(e) = setup_tracing(&cli.log_level, cli.log_format.as_deref()) {
        eprintln!("Failed to setup tracing: {e}");
        return ExitCode::FAILURE;
    }

    match dotenv {
        Ok(path) => debug!(path = %path.display(), "Loaded .env"),
        Err(e) => debug!(error = %e, "No .env loaded"),
    }

    match cli.command {
        Some(Command::CheckConfig) => check_config(&cli),
        Some(Command::Serve) | None => run_server(&cli).await,
    }
}

fn load_config(cli: &Cli) -> token_vault::Result<Config> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(ref host) = cli.host {
        config.server.host = host.clone();
    }
    Ok(config)
}

/// Validate configuration and print the resolved settings
fn check_config(cli: &Cli) -> ExitCode {
    let config = match load_config(cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {e}");
            return ExitCode::FAILURE;
        }
    };

    println!("✅ Configuration is valid\n");
    println!("Server:");
    println!("  listen:        {}:{}", config.server.host, config.server.port);
    println!("  max body size: {} bytes", config.server.max_body_size);
    println!("Secrets:");
    println!("  backend:       {:?}", config.secrets.backend);
    println!("  root domain:   {}", config.secrets.root_domain);
    println!("Key:");
    println!("  backend:       {:?}", config.key.backend);
    match config.key.backend {
        KeyBackend::Kms => println!("  key id:        {}", config.key.key_id),
        KeyBackend::File => {
            if let Some(path) = &config.key.public_key_file {
                println!("  file:          {}", path.display());
            }
        }
    }
    println!("Auth:");
    println!("  leeway:        {}s", config.auth.leeway_secs);
    if !config.auth.audiences.is_empty() {
        println!("  audiences:     {}", config.auth.audiences.join(", "));
    }
    if let Some(region) = &config.aws.region {
        println!("AWS region:      {region}");
    }
    if let Some(endpoint) = &config.aws.endpoint_url {
        println!("AWS endpoint:    {endpoint}");
    }

    ExitCode::SUCCESS
}

/// Run the server
async fn run_server(cli: &Cli) -> ExitCode {
    let config = match load_config(cli) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    info!(
        version = env!("CARGO_PKG_VERSION"),
        port = config.server.port,
        secrets = ?config.secrets.backend,
        key = ?config.key.backend,
        "Starting token-vault"
    );

    let server = match Server::new(config).await {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to start server: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = server.run().await {
        error!("Server error: {e}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
