//! ragchat - streaming chat relay and terminal client
//!
#![doc = "ragchat - streaming chat relay and terminal client"]
#![doc = "Main entry point for the ragchat application."]

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ragchat::cli::{Cli, Commands};
use ragchat::commands;
use ragchat::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize tracing
    init_tracing(&cli);

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    // Validate only what the selected role needs
    if cli.is_server() {
        config.validate_server()?;
    } else {
        config.validate_client()?;
    }

    // Execute command
    match cli.command {
        Commands::Serve { .. } => commands::serve::run_serve(config).await?,
        Commands::Chat { .. } => commands::chat::run_chat(config).await?,
        Commands::Ask { query, .. } => commands::ask::run_ask(config, query).await?,
    }

    Ok(())
}

/// Initialize tracing subscriber with environment filter
///
/// `RUST_LOG` wins. Otherwise the service logs at info and the interactive
/// commands at warn so logs do not interleave with the conversation.
fn init_tracing(cli: &Cli) {
    let default_filter = if cli.verbose {
        "ragchat=debug,tower_http=debug"
    } else if cli.is_server() {
        "ragchat=info,tower_http=info"
    } else {
        "ragchat=warn"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let json_layer = cli.json_logs.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
    });
    let text_layer = (!cli.json_logs).then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_writer(std::io::stderr)
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .init();
}
