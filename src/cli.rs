//! Command-line interface definition for ragchat
//!
//! This module defines the CLI structure using clap's derive API. One binary
//! hosts both tiers: `serve` runs the relay service, `chat` and `ask` run the
//! session client against it.

use clap::{Parser, Subcommand};

/// ragchat - streaming chat relay and terminal client
///
/// Relay user queries to a hosted inference model and stream the answer
/// back as it is generated.
#[derive(Parser, Debug, Clone)]
#[command(name = "ragchat")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for ragchat
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run the relay service
    Serve {
        /// Override the bind address from config (e.g. 0.0.0.0:8000)
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Start the interactive multi-session chat client
    Chat {
        /// Override the relay endpoint URL (defaults to API_URL)
        #[arg(short, long)]
        api_url: Option<String>,
    },

    /// Send one query and stream the answer to stdout
    Ask {
        /// The question to send
        query: String,

        /// Override the relay endpoint URL (defaults to API_URL)
        #[arg(short, long)]
        api_url: Option<String>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Whether the selected command serves requests rather than talking to a user
    pub fn is_server(&self) -> bool {
        matches!(self.command, Commands::Serve { .. })
    }
}
