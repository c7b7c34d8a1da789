//! Configuration management for ragchat
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.
//! The relay service and the session client share one file but validate
//! only the sections they consume.

use crate::cli::{Cli, Commands};
use crate::error::{RagchatError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;
use std::path::Path;

/// Main configuration structure for ragchat
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Inference provider settings (credentials, region, model)
    #[serde(default)]
    pub provider: ProviderConfig,
    /// Relay service settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Session client settings
    #[serde(default)]
    pub client: ClientConfig,
}

/// Inference provider configuration
///
/// Credentials are usually supplied through `AWS_ACCESS_KEY` and
/// `AWS_SECRET_KEY` rather than written to the config file.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Access key identifier
    #[serde(default)]
    pub access_key: Option<String>,

    /// Secret access key
    #[serde(default)]
    pub secret_key: Option<String>,

    /// Provider region, e.g. `us-east-1`
    #[serde(default)]
    pub region: Option<String>,

    /// Model identifier passed verbatim to the provider
    #[serde(default)]
    pub model_id: Option<String>,
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("access_key", &self.access_key.as_ref().map(|_| "<redacted>"))
            .field("secret_key", &self.secret_key.as_ref().map(|_| "<redacted>"))
            .field("region", &self.region)
            .field("model_id", &self.model_id)
            .finish()
    }
}

/// Relay service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Socket address the HTTP server binds to
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Capacity of the channel between the provider reader and the response body
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

fn default_bind_address() -> String {
    "127.0.0.1:8000".to_string()
}

fn default_channel_capacity() -> usize {
    32
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

/// Session client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Full URL of the relay's streaming endpoint
    #[serde(default = "default_api_url")]
    pub api_url: Option<String>,

    /// Ceiling for connecting and for each wait on the next chunk (seconds)
    #[serde(default = "default_client_timeout")]
    pub timeout_seconds: u64,
}

fn default_api_url() -> Option<String> {
    None
}

fn default_client_timeout() -> u64 {
    30
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            timeout_seconds: default_client_timeout(),
        }
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// A missing file is not an error; required values may come entirely
    /// from the environment. Validation happens separately through
    /// [`Config::validate_server`] or [`Config::validate_client`].
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str, cli: &Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::debug!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| RagchatError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| RagchatError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(access_key) = std::env::var("AWS_ACCESS_KEY") {
            self.provider.access_key = Some(access_key);
        }

        if let Ok(secret_key) = std::env::var("AWS_SECRET_KEY") {
            self.provider.secret_key = Some(secret_key);
        }

        if let Ok(region) = std::env::var("AWS_REGION") {
            tracing::debug!(region = %region, "Env override: AWS_REGION");
            self.provider.region = Some(region);
        }

        if let Ok(model_id) = std::env::var("BEDROCK_MODEL_ID") {
            tracing::debug!(model_id = %model_id, "Env override: BEDROCK_MODEL_ID");
            self.provider.model_id = Some(model_id);
        }

        if let Ok(api_url) = std::env::var("API_URL") {
            tracing::debug!(api_url = %api_url, "Env override: API_URL");
            self.client.api_url = Some(api_url);
        }

        if let Ok(bind) = std::env::var("RAGCHAT_BIND_ADDRESS") {
            self.server.bind_address = bind;
        }

        if let Ok(timeout) = std::env::var("RAGCHAT_CLIENT_TIMEOUT_SECONDS") {
            if let Ok(value) = timeout.parse() {
                self.client.timeout_seconds = value;
            } else {
                tracing::warn!("Invalid RAGCHAT_CLIENT_TIMEOUT_SECONDS: {}", timeout);
            }
        }
    }

    fn apply_cli_overrides(&mut self, cli: &Cli) {
        if cli.verbose {
            tracing::debug!("Verbose mode enabled");
        }

        match &cli.command {
            Commands::Serve { bind: Some(bind) } => {
                self.server.bind_address = bind.clone();
            }
            Commands::Chat {
                api_url: Some(url),
            }
            | Commands::Ask {
                api_url: Some(url),
                ..
            } => {
                self.client.api_url = Some(url.clone());
            }
            _ => {}
        }
    }

    /// Validate the settings the relay service needs
    ///
    /// # Errors
    ///
    /// Returns a configuration error naming the first missing or invalid
    /// setting. Callers treat this as fatal before binding a socket.
    pub fn validate_server(&self) -> Result<()> {
        let required = [
            ("AWS_ACCESS_KEY", &self.provider.access_key),
            ("AWS_SECRET_KEY", &self.provider.secret_key),
            ("AWS_REGION", &self.provider.region),
            ("BEDROCK_MODEL_ID", &self.provider.model_id),
        ];
        for (name, value) in required {
            if value.as_deref().map_or(true, |v| v.trim().is_empty()) {
                return Err(RagchatError::Config(format!("{} is required", name)).into());
            }
        }

        self.server.bind_address.parse::<SocketAddr>().map_err(|e| {
            RagchatError::Config(format!(
                "Invalid bind address {}: {}",
                self.server.bind_address, e
            ))
        })?;

        if self.server.channel_capacity == 0 {
            return Err(RagchatError::Config(
                "server.channel_capacity must be greater than 0".to_string(),
            )
            .into());
        }

        Ok(())
    }

    /// Validate the settings the session client needs
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the relay URL is absent, not an
    /// http(s) URL, or the timeout is zero.
    pub fn validate_client(&self) -> Result<()> {
        let api_url = self
            .client
            .api_url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| RagchatError::Config("API_URL is required".to_string()))?;

        let parsed = url::Url::parse(api_url)
            .map_err(|e| RagchatError::Config(format!("Invalid API_URL {}: {}", api_url, e)))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(RagchatError::Config(format!(
                "API_URL must use http or https, got {}",
                parsed.scheme()
            ))
            .into());
        }

        if self.client.timeout_seconds == 0 {
            return Err(RagchatError::Config(
                "client.timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        Ok(())
    }
}
