use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;
use url::Url;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub kg: KgConfig,
}

/// Knowledge-graph API configuration
///
/// Replaces the usual pile of globals (base URL, token, shared header map)
/// with one immutable value constructed up front, so multiple independently
/// configured clients can coexist and tests can inject their own.
#[derive(Debug, Clone, Deserialize)]
pub struct KgConfig {
    /// API root, e.g. `https://core.kg.ebrains.eu/v3/`. Must end with `/`.
    pub base_url: String,
    /// Name of the environment variable holding the bearer token.
    #[serde(default = "default_token_env")]
    pub token_env: String,
    /// Publication stage selecting which record versions are visible.
    #[serde(default = "default_stage")]
    pub stage: String,
    /// Optional space restriction for queries (`restrictToSpaces`).
    #[serde(default)]
    pub space: Option<String>,
    /// Fixed page size for query results.
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_token_env() -> String {
    "KG_AUTH_TOKEN".to_string()
}

fn default_stage() -> String {
    "RELEASED".to_string()
}

fn default_page_size() -> usize {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from file
    ///
    /// Loads environment variables from .env file (if present) before loading config.
    /// Looks for config file in this order:
    /// 1. Path specified in KGCLIENT_CONFIG environment variable
    /// 2. ./config.toml in current directory
    pub fn load() -> Result<Self> {
        // Load .env file if it exists (ignore errors - file is optional)
        let _ = dotenv::dotenv();

        let config_path = std::env::var("KGCLIENT_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config.toml"));

        let config_str = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let config: Config = toml::from_str(&config_str)
            .context("Failed to parse config.toml")?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        Url::parse(&self.kg.base_url)
            .with_context(|| format!("kg.base_url is not a valid URL: {}", self.kg.base_url))?;

        if !self.kg.base_url.ends_with('/') {
            anyhow::bail!(
                "kg.base_url must end with a trailing slash: {}",
                self.kg.base_url
            );
        }

        if self.kg.page_size == 0 {
            anyhow::bail!("kg.page_size must be greater than 0");
        }

        // Check both environment variable and .env file (dotenv already loaded in Config::load)
        std::env::var(&self.kg.token_env)
            .with_context(|| {
                format!(
                    "Environment variable {} not set. Set it in your .env file or as an environment variable with your bearer token.",
                    self.kg.token_env
                )
            })?;

        Ok(())
    }

    /// Read the bearer token from the configured environment variable
    pub fn token(&self) -> Result<String> {
        std::env::var(&self.kg.token_env)
            .with_context(|| format!("Environment variable {} not set", self.kg.token_env))
    }
}
