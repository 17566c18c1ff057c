//! Provider configuration.
//!
//! This module provides TOML-based configuration for the provider clients.
//! The configuration system supports:
//! - Bundled defaults (include_str! from resources/fabula.toml)
//! - User overrides (./fabula.toml or ~/.config/fabula/fabula.toml)
//! - Automatic merging with user values taking precedence
//!
//! API keys are deliberately kept out of the TOML layer; they come from the
//! environment ([`openai_api_key`], [`replicate_api_token`]).

use config::{Config, File, FileFormat};
use fabula_error::{ConfigError, FabulaError, FabulaResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// OpenAI client settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct OpenAiConfig {
    /// Base URL for the OpenAI API
    pub api_base: String,
    /// Chat model for Stage-1 page structures and character inference
    pub chat_model: String,
    /// Image model for Stage-2 illustrations
    pub image_model: String,
    /// Token ceiling for a single page's JSON structure
    pub max_tokens: u32,
    /// Token ceiling for character inference
    pub inference_max_tokens: u32,
}

/// Replicate client settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ReplicateConfig {
    /// Base URL for the Replicate API
    pub api_base: String,
    /// Model to run predictions against
    pub model: String,
    /// Seconds to sleep between prediction polls
    pub poll_interval_secs: u64,
    /// Poll budget before giving up on a pending prediction
    pub max_polls: u32,
}

/// Transient-failure retry settings shared by all clients.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct RetryConfig {
    /// Whether transient failures are retried at all
    pub enabled: bool,
    /// Additional attempts after the first failure
    pub max_retries: u32,
    /// Initial backoff delay in milliseconds
    pub initial_backoff_ms: u64,
    /// Ceiling on any single backoff delay, in seconds
    pub max_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_retries: 3,
            initial_backoff_ms: 500,
            max_delay_secs: 30,
        }
    }
}

/// Top-level provider configuration.
///
/// # Example
///
/// ```no_run
/// use fabula_models::ProviderConfig;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ProviderConfig::load()?;
/// println!("chat model: {}", config.openai.chat_model);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ProviderConfig {
    /// OpenAI settings
    pub openai: OpenAiConfig,
    /// Replicate settings
    pub replicate: ReplicateConfig,
    /// Retry settings
    #[serde(default)]
    pub retry: RetryConfig,
}

impl ProviderConfig {
    /// Load configuration with precedence: user override > bundled default.
    ///
    /// Configuration sources in order of precedence (later sources override
    /// earlier):
    /// 1. Bundled defaults (resources/fabula.toml shipped with the crate)
    /// 2. User config in home directory (~/.config/fabula/fabula.toml)
    /// 3. User config in current directory (./fabula.toml)
    ///
    /// User config files are optional and silently skipped if not found.
    #[instrument]
    pub fn load() -> FabulaResult<Self> {
        debug!("Loading provider configuration");

        // Bundled default configuration
        const DEFAULT_CONFIG: &str = include_str!("../resources/fabula.toml");

        let mut builder = Config::builder()
            // Start with bundled defaults
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        // Add user config from home directory (optional)
        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config/fabula/fabula.toml");
            builder = builder.add_source(File::from(home_config).required(false));
        }

        // Add user config from current directory (optional, highest precedence)
        builder = builder.add_source(File::with_name("fabula").required(false));

        builder
            .build()
            .map_err(|e| {
                FabulaError::from(ConfigError::new(format!(
                    "Failed to build configuration: {}",
                    e
                )))
            })?
            .try_deserialize()
            .map_err(|e| {
                FabulaError::from(ConfigError::new(format!(
                    "Failed to parse configuration: {}",
                    e
                )))
            })
    }
}

/// Read the OpenAI API key from the environment.
///
/// The placeholder value from a freshly copied .env template is rejected the
/// same as a missing key, so a half-configured environment fails before any
/// network call.
pub fn openai_api_key() -> FabulaResult<String> {
    read_key("OPENAI_API_KEY")
}

/// Read the Replicate API token from the environment.
pub fn replicate_api_token() -> FabulaResult<String> {
    read_key("REPLICATE_API_TOKEN")
}

fn read_key(var: &str) -> FabulaResult<String> {
    match std::env::var(var) {
        Ok(value) if !value.trim().is_empty() && value != "YOUR_API_KEY_HERE" => Ok(value),
        _ => Err(ConfigError::new(format!(
            "{var} not set; add it to the environment or a .env file"
        ))
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_defaults_parse() {
        const DEFAULT_CONFIG: &str = include_str!("../resources/fabula.toml");
        let config: ProviderConfig = toml::from_str(DEFAULT_CONFIG).unwrap();
        assert_eq!(config.openai.image_model, "gpt-image-1");
        assert_eq!(config.replicate.poll_interval_secs, 2);
        assert!(config.retry.enabled);
    }
}
