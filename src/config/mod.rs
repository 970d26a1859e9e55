//! Configuration module for the TTS gateway
//!
//! This module handles server configuration from various sources: .env files, YAML files,
//! and environment variables. Priority: YAML > ENV vars > .env values > defaults.
//!
//! # Modules
//! - `yaml`: YAML configuration file loading and overrides
//! - `env`: Environment variable loading
//! - `validation`: Configuration validation logic
//!
//! # Example
//! ```rust,no_run
//! use tts_gateway::config::ServerConfig;
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load from environment variables only
//! let config = ServerConfig::from_env()?;
//!
//! // Load from YAML file with environment variable overrides
//! let config_path = PathBuf::from("config.yaml");
//! let config = ServerConfig::from_file(&config_path)?;
//!
//! println!("Server listening on {}", config.address());
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;
use std::time::Duration;

mod env;
mod validation;
mod yaml;

use crate::core::tts::gemini::{
    DEFAULT_MAX_RETRIES_PER_MODEL, DEFAULT_TIMEOUT_SECS, GEMINI_API_BASE_URL,
    GEMINI_FLASH_TTS_MODEL, GEMINI_PRO_TTS_MODEL, ModelCatalog,
};

pub use validation::MAX_RETRIES_PER_MODEL_LIMIT;

/// Default maximum length of input text, in characters.
pub const DEFAULT_MAX_TEXT_LENGTH: usize = 5_000;

/// Server configuration
///
/// Contains all configuration needed to run the gateway, including:
/// - Server settings (host, port)
/// - Upstream Gemini API settings
/// - Synthesis settings (model allowlist, retry budget, limits)
/// - Authentication settings
/// - Security settings (CORS, rate limiting)
///
/// Built once at startup and shared read-only afterwards.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    // Server settings
    pub host: String,
    pub port: u16,

    // Upstream settings
    /// Gemini API key, sent as `x-goog-api-key`
    pub gemini_api_key: Option<String>,
    /// Endpoint prefix; requests go to `{base}/models/{model}:generateContent`
    pub gemini_base_url: String,

    // Synthesis settings
    pub tts_default_model: String,
    /// Allowed models in fallback order
    pub tts_allowed_models: Vec<String>,
    pub tts_max_retries_per_model: u32,
    pub tts_request_timeout_seconds: u64,
    /// Maximum input text length in characters
    pub tts_max_text_length: usize,

    // Authentication configuration
    pub auth_api_secret: Option<String>,
    pub auth_required: bool,

    // Security configuration
    /// CORS allowed origins (comma-separated list or "*" for all)
    /// Default: None (CORS disabled, same-origin only)
    pub cors_allowed_origins: Option<String>,

    // Rate limiting configuration
    /// Maximum requests per second per IP address
    /// Default: 60
    pub rate_limit_requests_per_second: u32,
    /// Maximum burst size for rate limiting
    /// Default: 10
    pub rate_limit_burst_size: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
            gemini_api_key: None,
            gemini_base_url: GEMINI_API_BASE_URL.to_string(),
            tts_default_model: GEMINI_FLASH_TTS_MODEL.to_string(),
            tts_allowed_models: vec![
                GEMINI_FLASH_TTS_MODEL.to_string(),
                GEMINI_PRO_TTS_MODEL.to_string(),
            ],
            tts_max_retries_per_model: DEFAULT_MAX_RETRIES_PER_MODEL,
            tts_request_timeout_seconds: DEFAULT_TIMEOUT_SECS,
            tts_max_text_length: DEFAULT_MAX_TEXT_LENGTH,
            auth_api_secret: None,
            auth_required: false,
            cors_allowed_origins: None,
            rate_limit_requests_per_second: 60,
            rate_limit_burst_size: 10,
        }
    }
}

/// Zeroize secret fields when the configuration is dropped.
impl Drop for ServerConfig {
    fn drop(&mut self) {
        use zeroize::Zeroize;

        if let Some(ref mut key) = self.gemini_api_key {
            key.zeroize();
        }
        if let Some(ref mut secret) = self.auth_api_secret {
            secret.zeroize();
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// The .env file is loaded in main.rs before this is called, so its values
    /// are visible here as ordinary environment variables.
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        let config = env::load_from_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file with environment variable base
    ///
    /// Priority order (highest to lowest):
    /// 1. YAML file values
    /// 2. Environment variables (actual ENV vars override .env values)
    /// 3. .env file values
    /// 4. Default values
    ///
    /// # Errors
    /// Returns an error if:
    /// - The YAML file cannot be read or is malformed
    /// - Environment variables have invalid formats
    /// - Configuration validation fails
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let yaml_config = yaml::YamlConfig::from_file(path)?;

        let mut config = env::load_from_env()?;
        yaml_config.apply_to(&mut config);

        config.validate()?;
        Ok(config)
    }

    /// Run every validation rule against this configuration.
    pub fn validate(&self) -> Result<(), Box<dyn std::error::Error>> {
        validation::validate_model_catalog(&self.tts_default_model, &self.tts_allowed_models)?;
        validation::validate_retry_budget(self.tts_max_retries_per_model)?;
        validation::validate_positive("tts.request_timeout_seconds", self.tts_request_timeout_seconds)?;
        validation::validate_positive("tts.max_text_length", self.tts_max_text_length as u64)?;
        validation::validate_base_url(&self.gemini_base_url)?;
        validation::validate_auth_required(self.auth_required, &self.auth_api_secret)?;
        Ok(())
    }

    /// Get the server address as a string
    ///
    /// Returns the address in the format "host:port"
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check if shared-secret authentication is configured
    pub fn has_api_secret_auth(&self) -> bool {
        self.auth_api_secret
            .as_deref()
            .is_some_and(|secret| !secret.is_empty())
    }

    /// Build the model catalog from the configured allowlist.
    pub fn model_catalog(&self) -> Result<ModelCatalog, String> {
        ModelCatalog::new(&self.tts_default_model, &self.tts_allowed_models)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.tts_request_timeout_seconds)
    }
}
