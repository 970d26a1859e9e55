use serde::Deserialize;
use std::path::PathBuf;

use super::ServerConfig;

/// Complete YAML configuration structure
///
/// All fields are optional to allow partial configuration. Values present here
/// override environment variables.
///
/// # Example YAML structure
/// ```yaml
/// server:
///   host: "0.0.0.0"
///   port: 3001
///
/// upstream:
///   api_key: "your-gemini-key"
///   base_url: "https://generativelanguage.googleapis.com/v1beta"
///
/// tts:
///   default_model: "gemini-2.5-flash-preview-tts"
///   allowed_models:
///     - "gemini-2.5-flash-preview-tts"
///     - "gemini-2.5-pro-preview-tts"
///   max_retries_per_model: 2
///   request_timeout_seconds: 60
///   max_text_length: 5000
///
/// auth:
///   required: true
///   api_secret: "shared-secret"
///
/// security:
///   cors_allowed_origins: "https://app.example.com"
///   rate_limit_requests_per_second: 60
///   rate_limit_burst_size: 10
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub server: Option<ServerYaml>,
    pub upstream: Option<UpstreamYaml>,
    pub tts: Option<TtsYaml>,
    pub auth: Option<AuthYaml>,
    pub security: Option<SecurityYaml>,
}

/// Server configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ServerYaml {
    pub host: Option<String>,
    pub port: Option<u16>,
}

/// Upstream Gemini API settings from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct UpstreamYaml {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
}

/// Synthesis settings from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TtsYaml {
    pub default_model: Option<String>,
    /// Fallback order follows list order
    pub allowed_models: Option<Vec<String>>,
    pub max_retries_per_model: Option<u32>,
    pub request_timeout_seconds: Option<u64>,
    pub max_text_length: Option<usize>,
}

/// Authentication configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AuthYaml {
    pub required: Option<bool>,
    pub api_secret: Option<String>,
}

/// Security configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SecurityYaml {
    pub cors_allowed_origins: Option<String>,
    pub rate_limit_requests_per_second: Option<u32>,
    pub rate_limit_burst_size: Option<u32>,
}

impl YamlConfig {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    /// Returns an error if:
    /// - The file cannot be read
    /// - The YAML is malformed
    /// - Required fields have invalid types
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file {}: {e}", path.display()))?;

        let config: YamlConfig = serde_yaml::from_str(&contents)
            .map_err(|e| format!("Failed to parse YAML config: {e}"))?;

        Ok(config)
    }

    /// Overwrite every field of `config` that this file sets.
    pub fn apply_to(self, config: &mut ServerConfig) {
        if let Some(server) = self.server {
            if let Some(host) = server.host {
                config.host = host;
            }
            if let Some(port) = server.port {
                config.port = port;
            }
        }

        if let Some(upstream) = self.upstream {
            if upstream.api_key.is_some() {
                config.gemini_api_key = upstream.api_key;
            }
            if let Some(base_url) = upstream.base_url {
                config.gemini_base_url = base_url;
            }
        }

        if let Some(tts) = self.tts {
            if let Some(model) = tts.default_model {
                config.tts_default_model = model.trim().to_string();
            }
            if let Some(models) = tts.allowed_models {
                config.tts_allowed_models = super::env::split_list(&models.join(","));
            }
            if let Some(retries) = tts.max_retries_per_model {
                config.tts_max_retries_per_model = retries;
            }
            if let Some(timeout) = tts.request_timeout_seconds {
                config.tts_request_timeout_seconds = timeout;
            }
            if let Some(max_len) = tts.max_text_length {
                config.tts_max_text_length = max_len;
            }
        }

        if let Some(auth) = self.auth {
            if let Some(required) = auth.required {
                config.auth_required = required;
            }
            if auth.api_secret.is_some() {
                config.auth_api_secret = auth.api_secret;
            }
        }

        if let Some(security) = self.security {
            if security.cors_allowed_origins.is_some() {
                config.cors_allowed_origins = security.cors_allowed_origins;
            }
            if let Some(rps) = security.rate_limit_requests_per_second {
                config.rate_limit_requests_per_second = rps;
            }
            if let Some(burst) = security.rate_limit_burst_size {
                config.rate_limit_burst_size = burst;
            }
        }
    }
}
