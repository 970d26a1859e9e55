use std::env;
use std::str::FromStr;

use super::ServerConfig;

/// Load configuration from environment variables, falling back to defaults.
pub(super) fn load_from_env() -> Result<ServerConfig, Box<dyn std::error::Error>> {
    let mut config = ServerConfig::default();

    if let Some(host) = env_string("HOST") {
        config.host = host;
    }
    if let Some(port) = env_parse("PORT")? {
        config.port = port;
    }

    config.gemini_api_key = env_string("GEMINI_API_KEY");
    if let Some(base_url) = env_string("GEMINI_API_BASE_URL") {
        config.gemini_base_url = base_url;
    }

    if let Some(model) = env_string("TTS_DEFAULT_MODEL") {
        config.tts_default_model = model;
    }
    if let Some(models) = env_string("TTS_ALLOWED_MODELS") {
        config.tts_allowed_models = split_list(&models);
    }
    if let Some(retries) = env_parse("TTS_MAX_RETRIES_PER_MODEL")? {
        config.tts_max_retries_per_model = retries;
    }
    if let Some(timeout) = env_parse("TTS_REQUEST_TIMEOUT_SECONDS")? {
        config.tts_request_timeout_seconds = timeout;
    }
    if let Some(max_len) = env_parse("TTS_MAX_TEXT_LENGTH")? {
        config.tts_max_text_length = max_len;
    }

    config.auth_api_secret = env_string("AUTH_API_SECRET");
    if let Some(required) = env_string("AUTH_REQUIRED") {
        config.auth_required = parse_bool("AUTH_REQUIRED", &required)?;
    }

    config.cors_allowed_origins = env_string("CORS_ALLOWED_ORIGINS");
    if let Some(rps) = env_parse("RATE_LIMIT_REQUESTS_PER_SECOND")? {
        config.rate_limit_requests_per_second = rps;
    }
    if let Some(burst) = env_parse("RATE_LIMIT_BURST_SIZE")? {
        config.rate_limit_burst_size = burst;
    }

    Ok(config)
}

/// Non-empty, trimmed value of an environment variable.
fn env_string(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_parse<T>(name: &str) -> Result<Option<T>, String>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    env_string(name)
        .map(|raw| {
            raw.parse::<T>()
                .map_err(|e| format!("Invalid value for {name} ('{raw}'): {e}"))
        })
        .transpose()
}

pub(super) fn parse_bool(name: &str, value: &str) -> Result<bool, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => Err(format!("Invalid boolean for {name}: '{other}'")),
    }
}

/// Split a comma-separated list, dropping blanks and duplicates.
pub(super) fn split_list(raw: &str) -> Vec<String> {
    let mut items: Vec<String> = Vec::new();
    for item in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        if !items.iter().any(|existing| existing == item) {
            items.push(item.to_string());
        }
    }
    items
}
