use url::Url;

use crate::core::tts::gemini::ModelCatalog;

/// Upper bound on retries per model.
pub const MAX_RETRIES_PER_MODEL_LIMIT: u32 = 10;

/// The allowlist must be non-empty and contain the default model.
pub fn validate_model_catalog(default_model: &str, allowed: &[String]) -> Result<(), String> {
    ModelCatalog::new(default_model, allowed)
        .map(|_| ())
        .map_err(|e| format!("Invalid TTS model configuration: {e}"))
}

pub fn validate_retry_budget(max_retries: u32) -> Result<(), String> {
    if max_retries > MAX_RETRIES_PER_MODEL_LIMIT {
        return Err(format!(
            "tts.max_retries_per_model must be at most {MAX_RETRIES_PER_MODEL_LIMIT}, got {max_retries}"
        ));
    }
    Ok(())
}

pub fn validate_positive(name: &str, value: u64) -> Result<(), String> {
    if value == 0 {
        return Err(format!("{name} must be greater than zero"));
    }
    Ok(())
}

/// The upstream base URL must be an absolute http(s) URL.
pub fn validate_base_url(base_url: &str) -> Result<(), String> {
    let url = Url::parse(base_url).map_err(|e| format!("Invalid upstream base URL '{base_url}': {e}"))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(format!(
            "Upstream base URL must use http or https, got '{scheme}'"
        )),
    }
}

/// Validate that auth_required has a secret to check against.
pub fn validate_auth_required(
    auth_required: bool,
    api_secret: &Option<String>,
) -> Result<(), String> {
    if auth_required && api_secret.as_deref().is_none_or(str::is_empty) {
        return Err(
            "Authentication is required but AUTH_API_SECRET is not configured".to_string(),
        );
    }
    Ok(())
}
