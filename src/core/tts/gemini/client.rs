//! HTTP transport for the Gemini speech endpoint.
//!
//! The orchestrator only sees the [`GenerationTransport`] capability, so tests
//! can script 429s, malformed payloads and network errors without a socket.
//! [`GeminiHttpTransport`] is the production implementation on `reqwest`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;
use tracing::debug;
use zeroize::Zeroize;

use super::messages::GenerateContentRequest;
use crate::core::tts::SynthesisError;

/// Default Gemini API prefix. The request target is
/// `{base}/models/{model}:generateContent`.
pub const GEMINI_API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "x-goog-api-key";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Default connect timeout in seconds.
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// User-Agent header value for API requests.
const USER_AGENT: &str = concat!("tts-gateway/", env!("CARGO_PKG_VERSION"));

/// Raw upstream reply, before classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamResponse {
    pub status: u16,
    /// Raw `retry-after` header value, if present.
    pub retry_after: Option<String>,
    pub body: String,
}

/// Failures below the HTTP status layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("Request failed: {0}")]
    Network(String),

    #[error("Failed to read response: {0}")]
    Body(String),

    /// The request could not be constructed; no retry can fix it.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl TransportError {
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::InvalidRequest(_))
    }
}

/// Issues one generation call against one model.
#[async_trait]
pub trait GenerationTransport: Send + Sync {
    async fn generate(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<UpstreamResponse, TransportError>;
}

/// `reqwest`-backed transport. The client is reused for connection pooling.
pub struct GeminiHttpTransport {
    http_client: Client,
    base_url: String,
    api_key: String,
}

impl GeminiHttpTransport {
    pub fn new(
        base_url: &str,
        api_key: &str,
        timeout: Duration,
    ) -> Result<Self, SynthesisError> {
        if api_key.trim().is_empty() {
            return Err(SynthesisError::Configuration(
                "Gemini API key is empty".to_string(),
            ));
        }

        let http_client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS))
            .pool_max_idle_per_host(4)
            .pool_idle_timeout(Duration::from_secs(90))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| {
                SynthesisError::Configuration(format!("Failed to create HTTP client: {e}"))
            })?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    /// Full URL for a model.
    pub fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.base_url, model)
    }
}

impl Drop for GeminiHttpTransport {
    fn drop(&mut self) {
        self.api_key.zeroize();
    }
}

#[async_trait]
impl GenerationTransport for GeminiHttpTransport {
    async fn generate(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<UpstreamResponse, TransportError> {
        let url = self.endpoint(model);
        debug!(model = %model, "Sending speech generation request");

        let response = self
            .http_client
            .post(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_builder() {
                    TransportError::InvalidRequest(e.to_string())
                } else {
                    TransportError::Network(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .map(String::from);

        let body = response
            .text()
            .await
            .map_err(|e| TransportError::Body(e.to_string()))?;

        Ok(UpstreamResponse {
            status,
            retry_after,
            body,
        })
    }
}
