//! Model fallback orchestration.
//!
//! One orchestration walks an ordered [`ModelCandidateList`]. Each model gets
//! `max_retries_per_model + 1` strictly sequential attempts; every attempt is
//! classified into an [`AttemptOutcome`]. The first success returns
//! immediately. When every candidate is exhausted the accumulated failures
//! decide between [`SynthesisError::QuotaExhausted`] and
//! [`SynthesisError::UpstreamFailure`].
//!
//! The control flow is an explicit state machine:
//!
//! ```text
//!   TryingModel ──success──────────────────────────────► return audio
//!        │ retryable, attempts left
//!        ▼
//!   ComputingBackoff ──sleep──► TryingModel (same model, attempt + 1)
//!        │
//!   TryingModel ──retryable, budget spent──► TryingModel (next model)
//!        │                                        or Exhausted
//!        └──terminal──────────────────────────────► return error
//! ```

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use tracing::{debug, error, info, warn};

use super::client::{GenerationTransport, TransportError, UpstreamResponse};
use super::config::{GenerationRequest, ModelCandidateList};
use super::messages::{GenerateContentRequest, GenerateContentResponse, retry_delay_from_body};
use crate::core::tts::backoff::{BackoffPolicy, parse_retry_after};
use crate::core::tts::error::{INTERNAL_ERROR_STATUS, SynthesisError, SynthesisResult};
use crate::core::wav::DEFAULT_SAMPLE_RATE;

/// Retries after the first attempt on each model.
pub const DEFAULT_MAX_RETRIES_PER_MODEL: u32 = 2;

/// Upstream error bodies are truncated to this many characters.
pub const MAX_ERROR_BODY_CHARS: usize = 500;

const HTTP_TOO_MANY_REQUESTS: u16 = 429;

/// Raw PCM produced by a successful attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesizedAudio {
    pub pcm: Vec<u8>,
    pub model: String,
    pub sample_rate: u32,
}

/// Classification of a single upstream call.
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome {
    Success(SynthesizedAudio),
    RetryableFailure {
        reason: String,
        status: Option<u16>,
        retry_after_secs: Option<f64>,
        rate_limited: bool,
    },
    TerminalFailure {
        reason: String,
        status: u16,
    },
}

impl AttemptOutcome {
    fn retryable(reason: impl Into<String>, status: Option<u16>) -> Self {
        Self::RetryableFailure {
            reason: reason.into(),
            status,
            retry_after_secs: None,
            rate_limited: false,
        }
    }
}

/// Classify the result of one transport call for `model`.
pub fn classify(model: &str, result: Result<UpstreamResponse, TransportError>) -> AttemptOutcome {
    let response = match result {
        Ok(response) => response,
        Err(e) if e.is_retryable() => return AttemptOutcome::retryable(e.to_string(), None),
        Err(e) => {
            return AttemptOutcome::TerminalFailure {
                reason: e.to_string(),
                status: INTERNAL_ERROR_STATUS,
            };
        }
    };

    let status = response.status;

    if status == HTTP_TOO_MANY_REQUESTS {
        let retry_after_secs = response
            .retry_after
            .as_deref()
            .and_then(parse_retry_after)
            .or_else(|| retry_delay_from_body(&response.body));
        return AttemptOutcome::RetryableFailure {
            reason: format!("Rate limited: {}", truncate_body(&response.body)),
            status: Some(status),
            retry_after_secs,
            rate_limited: true,
        };
    }

    if !(200..300).contains(&status) {
        return AttemptOutcome::retryable(
            format!("HTTP {status}: {}", truncate_body(&response.body)),
            Some(status),
        );
    }

    let parsed: GenerateContentResponse = match serde_json::from_str(&response.body) {
        Ok(parsed) => parsed,
        Err(e) => {
            return AttemptOutcome::retryable(format!("Failed to parse response: {e}"), None);
        }
    };

    let Some(inline) = parsed.audio() else {
        return AttemptOutcome::retryable("no audio data", None);
    };

    match BASE64.decode(inline.data.as_bytes()) {
        Ok(pcm) => AttemptOutcome::Success(SynthesizedAudio {
            pcm,
            model: model.to_string(),
            sample_rate: inline.sample_rate().unwrap_or(DEFAULT_SAMPLE_RATE),
        }),
        Err(e) => AttemptOutcome::retryable(format!("Invalid base64 audio data: {e}"), None),
    }
}

/// Cut a body to [`MAX_ERROR_BODY_CHARS`] characters.
pub fn truncate_body(body: &str) -> String {
    body.chars().take(MAX_ERROR_BODY_CHARS).collect()
}

// =============================================================================
// State machine
// =============================================================================

/// Orchestration states.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OrchestratorState {
    TryingModel { index: usize, attempt: u32 },
    ComputingBackoff { index: usize, attempt: u32, hint: Option<f64> },
    Exhausted,
}

impl OrchestratorState {
    pub fn start() -> Self {
        Self::TryingModel {
            index: 0,
            attempt: 0,
        }
    }

    /// Next state after a retryable failure on `(index, attempt)`.
    pub fn after_retryable(
        index: usize,
        attempt: u32,
        hint: Option<f64>,
        max_retries: u32,
        candidate_count: usize,
    ) -> Self {
        if attempt < max_retries {
            Self::ComputingBackoff {
                index,
                attempt,
                hint,
            }
        } else if index + 1 < candidate_count {
            Self::TryingModel {
                index: index + 1,
                attempt: 0,
            }
        } else {
            Self::Exhausted
        }
    }
}

/// Failure bookkeeping scoped to one orchestration.
#[derive(Debug, Default)]
struct FailureAccumulator {
    last_error: Option<String>,
    last_status: Option<u16>,
    rate_limited: bool,
    min_retry_after: Option<f64>,
}

impl FailureAccumulator {
    fn record(&mut self, reason: &str, status: Option<u16>, retry_after: Option<f64>, rate_limited: bool) {
        self.last_error = Some(reason.to_string());
        if status.is_some() {
            self.last_status = status;
        }
        if rate_limited {
            self.rate_limited = true;
            if let Some(hint) = retry_after {
                self.min_retry_after = Some(match self.min_retry_after {
                    Some(current) => current.min(hint),
                    None => hint,
                });
            }
        }
    }

    fn into_error(self) -> SynthesisError {
        if self.rate_limited {
            let retry_after_secs = self
                .min_retry_after
                .map(|secs| (secs.ceil() as u64).max(1));
            return SynthesisError::QuotaExhausted { retry_after_secs };
        }

        SynthesisError::UpstreamFailure {
            status: self.last_status.unwrap_or(INTERNAL_ERROR_STATUS),
            message: self
                .last_error
                .unwrap_or_else(|| "All candidate models failed".to_string()),
        }
    }
}

/// Sequential multi-model fallback with bounded retries.
#[derive(Clone)]
pub struct FallbackOrchestrator {
    transport: Arc<dyn GenerationTransport>,
    policy: BackoffPolicy,
    max_retries_per_model: u32,
}

impl FallbackOrchestrator {
    pub fn new(transport: Arc<dyn GenerationTransport>) -> Self {
        Self {
            transport,
            policy: BackoffPolicy::default(),
            max_retries_per_model: DEFAULT_MAX_RETRIES_PER_MODEL,
        }
    }

    pub fn with_policy(mut self, policy: BackoffPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_max_retries(mut self, max_retries_per_model: u32) -> Self {
        self.max_retries_per_model = max_retries_per_model;
        self
    }

    /// Try `candidates` in order until one model returns audio.
    pub async fn synthesize(
        &self,
        request: &GenerationRequest,
        candidates: &ModelCandidateList,
    ) -> SynthesisResult<SynthesizedAudio> {
        let body = GenerateContentRequest::from(request);
        debug_assert!(!candidates.is_empty(), "candidate list always has a lead model");
        let models = candidates.as_slice();
        let mut failures = FailureAccumulator::default();
        let mut state = OrchestratorState::start();
        let mut calls = 0u32;

        info!(
            candidates = models.len(),
            first = %candidates.first(),
            max_retries = self.max_retries_per_model,
            "Starting speech synthesis"
        );

        loop {
            state = match state {
                OrchestratorState::TryingModel { index, attempt } => {
                    let model = &models[index];
                    calls += 1;
                    let result = self.transport.generate(model, &body).await;

                    match classify(model, result) {
                        AttemptOutcome::Success(audio) => {
                            info!(
                                model = %audio.model,
                                attempt,
                                calls,
                                bytes = audio.pcm.len(),
                                "Speech synthesis succeeded"
                            );
                            return Ok(audio);
                        }
                        AttemptOutcome::RetryableFailure {
                            reason,
                            status,
                            retry_after_secs,
                            rate_limited,
                        } => {
                            warn!(
                                model = %model,
                                attempt,
                                status = ?status,
                                rate_limited,
                                "Speech attempt failed: {}",
                                reason
                            );
                            failures.record(&reason, status, retry_after_secs, rate_limited);
                            OrchestratorState::after_retryable(
                                index,
                                attempt,
                                retry_after_secs,
                                self.max_retries_per_model,
                                models.len(),
                            )
                        }
                        AttemptOutcome::TerminalFailure { reason, status } => {
                            error!(model = %model, status, "Speech attempt failed terminally: {}", reason);
                            return Err(SynthesisError::UpstreamFailure {
                                status,
                                message: reason,
                            });
                        }
                    }
                }
                OrchestratorState::ComputingBackoff {
                    index,
                    attempt,
                    hint,
                } => {
                    let delay = self.policy.delay(attempt, hint);
                    debug!(
                        model = %models[index],
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        from_server_hint = hint.is_some(),
                        "Backing off before retry"
                    );
                    tokio::time::sleep(delay).await;
                    OrchestratorState::TryingModel {
                        index,
                        attempt: attempt + 1,
                    }
                }
                OrchestratorState::Exhausted => {
                    let err = failures.into_error();
                    error!(calls, "All candidate models exhausted: {}", err);
                    return Err(err);
                }
            };
        }
    }
}
