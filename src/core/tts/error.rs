use thiserror::Error;

/// Status reported when an orchestration fails without ever seeing an
/// upstream HTTP status.
pub const INTERNAL_ERROR_STATUS: u16 = 500;

/// Terminal outcomes of a synthesis request.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SynthesisError {
    /// Caller input failed validation. Never retried.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Every candidate model was throttled.
    #[error("Quota exhausted on all candidate models")]
    QuotaExhausted {
        /// Smallest server-advertised retry delay, rounded up, at least 1s.
        retry_after_secs: Option<u64>,
    },

    /// Every candidate failed for reasons other than throttling.
    #[error("Upstream failure ({status}): {message}")]
    UpstreamFailure { status: u16, message: String },

    /// The gateway itself is not set up to synthesize.
    #[error("Invalid configuration: {0}")]
    Configuration(String),
}

/// Result type for synthesis operations.
pub type SynthesisResult<T> = Result<T, SynthesisError>;

impl SynthesisError {
    /// Machine-readable error kind for API responses.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::QuotaExhausted { .. } => "quota_exhausted",
            Self::UpstreamFailure { .. } => "upstream_failure",
            Self::Configuration(_) => "configuration",
        }
    }
}
