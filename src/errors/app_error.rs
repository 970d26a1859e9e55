//! HTTP-facing error type.
//!
//! Every failure that reaches a handler is converted into a JSON body of the
//! form `{"error": <kind>, "message": <text>, ...}` with a matching status.

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::core::tts::SynthesisError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Synthesis(#[from] SynthesisError),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Synthesis(err) => match err {
                SynthesisError::InvalidInput(_) => StatusCode::BAD_REQUEST,
                SynthesisError::QuotaExhausted { .. } => StatusCode::TOO_MANY_REQUESTS,
                SynthesisError::UpstreamFailure { .. } => StatusCode::BAD_GATEWAY,
                SynthesisError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn body(&self) -> serde_json::Value {
        match self {
            Self::Unauthorized(message) => json!({
                "error": "unauthorized",
                "message": message,
            }),
            Self::Synthesis(err) => {
                let mut body = json!({
                    "error": err.kind(),
                    "message": err.to_string(),
                });
                match err {
                    SynthesisError::QuotaExhausted {
                        retry_after_secs: Some(secs),
                    } => {
                        body["retry_after_seconds"] = json!(secs);
                    }
                    SynthesisError::UpstreamFailure { status, .. } => {
                        body["upstream_status"] = json!(status);
                    }
                    _ => {}
                }
                body
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let mut response = (status, Json(self.body())).into_response();

        if let Self::Synthesis(SynthesisError::QuotaExhausted {
            retry_after_secs: Some(secs),
        }) = &self
        {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(*secs));
        }

        response
    }
}
