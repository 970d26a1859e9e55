use crate::errors::AppError;
use crate::state::AppState;
use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use subtle::ConstantTimeEq;

/// Extract the bearer token from the `Authorization` header.
fn extract_token(request: &Request) -> Result<&str, AppError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".to_string()))?;

    header
        .to_str()
        .ok()
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Invalid Authorization header".to_string()))
}

/// Constant-time comparison against the configured shared secret.
fn secret_matches(token: &str, secret: &str) -> bool {
    token.as_bytes().ct_eq(secret.as_bytes()).into()
}

/// Shared-secret authentication middleware
///
/// When `auth_required` is false every request passes through. Otherwise the
/// request must carry `Authorization: Bearer <secret>` matching the configured
/// secret, or it is rejected with 401.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if !state.config.auth_required {
        return Ok(next.run(request).await);
    }

    let request_method = request.method().to_string();
    let request_path = request.uri().path().to_string();

    if !state.config.has_api_secret_auth() {
        tracing::error!(
            method = %request_method,
            path = %request_path,
            "Authentication required but no API secret is configured"
        );
        return Err(AppError::Unauthorized(
            "Authentication is not configured".to_string(),
        ));
    }

    let token = match extract_token(&request) {
        Ok(token) => token,
        Err(e) => {
            tracing::warn!(
                method = %request_method,
                path = %request_path,
                "Authentication failed: {}",
                e
            );
            return Err(e);
        }
    };

    let authorized = state
        .config
        .auth_api_secret
        .as_deref()
        .is_some_and(|secret| secret_matches(token, secret));

    if !authorized {
        tracing::warn!(
            method = %request_method,
            path = %request_path,
            "Authentication failed: token mismatch"
        );
        return Err(AppError::Unauthorized("Invalid API secret".to_string()));
    }

    tracing::debug!(
        method = %request_method,
        path = %request_path,
        "Authentication successful"
    );
    Ok(next.run(request).await)
}
