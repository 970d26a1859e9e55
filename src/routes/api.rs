use axum::{
    Router, middleware,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::handlers::{api, speak, voices};
use crate::middleware::auth_middleware;
use crate::state::AppState;
use std::sync::Arc;

/// Create the API router with protected routes
///
/// Authentication is applied by [`create_app`] once state is available.
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        // Protected routes (auth required when AUTH_REQUIRED=true)
        .route("/voices", get(voices::list_voices))
        .route("/speak", post(speak::speak_handler))
        .layer(TraceLayer::new_for_http())
}

/// Public health check plus the authenticated API, bound to `state`.
pub fn create_app(state: Arc<AppState>) -> Router {
    let protected_routes = create_api_router().layer(middleware::from_fn_with_state(
        state.clone(),
        auth_middleware,
    ));

    Router::new()
        .route("/", get(api::health_check))
        .merge(protected_routes)
        .with_state(state)
}
