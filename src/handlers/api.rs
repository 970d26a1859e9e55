use axum::response::Json;
use serde_json::{Value, json};

/// Unauthenticated liveness probe.
pub async fn health_check() -> Json<Value> {
    Json(json!({ "status": "OK" }))
}
