use axum::{extract::State, response::Json};
use serde::Serialize;
use std::sync::Arc;

use crate::core::tts::gemini::GeminiVoice;
use crate::state::AppState;

#[derive(Debug, Clone, Serialize)]
pub struct VoicesResponse {
    /// Prebuilt voice names
    pub voices: Vec<&'static str>,
    pub default_voice: &'static str,
    /// Allowed models in fallback order
    pub models: Vec<String>,
    pub default_model: String,
}

/// `GET /voices`: the prebuilt voice catalog and the model allowlist.
pub async fn list_voices(State(state): State<Arc<AppState>>) -> Json<VoicesResponse> {
    Json(VoicesResponse {
        voices: GeminiVoice::all().iter().map(GeminiVoice::as_str).collect(),
        default_voice: GeminiVoice::default().as_str(),
        models: state.catalog.allowed().to_vec(),
        default_model: state.catalog.default_model().to_string(),
    })
}
