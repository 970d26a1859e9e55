use axum::{
    extract::{State, rejection::JsonRejection},
    response::Json,
};
use std::sync::Arc;

use crate::core::tts::{SpeechInput, SpeechOutput, SynthesisError};
use crate::errors::AppResult;
use crate::state::AppState;

/// `POST /speak`: synthesize text into a base64 WAV payload.
///
/// Malformed JSON bodies are reported as `invalid_input` like every other
/// validation failure.
pub async fn speak_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SpeechInput>, JsonRejection>,
) -> AppResult<Json<SpeechOutput>> {
    let Json(input) =
        payload.map_err(|rejection| SynthesisError::InvalidInput(rejection.body_text()))?;

    tracing::info!(
        chars = input.text.chars().count(),
        model = ?input.model,
        multi_speaker = input.multi_speaker,
        "Received speech request"
    );

    let output = state.synthesizer()?.synthesize(&input).await?;
    Ok(Json(output))
}
