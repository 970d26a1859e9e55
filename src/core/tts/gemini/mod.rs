//! Gemini speech generation provider.
//!
//! Text is synthesized by the `generateContent` endpoint of the Gemini API with
//! `responseModalities: ["AUDIO"]`. The endpoint answers with raw 16-bit
//! little-endian mono PCM, base64-encoded inline.
//!
//! # Supported Models
//!
//! - `gemini-2.5-flash-preview-tts` - Lower latency (default)
//! - `gemini-2.5-pro-preview-tts` - Higher quality
//!
//! # Fallback
//!
//! [`FallbackOrchestrator`] tries an ordered candidate list, retrying each
//! model with exponential backoff before moving to the next one.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tts_gateway::core::tts::gemini::{
//!     FallbackOrchestrator, GeminiHttpTransport, GenerationRequest, ModelCatalog,
//!     SamplingParameters, VoiceSelection, GEMINI_API_BASE_URL,
//! };
//!
//! #[tokio::main]
//! async fn main() {
//!     let transport = GeminiHttpTransport::new(GEMINI_API_BASE_URL, "key", Duration::from_secs(60))
//!         .unwrap();
//!     let orchestrator = FallbackOrchestrator::new(Arc::new(transport));
//!     let request = GenerationRequest {
//!         text: "Hello, world!".to_string(),
//!         voice: VoiceSelection::default(),
//!         sampling: SamplingParameters::default(),
//!     };
//!     let candidates = ModelCatalog::default().candidates(None);
//!     let audio = orchestrator.synthesize(&request, &candidates).await.unwrap();
//!     println!("{} bytes from {}", audio.pcm.len(), audio.model);
//! }
//! ```

mod client;
mod config;
mod messages;
mod orchestrator;

pub use client::{
    API_KEY_HEADER, DEFAULT_TIMEOUT_SECS, GEMINI_API_BASE_URL, GeminiHttpTransport,
    GenerationTransport, TransportError, UpstreamResponse,
};
pub use config::{
    GEMINI_FLASH_TTS_MODEL, GEMINI_PRO_TTS_MODEL, GeminiVoice, GenerationRequest,
    MAX_MODEL_ID_LEN, ModelCandidateList, ModelCatalog, SamplingParameters, SpeakerVoice,
    VoiceSelection, is_valid_model_id,
};
pub use messages::{
    GenerateContentRequest, GenerateContentResponse, InlineData, retry_delay_from_body,
};
pub use orchestrator::{
    AttemptOutcome, DEFAULT_MAX_RETRIES_PER_MODEL, FallbackOrchestrator, MAX_ERROR_BODY_CHARS,
    OrchestratorState, SynthesizedAudio, classify,
};
