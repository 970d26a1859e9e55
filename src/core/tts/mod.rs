//! Text-to-speech over the Gemini API.
//!
//! - [`backoff`] computes retry delays
//! - [`gemini`] holds the provider: wire types, transport, fallback orchestration
//! - [`synthesizer`] turns a caller request into a WAV payload

pub mod backoff;
mod error;
pub mod gemini;
pub mod synthesizer;

pub use backoff::{BackoffPolicy, parse_retry_after};
pub use error::{INTERNAL_ERROR_STATUS, SynthesisError, SynthesisResult};
pub use synthesizer::{SpeakerInput, SpeechInput, SpeechOutput, SpeechSynthesizer};
