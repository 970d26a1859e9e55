pub mod tts;
pub mod wav;

pub use tts::{
    BackoffPolicy, SpeechInput, SpeechOutput, SpeechSynthesizer, SynthesisError, SynthesisResult,
};
