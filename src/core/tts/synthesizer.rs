//! Request-level speech synthesis.
//!
//! [`SpeechSynthesizer`] validates a caller's [`SpeechInput`], builds the
//! candidate model list, runs the fallback orchestrator, wraps the returned PCM
//! in a WAV container and base64-encodes it for the JSON response.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use super::error::{SynthesisError, SynthesisResult};
use super::gemini::{
    FallbackOrchestrator, GeminiHttpTransport, GeminiVoice, GenerationRequest, ModelCandidateList,
    ModelCatalog, SamplingParameters, SpeakerVoice, VoiceSelection, is_valid_model_id,
};
use crate::config::ServerConfig;
use crate::core::wav::{self, PcmFormat, WAV_MIME_TYPE};

/// Body of `POST /speak`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SpeechInput {
    pub text: String,
    pub model: Option<String>,
    pub voice: Option<String>,
    pub multi_speaker: bool,
    pub speakers: Vec<SpeakerInput>,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub top_k: Option<u32>,
    pub max_output_tokens: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SpeakerInput {
    pub speaker: String,
    pub voice: String,
}

/// Successful synthesis, ready to serialize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpeechOutput {
    /// Base64 of the complete WAV file
    pub audio_content: String,
    pub mime_type: String,
    pub file_name: String,
    /// Model that produced the audio
    pub model: String,
    pub sample_rate: u32,
    /// Size of the decoded WAV file in bytes
    pub size_bytes: usize,
}

pub struct SpeechSynthesizer {
    catalog: ModelCatalog,
    orchestrator: FallbackOrchestrator,
    max_text_length: usize,
}

impl SpeechSynthesizer {
    pub fn new(
        catalog: ModelCatalog,
        orchestrator: FallbackOrchestrator,
        max_text_length: usize,
    ) -> Self {
        Self {
            catalog,
            orchestrator,
            max_text_length,
        }
    }

    /// Build the production synthesizer on top of [`GeminiHttpTransport`].
    pub fn from_config(config: &ServerConfig) -> SynthesisResult<Self> {
        let api_key = config.gemini_api_key.as_deref().ok_or_else(|| {
            SynthesisError::Configuration("GEMINI_API_KEY is not configured".to_string())
        })?;
        let catalog = config
            .model_catalog()
            .map_err(SynthesisError::Configuration)?;
        let transport =
            GeminiHttpTransport::new(&config.gemini_base_url, api_key, config.request_timeout())?;
        let orchestrator = FallbackOrchestrator::new(Arc::new(transport))
            .with_max_retries(config.tts_max_retries_per_model);

        Ok(Self::new(catalog, orchestrator, config.tts_max_text_length))
    }

    pub fn catalog(&self) -> &ModelCatalog {
        &self.catalog
    }

    /// Validate caller input into a canonical request and its candidate list.
    ///
    /// Runs before any upstream call; every rejection is
    /// [`SynthesisError::InvalidInput`].
    pub fn prepare(
        &self,
        input: &SpeechInput,
    ) -> SynthesisResult<(GenerationRequest, ModelCandidateList)> {
        let text = input.text.trim();
        if text.is_empty() {
            return Err(SynthesisError::InvalidInput("text must not be empty".to_string()));
        }
        let length = text.chars().count();
        if length > self.max_text_length {
            return Err(SynthesisError::InvalidInput(format!(
                "text is {length} characters, maximum is {}",
                self.max_text_length
            )));
        }

        let requested = match input.model.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(model) if !is_valid_model_id(model) => {
                return Err(SynthesisError::InvalidInput(format!(
                    "invalid model identifier '{}'",
                    model.chars().take(64).collect::<String>()
                )));
            }
            Some(model) => {
                if !self.catalog.contains(model) {
                    warn!(
                        requested = %model,
                        default = %self.catalog.default_model(),
                        "Requested model is not allowed, using default"
                    );
                }
                Some(model)
            }
        };

        let voice = match input.voice.as_deref() {
            Some(name) if !name.trim().is_empty() => parse_voice(name)?,
            _ => GeminiVoice::default(),
        };

        let voice = if input.multi_speaker {
            let speakers = input
                .speakers
                .iter()
                .map(|s| {
                    let speaker = s.speaker.trim();
                    if speaker.is_empty() {
                        return Err(SynthesisError::InvalidInput(
                            "speaker name must not be empty".to_string(),
                        ));
                    }
                    Ok(SpeakerVoice {
                        speaker: speaker.to_string(),
                        voice: parse_voice(&s.voice)?,
                    })
                })
                .collect::<SynthesisResult<Vec<_>>>()?;
            VoiceSelection::multi_or_single(speakers, voice)
        } else {
            VoiceSelection::Single(voice)
        };

        let sampling = SamplingParameters::from_optional(
            input.temperature,
            input.top_p,
            input.top_k,
            input.max_output_tokens,
        )?;

        let request = GenerationRequest {
            text: text.to_string(),
            voice,
            sampling,
        };
        Ok((request, self.catalog.candidates(requested)))
    }

    /// Synthesize speech and package it as a base64 WAV file.
    pub async fn synthesize(&self, input: &SpeechInput) -> SynthesisResult<SpeechOutput> {
        let (request, candidates) = self.prepare(input)?;

        let audio = self.orchestrator.synthesize(&request, &candidates).await?;

        let format = PcmFormat {
            sample_rate: audio.sample_rate,
            ..PcmFormat::default()
        };
        let wav_bytes = wav::encode(&audio.pcm, format);

        info!(
            model = %audio.model,
            sample_rate = audio.sample_rate,
            size_bytes = wav_bytes.len(),
            "Encoded speech as WAV"
        );

        Ok(SpeechOutput {
            audio_content: BASE64.encode(&wav_bytes),
            mime_type: WAV_MIME_TYPE.to_string(),
            file_name: format!("speech-{}.wav", Uuid::new_v4()),
            model: audio.model,
            sample_rate: audio.sample_rate,
            size_bytes: wav_bytes.len(),
        })
    }
}

fn parse_voice(name: &str) -> SynthesisResult<GeminiVoice> {
    GeminiVoice::parse(name).ok_or_else(|| {
        SynthesisError::InvalidInput(format!(
            "unknown voice '{}'",
            name.trim().chars().take(64).collect::<String>()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tts::BackoffPolicy;
    use crate::core::tts::gemini::{
        GEMINI_FLASH_TTS_MODEL, GEMINI_PRO_TTS_MODEL, GenerateContentRequest, GenerationTransport,
        TransportError, UpstreamResponse,
    };
    use crate::core::wav::{HEADER_SIZE, parse_header};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records every call and answers with a fixed reply.
    struct RecordingTransport {
        reply: Result<UpstreamResponse, TransportError>,
        calls: Mutex<Vec<(String, GenerateContentRequest)>>,
    }

    impl RecordingTransport {
        fn new(reply: Result<UpstreamResponse, TransportError>) -> Arc<Self> {
            Arc::new(Self {
                reply,
                calls: Mutex::new(Vec::new()),
            })
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl GenerationTransport for RecordingTransport {
        async fn generate(
            &self,
            model: &str,
            request: &GenerateContentRequest,
        ) -> Result<UpstreamResponse, TransportError> {
            self.calls
                .lock()
                .unwrap()
                .push((model.to_string(), request.clone()));
            self.reply.clone()
        }
    }

    fn audio_reply(pcm: &[u8]) -> Result<UpstreamResponse, TransportError> {
        Ok(UpstreamResponse {
            status: 200,
            retry_after: None,
            body: format!(
                r#"{{"candidates":[{{"content":{{"parts":[{{"inlineData":{{"mimeType":"audio/L16;codec=pcm;rate=24000","data":"{}"}}}}]}}}}]}}"#,
                BASE64.encode(pcm)
            ),
        })
    }

    fn synthesizer(transport: Arc<RecordingTransport>) -> SpeechSynthesizer {
        let orchestrator =
            FallbackOrchestrator::new(transport).with_policy(BackoffPolicy::immediate());
        SpeechSynthesizer::new(ModelCatalog::default(), orchestrator, 100)
    }

    fn input(text: &str) -> SpeechInput {
        SpeechInput {
            text: text.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_synthesize_returns_wav() {
        let transport = RecordingTransport::new(audio_reply(&[1, 0, 2, 0]));
        let output = synthesizer(transport.clone())
            .synthesize(&input("  Hello  "))
            .await
            .unwrap();

        assert_eq!(output.mime_type, "audio/wav");
        assert_eq!(output.model, GEMINI_FLASH_TTS_MODEL);
        assert_eq!(output.sample_rate, 24000);
        assert_eq!(output.size_bytes, HEADER_SIZE + 4);
        assert!(output.file_name.starts_with("speech-"));
        assert!(output.file_name.ends_with(".wav"));

        let wav_bytes = BASE64.decode(&output.audio_content).unwrap();
        let header = parse_header(&wav_bytes).unwrap();
        assert_eq!(header.data_size, 4);
        assert_eq!(&wav_bytes[HEADER_SIZE..], &[1, 0, 2, 0]);

        let calls = transport.calls.lock().unwrap();
        assert_eq!(calls[0].1.contents[0].parts[0].text, "Hello");
    }

    #[tokio::test]
    async fn test_empty_text_never_reaches_upstream() {
        let transport = RecordingTransport::new(audio_reply(&[0, 0]));
        let synth = synthesizer(transport.clone());

        for text in ["", "   ", "\n\t"] {
            let err = synth.synthesize(&input(text)).await.unwrap_err();
            assert!(matches!(err, SynthesisError::InvalidInput(_)));
        }
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_text_too_long() {
        let transport = RecordingTransport::new(audio_reply(&[0, 0]));
        let err = synthesizer(transport.clone())
            .synthesize(&input(&"a".repeat(101)))
            .await
            .unwrap_err();
        assert!(matches!(err, SynthesisError::InvalidInput(ref m) if m.contains("101")));
        assert_eq!(transport.call_count(), 0);
    }

    #[test]
    fn test_prepare_requested_model_leads() {
        let synth = synthesizer(RecordingTransport::new(audio_reply(&[])));
        let mut req = input("hi");
        req.model = Some(GEMINI_PRO_TTS_MODEL.to_string());
        let (_, candidates) = synth.prepare(&req).unwrap();
        assert_eq!(
            candidates.as_slice(),
            &[GEMINI_PRO_TTS_MODEL, GEMINI_FLASH_TTS_MODEL]
        );
    }

    #[test]
    fn test_prepare_unlisted_model_uses_default() {
        let synth = synthesizer(RecordingTransport::new(audio_reply(&[])));
        let mut req = input("hi");
        req.model = Some("gemini-9-ultra".to_string());
        let (_, candidates) = synth.prepare(&req).unwrap();
        assert_eq!(candidates.first(), GEMINI_FLASH_TTS_MODEL);
    }

    #[test]
    fn test_prepare_rejects_malformed_model() {
        let synth = synthesizer(RecordingTransport::new(audio_reply(&[])));
        let mut req = input("hi");
        req.model = Some("../../admin".to_string());
        assert!(matches!(
            synth.prepare(&req),
            Err(SynthesisError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_prepare_voice_selection() {
        let synth = synthesizer(RecordingTransport::new(audio_reply(&[])));

        let (request, _) = synth.prepare(&input("hi")).unwrap();
        assert_eq!(request.voice, VoiceSelection::Single(GeminiVoice::Kore));

        let mut req = input("hi");
        req.voice = Some("puck".to_string());
        let (request, _) = synth.prepare(&req).unwrap();
        assert_eq!(request.voice, VoiceSelection::Single(GeminiVoice::Puck));

        req.voice = Some("alloy".to_string());
        assert!(matches!(
            synth.prepare(&req),
            Err(SynthesisError::InvalidInput(ref m)) if m.contains("alloy")
        ));
    }

    #[test]
    fn test_prepare_multi_speaker() {
        let synth = synthesizer(RecordingTransport::new(audio_reply(&[])));
        let mut req = input("Joe: hi\nJane: hello");
        req.multi_speaker = true;
        req.speakers = vec![
            SpeakerInput {
                speaker: "Joe".to_string(),
                voice: "Charon".to_string(),
            },
            SpeakerInput {
                speaker: "Jane".to_string(),
                voice: "Leda".to_string(),
            },
        ];
        let (request, _) = synth.prepare(&req).unwrap();
        match request.voice {
            VoiceSelection::MultiSpeaker(speakers) => {
                assert_eq!(speakers.len(), 2);
                assert_eq!(speakers[1].voice, GeminiVoice::Leda);
            }
            other => panic!("expected multi speaker, got {other:?}"),
        }

        // An empty speaker list degrades to the single voice
        req.speakers.clear();
        let (request, _) = synth.prepare(&req).unwrap();
        assert_eq!(request.voice, VoiceSelection::Single(GeminiVoice::Kore));

        req.speakers = vec![SpeakerInput {
            speaker: "Joe".to_string(),
            voice: "nobody".to_string(),
        }];
        assert!(synth.prepare(&req).is_err());
    }

    #[test]
    fn test_prepare_sampling() {
        let synth = synthesizer(RecordingTransport::new(audio_reply(&[])));
        let mut req = input("hi");
        req.temperature = Some(9.0);
        req.top_k = Some(0);
        let (request, _) = synth.prepare(&req).unwrap();
        assert_eq!(request.sampling.temperature, 2.0);
        assert_eq!(request.sampling.top_k, 1);

        req.top_p = Some(f32::NAN);
        assert!(synth.prepare(&req).is_err());
    }

    #[tokio::test]
    async fn test_upstream_failure_propagates() {
        let transport = RecordingTransport::new(Ok(UpstreamResponse {
            status: 500,
            retry_after: None,
            body: "boom".to_string(),
        }));
        let err = synthesizer(transport.clone())
            .synthesize(&input("hi"))
            .await
            .unwrap_err();
        assert!(matches!(err, SynthesisError::UpstreamFailure { status: 500, .. }));
        // 2 models x 3 attempts
        assert_eq!(transport.call_count(), 6);
    }

    #[test]
    fn test_from_config_requires_api_key() {
        let config = ServerConfig::default();
        assert!(matches!(
            SpeechSynthesizer::from_config(&config),
            Err(SynthesisError::Configuration(_))
        ));
    }

    #[test]
    fn test_from_config() {
        let mut config = ServerConfig::default();
        config.gemini_api_key = Some("key".to_string());
        let synth = SpeechSynthesizer::from_config(&config).unwrap();
        assert_eq!(synth.catalog().allowed().len(), 2);
    }

    #[test]
    fn test_speech_input_deserialize() {
        let input: SpeechInput = serde_json::from_str(
            r#"{"text":"hi","voice":"Puck","multi_speaker":true,"speakers":[{"speaker":"A","voice":"Kore"}],"top_k":10}"#,
        )
        .unwrap();
        assert_eq!(input.voice.as_deref(), Some("Puck"));
        assert!(input.multi_speaker);
        assert_eq!(input.speakers.len(), 1);
        assert_eq!(input.top_k, Some(10));

        let input: SpeechInput = serde_json::from_str("{}").unwrap();
        assert!(input.text.is_empty());
    }
}
