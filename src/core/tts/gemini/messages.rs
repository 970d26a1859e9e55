//! Wire types for the Gemini `generateContent` endpoint.
//!
//! Only the fields this gateway reads or writes are modelled. Unknown response
//! fields are ignored so upstream additions do not break parsing.

use serde::{Deserialize, Serialize};

use super::config::{GenerationRequest, SpeakerVoice, VoiceSelection};
use crate::core::tts::backoff::parse_duration_secs;

/// Highest sample rate accepted from an upstream MIME type.
pub const MAX_SAMPLE_RATE: u32 = 384_000;

/// The only modality requested from the upstream.
pub const AUDIO_MODALITY: &str = "AUDIO";

// =============================================================================
// Request
// =============================================================================

/// Request body for `models/{model}:generateContent`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Content {
    pub parts: Vec<TextPart>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextPart {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub max_output_tokens: u32,
    pub candidate_count: u32,
    pub stop_sequences: Vec<String>,
    pub response_modalities: Vec<String>,
    pub speech_config: SpeechConfig,
}

/// Either `voiceConfig` or `multiSpeakerVoiceConfig` is set, never both.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice_config: Option<VoiceConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multi_speaker_voice_config: Option<MultiSpeakerVoiceConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceConfig {
    pub prebuilt_voice_config: PrebuiltVoiceConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrebuiltVoiceConfig {
    pub voice_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiSpeakerVoiceConfig {
    pub speaker_voice_configs: Vec<SpeakerVoiceConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeakerVoiceConfig {
    pub speaker: String,
    pub voice_config: VoiceConfig,
}

impl VoiceConfig {
    fn prebuilt(voice_name: &str) -> Self {
        Self {
            prebuilt_voice_config: PrebuiltVoiceConfig {
                voice_name: voice_name.to_string(),
            },
        }
    }
}

impl From<&VoiceSelection> for SpeechConfig {
    fn from(selection: &VoiceSelection) -> Self {
        match selection {
            VoiceSelection::Single(voice) => Self {
                voice_config: Some(VoiceConfig::prebuilt(voice.as_str())),
                multi_speaker_voice_config: None,
            },
            VoiceSelection::MultiSpeaker(speakers) => Self {
                voice_config: None,
                multi_speaker_voice_config: Some(MultiSpeakerVoiceConfig {
                    speaker_voice_configs: speakers
                        .iter()
                        .map(|SpeakerVoice { speaker, voice }| SpeakerVoiceConfig {
                            speaker: speaker.clone(),
                            voice_config: VoiceConfig::prebuilt(voice.as_str()),
                        })
                        .collect(),
                }),
            },
        }
    }
}

impl From<&GenerationRequest> for GenerateContentRequest {
    fn from(request: &GenerationRequest) -> Self {
        let sampling = &request.sampling;
        Self {
            contents: vec![Content {
                parts: vec![TextPart {
                    text: request.text.clone(),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: sampling.temperature,
                top_p: sampling.top_p,
                top_k: sampling.top_k,
                max_output_tokens: sampling.max_output_tokens,
                candidate_count: 1,
                stop_sequences: Vec::new(),
                response_modalities: vec![AUDIO_MODALITY.to_string()],
                speech_config: SpeechConfig::from(&request.voice),
            },
        }
    }
}

// =============================================================================
// Response
// =============================================================================

/// Successful `generateContent` response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponsePart {
    #[serde(default)]
    pub inline_data: Option<InlineData>,
}

/// Base64 audio returned inline by the model.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub data: String,
}

impl InlineData {
    /// Sample rate advertised in the MIME type, e.g.
    /// `audio/L16;codec=pcm;rate=24000`. Zero and rates above
    /// [`MAX_SAMPLE_RATE`] are ignored.
    pub fn sample_rate(&self) -> Option<u32> {
        self.mime_type
            .as_deref()?
            .split(';')
            .filter_map(|param| param.trim().split_once('='))
            .find(|(key, _)| key.trim().eq_ignore_ascii_case("rate"))
            .and_then(|(_, value)| value.trim().parse().ok())
            .filter(|rate| (1..=MAX_SAMPLE_RATE).contains(rate))
    }
}

impl GenerateContentResponse {
    /// First non-empty inline audio part of the first candidate.
    pub fn audio(&self) -> Option<&InlineData> {
        self.candidates
            .first()?
            .content
            .as_ref()?
            .parts
            .iter()
            .filter_map(|part| part.inline_data.as_ref())
            .find(|inline| !inline.data.is_empty())
    }
}

// =============================================================================
// Error envelope
// =============================================================================

/// Google API error envelope returned with non-2xx statuses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub details: Vec<serde_json::Value>,
}

impl ErrorResponse {
    /// `retryDelay` from a `google.rpc.RetryInfo` detail, in seconds.
    pub fn retry_delay_secs(&self) -> Option<f64> {
        self.error
            .details
            .iter()
            .filter_map(|detail| detail.get("retryDelay")?.as_str())
            .find_map(parse_duration_secs)
    }
}

/// Parse an error body and pull out its retry hint, if any.
pub fn retry_delay_from_body(body: &str) -> Option<f64> {
    serde_json::from_str::<ErrorResponse>(body)
        .ok()?
        .retry_delay_secs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tts::gemini::config::{GeminiVoice, SamplingParameters};
    use serde_json::json;

    fn request(voice: VoiceSelection) -> GenerationRequest {
        GenerationRequest {
            text: "Hello there".to_string(),
            voice,
            sampling: SamplingParameters::default(),
        }
    }

    #[test]
    fn test_single_voice_request_shape() {
        let body = GenerateContentRequest::from(&request(VoiceSelection::Single(
            GeminiVoice::Puck,
        )));
        let value = serde_json::to_value(&body).unwrap();

        assert_eq!(value["contents"][0]["parts"][0]["text"], "Hello there");
        let config = &value["generationConfig"];
        assert_eq!(config["candidateCount"], 1);
        assert_eq!(config["topK"], 40);
        assert_eq!(config["maxOutputTokens"], 8192);
        assert_eq!(config["stopSequences"], json!([]));
        assert_eq!(config["responseModalities"], json!(["AUDIO"]));
        assert_eq!(
            config["speechConfig"],
            json!({"voiceConfig": {"prebuiltVoiceConfig": {"voiceName": "Puck"}}})
        );
    }

    #[test]
    fn test_multi_speaker_request_shape() {
        let body = GenerateContentRequest::from(&request(VoiceSelection::MultiSpeaker(vec![
            SpeakerVoice {
                speaker: "Joe".to_string(),
                voice: GeminiVoice::Kore,
            },
            SpeakerVoice {
                speaker: "Jane".to_string(),
                voice: GeminiVoice::Charon,
            },
        ])));
        let value = serde_json::to_value(&body).unwrap();
        let speech = &value["generationConfig"]["speechConfig"];

        assert!(speech.get("voiceConfig").is_none());
        assert_eq!(
            speech["multiSpeakerVoiceConfig"]["speakerVoiceConfigs"],
            json!([
                {"speaker": "Joe", "voiceConfig": {"prebuiltVoiceConfig": {"voiceName": "Kore"}}},
                {"speaker": "Jane", "voiceConfig": {"prebuiltVoiceConfig": {"voiceName": "Charon"}}}
            ])
        );
    }

    #[test]
    fn test_response_audio_extraction() {
        let body = r#"{
            "candidates": [{
                "content": {"parts": [{"inlineData": {"mimeType": "audio/L16;codec=pcm;rate=24000", "data": "AAEC"}}]},
                "finishReason": "STOP"
            }]
        }"#;
        let response: GenerateContentResponse = serde_json::from_str(body).unwrap();
        let audio = response.audio().unwrap();
        assert_eq!(audio.data, "AAEC");
        assert_eq!(audio.sample_rate(), Some(24000));
    }

    #[test]
    fn test_response_without_audio() {
        for body in [
            r#"{}"#,
            r#"{"candidates": []}"#,
            r#"{"candidates": [{"finishReason": "SAFETY"}]}"#,
            r#"{"candidates": [{"content": {"parts": [{"text": "nope"}]}}]}"#,
            r#"{"candidates": [{"content": {"parts": [{"inlineData": {"data": ""}}]}}]}"#,
        ] {
            let response: GenerateContentResponse = serde_json::from_str(body).unwrap();
            assert!(response.audio().is_none(), "unexpected audio in {body}");
        }
    }

    #[test]
    fn test_sample_rate_parsing() {
        let inline = |mime: Option<&str>| InlineData {
            mime_type: mime.map(str::to_string),
            data: String::new(),
        };
        assert_eq!(inline(Some("audio/L16; rate=16000")).sample_rate(), Some(16000));
        assert_eq!(inline(Some("audio/L16;codec=pcm")).sample_rate(), None);
        assert_eq!(inline(Some("audio/L16;rate=0")).sample_rate(), None);
        assert_eq!(inline(Some("audio/L16;rate=384000")).sample_rate(), Some(384_000));
        assert_eq!(inline(Some("audio/L16;codec=pcm;rate=300000000")).sample_rate(), None);
        assert_eq!(inline(Some("audio/L16;rate=99999999999")).sample_rate(), None);
        assert_eq!(inline(None).sample_rate(), None);
    }

    #[test]
    fn test_error_envelope_retry_delay() {
        let body = r#"{
            "error": {
                "code": 429,
                "message": "Resource has been exhausted",
                "status": "RESOURCE_EXHAUSTED",
                "details": [
                    {"@type": "type.googleapis.com/google.rpc.QuotaFailure"},
                    {"@type": "type.googleapis.com/google.rpc.RetryInfo", "retryDelay": "17s"}
                ]
            }
        }"#;
        assert_eq!(retry_delay_from_body(body), Some(17.0));
        assert_eq!(retry_delay_from_body(r#"{"error": {"code": 429}}"#), None);
        assert_eq!(retry_delay_from_body("Too Many Requests"), None);
    }
}
