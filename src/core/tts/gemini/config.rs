//! Configuration types for the Gemini speech generation API.
//!
//! This module contains:
//! - The model catalog (fixed allowlist plus default model)
//! - Prebuilt voice selection
//! - Sampling parameters with their valid ranges
//! - The canonical [`GenerationRequest`] handed to the orchestrator

use serde::{Deserialize, Serialize};

use super::super::SynthesisError;

// =============================================================================
// Models
// =============================================================================

/// Flash speech model, lower latency.
pub const GEMINI_FLASH_TTS_MODEL: &str = "gemini-2.5-flash-preview-tts";

/// Pro speech model, higher quality.
pub const GEMINI_PRO_TTS_MODEL: &str = "gemini-2.5-pro-preview-tts";

/// Longest accepted model identifier.
pub const MAX_MODEL_ID_LEN: usize = 128;

/// Immutable allowlist of upstream models and the default choice.
///
/// Built once from server configuration and shared read-only across requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelCatalog {
    default_model: String,
    allowed: Vec<String>,
}

impl Default for ModelCatalog {
    fn default() -> Self {
        Self {
            default_model: GEMINI_FLASH_TTS_MODEL.to_string(),
            allowed: vec![
                GEMINI_FLASH_TTS_MODEL.to_string(),
                GEMINI_PRO_TTS_MODEL.to_string(),
            ],
        }
    }
}

impl ModelCatalog {
    /// Build a catalog, trimming and deduplicating the allowlist.
    ///
    /// Fails if the allowlist is empty or does not contain the default model.
    pub fn new<I, S>(default_model: &str, allowed: I) -> Result<Self, String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut models: Vec<String> = Vec::new();
        for model in allowed {
            let model = model.as_ref().trim();
            if model.is_empty() {
                continue;
            }
            if !is_valid_model_id(model) {
                return Err(format!("Invalid model identifier in allowlist: {model}"));
            }
            if !models.iter().any(|m| m == model) {
                models.push(model.to_string());
            }
        }

        if models.is_empty() {
            return Err("Model allowlist must contain at least one model".to_string());
        }

        let default_model = default_model.trim();
        if !models.iter().any(|m| m == default_model) {
            return Err(format!(
                "Default model '{default_model}' is not in the allowlist ({})",
                models.join(", ")
            ));
        }

        Ok(Self {
            default_model: default_model.to_string(),
            allowed: models,
        })
    }

    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    /// Allowed models in fallback order.
    pub fn allowed(&self) -> &[String] {
        &self.allowed
    }

    pub fn contains(&self, model: &str) -> bool {
        self.allowed.iter().any(|m| m == model)
    }

    /// Ordered, deduplicated candidate list for one request.
    ///
    /// The requested model leads when it is allowlisted; otherwise the default
    /// does. The remaining allowlist members follow in catalog order.
    pub fn candidates(&self, requested: Option<&str>) -> ModelCandidateList {
        let lead = requested
            .map(str::trim)
            .filter(|m| self.contains(m))
            .unwrap_or(&self.default_model);

        let mut models = Vec::with_capacity(self.allowed.len());
        models.push(lead.to_string());
        models.extend(self.allowed.iter().filter(|m| *m != lead).cloned());

        ModelCandidateList { models }
    }
}

/// Ordered model identifiers to try. Never empty, never contains duplicates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelCandidateList {
    models: Vec<String>,
}

impl ModelCandidateList {
    pub fn as_slice(&self) -> &[String] {
        &self.models
    }

    pub fn first(&self) -> &str {
        &self.models[0]
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

/// Model ids are path segments in the request URL, so only a conservative
/// character set is accepted.
pub fn is_valid_model_id(model: &str) -> bool {
    !model.is_empty()
        && model.len() <= MAX_MODEL_ID_LEN
        && model
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

// =============================================================================
// Voices
// =============================================================================

/// Prebuilt voices offered by the speech models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GeminiVoice {
    Zephyr,
    Puck,
    Charon,
    #[default]
    Kore,
    Fenrir,
    Leda,
    Orus,
    Aoede,
    Callirrhoe,
    Autonoe,
    Enceladus,
    Iapetus,
    Umbriel,
    Algieba,
    Despina,
    Erinome,
    Algenib,
    Rasalgethi,
    Laomedeia,
    Achernar,
    Alnilam,
    Schedar,
    Gacrux,
    Pulcherrima,
    Achird,
    Zubenelgenubi,
    Vindemiatrix,
    Sadachbia,
    Sadaltager,
    Sulafat,
}

impl GeminiVoice {
    const ALL: [GeminiVoice; 30] = [
        Self::Zephyr,
        Self::Puck,
        Self::Charon,
        Self::Kore,
        Self::Fenrir,
        Self::Leda,
        Self::Orus,
        Self::Aoede,
        Self::Callirrhoe,
        Self::Autonoe,
        Self::Enceladus,
        Self::Iapetus,
        Self::Umbriel,
        Self::Algieba,
        Self::Despina,
        Self::Erinome,
        Self::Algenib,
        Self::Rasalgethi,
        Self::Laomedeia,
        Self::Achernar,
        Self::Alnilam,
        Self::Schedar,
        Self::Gacrux,
        Self::Pulcherrima,
        Self::Achird,
        Self::Zubenelgenubi,
        Self::Vindemiatrix,
        Self::Sadachbia,
        Self::Sadaltager,
        Self::Sulafat,
    ];

    /// Convert to the API parameter value.
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Zephyr => "Zephyr",
            Self::Puck => "Puck",
            Self::Charon => "Charon",
            Self::Kore => "Kore",
            Self::Fenrir => "Fenrir",
            Self::Leda => "Leda",
            Self::Orus => "Orus",
            Self::Aoede => "Aoede",
            Self::Callirrhoe => "Callirrhoe",
            Self::Autonoe => "Autonoe",
            Self::Enceladus => "Enceladus",
            Self::Iapetus => "Iapetus",
            Self::Umbriel => "Umbriel",
            Self::Algieba => "Algieba",
            Self::Despina => "Despina",
            Self::Erinome => "Erinome",
            Self::Algenib => "Algenib",
            Self::Rasalgethi => "Rasalgethi",
            Self::Laomedeia => "Laomedeia",
            Self::Achernar => "Achernar",
            Self::Alnilam => "Alnilam",
            Self::Schedar => "Schedar",
            Self::Gacrux => "Gacrux",
            Self::Pulcherrima => "Pulcherrima",
            Self::Achird => "Achird",
            Self::Zubenelgenubi => "Zubenelgenubi",
            Self::Vindemiatrix => "Vindemiatrix",
            Self::Sadachbia => "Sadachbia",
            Self::Sadaltager => "Sadaltager",
            Self::Sulafat => "Sulafat",
        }
    }

    /// Case-insensitive lookup. Unknown names return `None`.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|v| v.as_str().eq_ignore_ascii_case(s))
    }

    /// Get all available voices.
    pub fn all() -> &'static [GeminiVoice] {
        &Self::ALL
    }
}

impl std::fmt::Display for GeminiVoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One speaker label bound to a prebuilt voice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeakerVoice {
    pub speaker: String,
    pub voice: GeminiVoice,
}

/// Exactly one voice-selection mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceSelection {
    Single(GeminiVoice),
    MultiSpeaker(Vec<SpeakerVoice>),
}

impl Default for VoiceSelection {
    fn default() -> Self {
        Self::Single(GeminiVoice::default())
    }
}

impl VoiceSelection {
    /// Multi-speaker mode with an empty speaker list degrades to `fallback`.
    pub fn multi_or_single(speakers: Vec<SpeakerVoice>, fallback: GeminiVoice) -> Self {
        if speakers.is_empty() {
            Self::Single(fallback)
        } else {
            Self::MultiSpeaker(speakers)
        }
    }
}

// =============================================================================
// Sampling parameters
// =============================================================================

pub const DEFAULT_TEMPERATURE: f32 = 1.0;
pub const DEFAULT_TOP_P: f32 = 0.95;
pub const DEFAULT_TOP_K: u32 = 40;
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 8192;

pub const MAX_TEMPERATURE: f32 = 2.0;
pub const MAX_TOP_K: u32 = 100;
pub const MAX_OUTPUT_TOKENS_LIMIT: u32 = 32_768;

/// Generation sampling controls, always within their valid ranges.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingParameters {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub max_output_tokens: u32,
}

impl Default for SamplingParameters {
    fn default() -> Self {
        Self {
            temperature: DEFAULT_TEMPERATURE,
            top_p: DEFAULT_TOP_P,
            top_k: DEFAULT_TOP_K,
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
        }
    }
}

impl SamplingParameters {
    /// Build from optional caller values, clamping into range.
    ///
    /// NaN or infinite floats are rejected rather than clamped.
    pub fn from_optional(
        temperature: Option<f32>,
        top_p: Option<f32>,
        top_k: Option<u32>,
        max_output_tokens: Option<u32>,
    ) -> Result<Self, SynthesisError> {
        let defaults = Self::default();

        let temperature = finite("temperature", temperature)?.unwrap_or(defaults.temperature);
        let top_p = finite("top_p", top_p)?.unwrap_or(defaults.top_p);

        Ok(Self {
            temperature: temperature.clamp(0.0, MAX_TEMPERATURE),
            top_p: top_p.clamp(0.0, 1.0),
            top_k: top_k.unwrap_or(defaults.top_k).clamp(1, MAX_TOP_K),
            max_output_tokens: max_output_tokens
                .unwrap_or(defaults.max_output_tokens)
                .clamp(1, MAX_OUTPUT_TOKENS_LIMIT),
        })
    }
}

fn finite(name: &str, value: Option<f32>) -> Result<Option<f32>, SynthesisError> {
    match value {
        Some(v) if !v.is_finite() => Err(SynthesisError::InvalidInput(format!(
            "{name} must be a finite number"
        ))),
        other => Ok(other),
    }
}

// =============================================================================
// Generation request
// =============================================================================

/// Canonical, validated input to one orchestration.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub text: String,
    pub voice: VoiceSelection,
    pub sampling: SamplingParameters,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalog() {
        let catalog = ModelCatalog::default();
        assert_eq!(catalog.default_model(), GEMINI_FLASH_TTS_MODEL);
        assert_eq!(catalog.allowed().len(), 2);
        assert!(catalog.contains(GEMINI_PRO_TTS_MODEL));
    }

    #[test]
    fn test_catalog_dedups_and_trims() {
        let catalog = ModelCatalog::new("a", [" a ", "b", "a", "", "c", "b"]).unwrap();
        assert_eq!(catalog.allowed(), &["a", "b", "c"]);
    }

    #[test]
    fn test_catalog_rejects_empty_allowlist() {
        assert!(ModelCatalog::new("a", Vec::<String>::new()).is_err());
        assert!(ModelCatalog::new("a", ["", "  "]).is_err());
    }

    #[test]
    fn test_catalog_rejects_default_outside_allowlist() {
        let err = ModelCatalog::new("z", ["a", "b"]).unwrap_err();
        assert!(err.contains("'z'"));
    }

    #[test]
    fn test_catalog_rejects_bad_identifier() {
        assert!(ModelCatalog::new("a", ["a", "b/../c"]).is_err());
    }

    #[test]
    fn test_candidates_requested_model_leads() {
        let catalog = ModelCatalog::new("a", ["a", "b", "c"]).unwrap();
        let list = catalog.candidates(Some("c"));
        assert_eq!(list.as_slice(), &["c", "a", "b"]);
        assert_eq!(list.first(), "c");
    }

    #[test]
    fn test_candidates_default_leads_when_unrequested() {
        let catalog = ModelCatalog::new("b", ["a", "b", "c"]).unwrap();
        assert_eq!(catalog.candidates(None).as_slice(), &["b", "a", "c"]);
    }

    #[test]
    fn test_candidates_unknown_model_is_ignored() {
        let catalog = ModelCatalog::new("b", ["a", "b"]).unwrap();
        let list = catalog.candidates(Some("not-allowed"));
        assert_eq!(list.as_slice(), &["b", "a"]);
        assert!(!list.is_empty());
    }

    #[test]
    fn test_candidates_single_model_catalog() {
        let catalog = ModelCatalog::new("only", ["only"]).unwrap();
        assert_eq!(catalog.candidates(Some("only")).len(), 1);
    }

    #[test]
    fn test_model_id_validation() {
        assert!(is_valid_model_id(GEMINI_FLASH_TTS_MODEL));
        assert!(is_valid_model_id("model_v1.2"));
        assert!(!is_valid_model_id(""));
        assert!(!is_valid_model_id("models/x"));
        assert!(!is_valid_model_id("a b"));
        assert!(!is_valid_model_id(&"x".repeat(MAX_MODEL_ID_LEN + 1)));
    }

    #[test]
    fn test_voice_parse() {
        assert_eq!(GeminiVoice::parse("kore"), Some(GeminiVoice::Kore));
        assert_eq!(GeminiVoice::parse(" PUCK "), Some(GeminiVoice::Puck));
        assert_eq!(GeminiVoice::parse("Zubenelgenubi"), Some(GeminiVoice::Zubenelgenubi));
        assert_eq!(GeminiVoice::parse("alloy"), None);
    }

    #[test]
    fn test_voice_all_unique() {
        let all = GeminiVoice::all();
        assert_eq!(all.len(), 30);
        for voice in all {
            assert_eq!(GeminiVoice::parse(voice.as_str()), Some(*voice));
        }
    }

    #[test]
    fn test_empty_multi_speaker_falls_back() {
        let selection = VoiceSelection::multi_or_single(Vec::new(), GeminiVoice::Puck);
        assert_eq!(selection, VoiceSelection::Single(GeminiVoice::Puck));

        let selection = VoiceSelection::multi_or_single(
            vec![SpeakerVoice {
                speaker: "Joe".to_string(),
                voice: GeminiVoice::Charon,
            }],
            GeminiVoice::Puck,
        );
        assert!(matches!(selection, VoiceSelection::MultiSpeaker(ref s) if s.len() == 1));
    }

    #[test]
    fn test_sampling_defaults() {
        let params = SamplingParameters::from_optional(None, None, None, None).unwrap();
        assert_eq!(params, SamplingParameters::default());
    }

    #[test]
    fn test_sampling_clamping() {
        let params =
            SamplingParameters::from_optional(Some(5.0), Some(-1.0), Some(0), Some(100_000))
                .unwrap();
        assert_eq!(params.temperature, 2.0);
        assert_eq!(params.top_p, 0.0);
        assert_eq!(params.top_k, 1);
        assert_eq!(params.max_output_tokens, 32_768);

        let params = SamplingParameters::from_optional(None, None, Some(500), Some(0)).unwrap();
        assert_eq!(params.top_k, 100);
        assert_eq!(params.max_output_tokens, 1);
    }

    #[test]
    fn test_sampling_rejects_nan() {
        let err = SamplingParameters::from_optional(Some(f32::NAN), None, None, None).unwrap_err();
        assert!(matches!(err, SynthesisError::InvalidInput(ref m) if m.contains("temperature")));
        assert!(SamplingParameters::from_optional(None, Some(f32::INFINITY), None, None).is_err());
    }
}
