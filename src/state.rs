use std::sync::Arc;

use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::core::tts::gemini::ModelCatalog;
use crate::core::tts::{SpeechSynthesizer, SynthesisError, SynthesisResult};

/// Shared, read-only application state.
pub struct AppState {
    pub config: ServerConfig,
    pub catalog: ModelCatalog,
    /// `None` when the upstream is not configured; `/speak` then answers 500.
    synthesizer: Option<SpeechSynthesizer>,
}

impl AppState {
    /// Build state from a validated configuration.
    pub fn new(config: ServerConfig) -> Arc<Self> {
        let synthesizer = match SpeechSynthesizer::from_config(&config) {
            Ok(synthesizer) => {
                info!(
                    default_model = %synthesizer.catalog().default_model(),
                    models = synthesizer.catalog().allowed().len(),
                    max_retries = config.tts_max_retries_per_model,
                    "Speech synthesizer ready"
                );
                Some(synthesizer)
            }
            Err(e) => {
                warn!("Speech synthesis disabled: {}", e);
                None
            }
        };

        let catalog = config.model_catalog().unwrap_or_default();

        Arc::new(Self {
            config,
            catalog,
            synthesizer,
        })
    }

    /// Build state around an existing synthesizer.
    pub fn with_synthesizer(config: ServerConfig, synthesizer: SpeechSynthesizer) -> Arc<Self> {
        Arc::new(Self {
            catalog: synthesizer.catalog().clone(),
            config,
            synthesizer: Some(synthesizer),
        })
    }

    pub fn synthesizer(&self) -> SynthesisResult<&SpeechSynthesizer> {
        self.synthesizer.as_ref().ok_or_else(|| {
            SynthesisError::Configuration("Speech synthesis is not configured".to_string())
        })
    }
}
