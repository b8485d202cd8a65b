//! Provider registry keyed by `ProviderKind`.
//!
//! The registry is assembled once at startup and read-only afterwards, so it
//! can be shared across jobs without locking.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{info, warn};

use super::base::{BaseTTS, BoxedTTS, ProviderKind, TTSError, TTSResult};
use super::google::{GoogleTTS, GoogleTTSConfig};
use super::openai::{OpenAITTS, OpenAITTSConfig, OpenAITTSModel};
use crate::config::PipelineConfig;

/// Mapping from provider kind to its backend.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: HashMap<ProviderKind, BoxedTTS>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry containing every provider with configured credentials.
    ///
    /// Providers whose construction fails are skipped with a warning.
    pub fn from_config(config: &PipelineConfig) -> Self {
        let mut registry = Self::new();
        for &kind in ProviderKind::all() {
            match create_tts_provider(kind, config) {
                Ok(provider) => registry.register(provider),
                Err(e) => warn!(provider = %kind, error = %e, "Provider not registered"),
            }
        }
        registry
    }

    /// Register a backend under its own `kind()`, replacing any previous one.
    pub fn register(&mut self, provider: BoxedTTS) {
        let kind = provider.kind();
        info!(provider = %kind, "Registered TTS provider");
        self.providers.insert(kind, provider);
    }

    /// Builder-style `register`.
    pub fn with(mut self, provider: impl BaseTTS + 'static) -> Self {
        self.register(Arc::new(provider));
        self
    }

    pub fn get(&self, kind: ProviderKind) -> Option<&BoxedTTS> {
        self.providers.get(&kind)
    }

    /// Like `get`, but unregistered kinds are an error.
    pub fn require(&self, kind: ProviderKind) -> TTSResult<&BoxedTTS> {
        self.get(kind).ok_or(TTSError::ProviderNotRegistered(kind))
    }

    pub fn contains(&self, kind: ProviderKind) -> bool {
        self.providers.contains_key(&kind)
    }

    /// Registered kinds in declaration order.
    pub fn kinds(&self) -> Vec<ProviderKind> {
        ProviderKind::all()
            .iter()
            .copied()
            .filter(|k| self.providers.contains_key(k))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.kinds())
            .finish()
    }
}

/// Factory function to create a TTS provider.
///
/// # Supported Providers
///
/// - `ProviderKind::Google` - Google Cloud Text-to-Speech (API key)
/// - `ProviderKind::OpenAI` - OpenAI Audio Speech API (tts-1, tts-1-hd, gpt-4o-mini-tts)
///
/// # Example
///
/// ```rust,no_run
/// use longform_tts::config::PipelineConfig;
/// use longform_tts::core::tts::{ProviderKind, create_tts_provider};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = PipelineConfig::from_env()?;
/// let provider = create_tts_provider(ProviderKind::OpenAI, &config)?;
/// println!("{:?}", provider.list_available_voices());
/// # Ok(())
/// # }
/// ```
pub fn create_tts_provider(kind: ProviderKind, config: &PipelineConfig) -> TTSResult<BoxedTTS> {
    let api_key = config
        .get_api_key(kind)
        .map_err(TTSError::InvalidConfiguration)?;

    match kind {
        ProviderKind::OpenAI => Ok(Arc::new(OpenAITTS::new(OpenAITTSConfig {
            api_key,
            base_url: config.providers.openai_base_url.clone(),
            default_model: OpenAITTSModel::from_str_or_default(&config.providers.openai_model),
            request_timeout: config.request_timeout(),
        })?)),
        ProviderKind::Google => Ok(Arc::new(GoogleTTS::new(GoogleTTSConfig {
            api_key,
            base_url: config.providers.google_base_url.clone(),
            request_timeout: config.request_timeout(),
        })?)),
    }
}
