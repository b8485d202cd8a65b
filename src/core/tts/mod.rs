mod base;
pub mod google;
pub mod openai;
pub mod provider;
mod registry;

pub use base::{
    AudioArtifact, AudioFormat, BaseTTS, BoxedTTS, JobId, ProviderKind, ProviderLimits,
    SynthesisErrorKind, SynthesisRequest, SynthesisResult, TTSError, TTSResult, VoiceConfig,
};
pub use google::{GOOGLE_API_BASE, GoogleTTS, GoogleTTSConfig};
pub use openai::{OPENAI_TTS_URL, OpenAITTS, OpenAITTSConfig, OpenAITTSModel, OpenAIVoice};
pub use provider::{TTSProvider, TTSRequestBuilder};
pub use registry::{ProviderRegistry, create_tts_provider};

/// Voice catalogs of every supported provider, without credentials.
///
/// Used by listings that must work before any API key is configured.
pub fn voice_catalog(kind: ProviderKind) -> Vec<String> {
    match kind {
        ProviderKind::Google => google::VOICE_CATALOG
            .iter()
            .map(|v| v.to_string())
            .collect(),
        ProviderKind::OpenAI => OpenAIVoice::all()
            .iter()
            .map(|v| v.as_str().to_string())
            .collect(),
    }
}

/// Voice used when the caller does not name one.
pub fn default_voice(kind: ProviderKind) -> &'static str {
    match kind {
        ProviderKind::Google => google::DEFAULT_VOICE,
        ProviderKind::OpenAI => OpenAIVoice::default().as_str(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_voice_catalog() {
        assert!(voice_catalog(ProviderKind::Google).contains(&"en-US-Neural2-J".to_string()));
        assert_eq!(voice_catalog(ProviderKind::OpenAI).len(), 7);
    }

    #[test]
    fn test_default_voice_is_in_catalog() {
        for &kind in ProviderKind::all() {
            assert!(voice_catalog(kind).contains(&default_voice(kind).to_string()));
        }
    }
}
