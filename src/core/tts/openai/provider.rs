//! OpenAI TTS provider implementation.
//!
//! # API Reference
//!
//! - Endpoint: `POST https://api.openai.com/v1/audio/speech`
//! - Models: tts-1, tts-1-hd, gpt-4o-mini-tts
//! - Output: mp3, opus, flac, wav (24kHz)
//! - Speed: 0.25 to 4.0, no pitch or gain control

use async_trait::async_trait;
use serde_json::json;
use tracing::{error, info, warn};

use super::config::{
    MAX_TEXT_LENGTH, OpenAITTSConfig, OpenAITTSModel, OpenAIVoice, response_format,
};
use crate::config::pricing::{cost_cents_for_chars, get_tts_price};
use crate::core::tts::base::{
    AudioFormat, BaseTTS, ProviderKind, ProviderLimits, SynthesisRequest, SynthesisResult,
    TTSError, TTSResult, VoiceConfig,
};
use crate::core::tts::provider::{
    TTSProvider, TTSRequestBuilder, build_artifact, check_request_text, write_audio,
};

/// Speech endpoint path, relative to the API base URL
pub const OPENAI_TTS_PATH: &str = "/v1/audio/speech";

/// OpenAI TTS API endpoint
pub const OPENAI_TTS_URL: &str = "https://api.openai.com/v1/audio/speech";

const SPEED_RANGE: (f32, f32) = (0.25, 4.0);

// =============================================================================
// Request Builder
// =============================================================================

/// OpenAI-specific TTS request builder
#[derive(Clone)]
struct OpenAIRequestBuilder {
    api_key: String,
    endpoint: String,
    default_model: OpenAITTSModel,
}

impl OpenAIRequestBuilder {
    fn model_for(&self, config: &VoiceConfig) -> OpenAITTSModel {
        config
            .extra_str("model")
            .map(OpenAITTSModel::from_str_or_default)
            .unwrap_or(self.default_model)
    }
}

impl TTSRequestBuilder for OpenAIRequestBuilder {
    fn build_http_request(
        &self,
        client: &reqwest::Client,
        request: &SynthesisRequest,
    ) -> reqwest::RequestBuilder {
        let config = &request.voice_config;
        let voice = OpenAIVoice::from_str_or_default(&config.voice_id);
        let speed = config.speed.clamp(SPEED_RANGE.0, SPEED_RANGE.1);

        let mut body = json!({
            "model": self.model_for(config).as_str(),
            "input": request.text,
            "voice": voice.as_str(),
            "response_format": response_format(config.audio_format),
        });

        // Add speed if not default (1.0)
        if (speed - 1.0).abs() > 0.001 {
            body["speed"] = json!(speed);
        }

        client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
    }
}

// =============================================================================
// OpenAI TTS Provider
// =============================================================================

/// OpenAI TTS backend using the Audio Speech API.
///
/// # Example
///
/// ```rust,no_run
/// use longform_tts::core::tts::{BaseTTS, OpenAITTS, OpenAITTSConfig};
///
/// let tts = OpenAITTS::new(OpenAITTSConfig {
///     api_key: "sk-...".to_string(),
///     ..Default::default()
/// })
/// .unwrap();
/// assert!(tts.list_available_voices().contains(&"ash".to_string()));
/// ```
pub struct OpenAITTS {
    provider: TTSProvider,
    request_builder: OpenAIRequestBuilder,
}

impl OpenAITTS {
    pub fn new(config: OpenAITTSConfig) -> TTSResult<Self> {
        if config.api_key.trim().is_empty() {
            return Err(TTSError::InvalidConfiguration(
                "OpenAI API key is required".to_string(),
            ));
        }

        let endpoint = format!("{}{}", config.base_url.trim_end_matches('/'), OPENAI_TTS_PATH);
        url::Url::parse(&endpoint).map_err(|e| {
            TTSError::InvalidConfiguration(format!("invalid OpenAI base URL {}: {e}", config.base_url))
        })?;

        let provider = TTSProvider::new(config.request_timeout)?;
        info!(model = %config.default_model, "OpenAI TTS provider initialized");

        Ok(Self {
            provider,
            request_builder: OpenAIRequestBuilder {
                api_key: config.api_key,
                endpoint,
                default_model: config.default_model,
            },
        })
    }

    /// Model used when the voice configuration does not name one.
    pub fn default_model(&self) -> OpenAITTSModel {
        self.request_builder.default_model
    }

    /// Fully-qualified speech endpoint.
    pub fn endpoint(&self) -> &str {
        &self.request_builder.endpoint
    }

    async fn try_synthesize(&self, request: &SynthesisRequest) -> TTSResult<SynthesisResult> {
        check_request_text(request, MAX_TEXT_LENGTH)?;

        let audio = self
            .provider
            .generic_synthesize(&self.request_builder, request)
            .await?;
        write_audio(&request.destination, &audio).await?;

        let artifact = build_artifact(ProviderKind::OpenAI, request, audio.len() as u64);
        let model = self.request_builder.model_for(&request.voice_config);
        let cost = self.cost_for_model(request.text.chars().count(), model);

        info!(
            job_id = %request.job_id,
            path = %request.destination.display(),
            duration_s = format!("{:.1}", artifact.duration_seconds),
            "Generated OpenAI audio"
        );

        let response = json!({
            "model": model.as_str(),
            "voice": OpenAIVoice::from_str_or_default(&request.voice_config.voice_id).as_str(),
            "duration": artifact.duration_seconds,
            "size": artifact.size_bytes,
        });
        Ok(SynthesisResult::success(artifact, cost, response))
    }

    fn cost_for_model(&self, chars: usize, model: OpenAITTSModel) -> u32 {
        let rate = get_tts_price("openai", model.as_str()).unwrap_or(1500);
        cost_cents_for_chars(chars, rate)
    }
}

#[async_trait]
impl BaseTTS for OpenAITTS {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAI
    }

    async fn synthesize(&self, request: &SynthesisRequest) -> SynthesisResult {
        match self.try_synthesize(request).await {
            Ok(result) => result,
            Err(e) => {
                error!(job_id = %request.job_id, error = %e, "OpenAI TTS synthesis failed");
                SynthesisResult::failure(e.kind(), format!("OpenAI TTS error: {e}"))
            }
        }
    }

    fn get_limits(&self) -> ProviderLimits {
        ProviderLimits {
            max_characters: MAX_TEXT_LENGTH,
            max_requests_per_minute: 50,
            cost_per_million_characters: get_tts_price("openai", self.default_model().as_str())
                .unwrap_or(1500),
            supported_formats: vec![
                AudioFormat::Mp3,
                AudioFormat::Ogg,
                AudioFormat::Flac,
                AudioFormat::Wav,
            ],
            supported_languages: vec!["en".to_string()],
            speed_range: SPEED_RANGE,
            pitch_range: None,
            volume_gain_range: None,
        }
    }

    fn validate_config(&self, config: &VoiceConfig) -> bool {
        if config.provider != ProviderKind::OpenAI {
            return false;
        }

        if OpenAIVoice::parse(&config.voice_id).is_none() {
            warn!(voice = %config.voice_id, "Voice not available in OpenAI TTS");
            return false;
        }

        let limits = self.get_limits();
        if !limits.speed_in_range(config.speed) {
            return false;
        }
        if !limits.supports_format(config.audio_format) {
            return false;
        }

        if config.pitch != 0.0 {
            warn!("OpenAI TTS doesn't support pitch adjustment");
        }
        if config.volume_gain_db != 0.0 {
            warn!("OpenAI TTS doesn't support volume gain");
        }

        true
    }

    fn estimate_cost(&self, text: &str, _voice_id: Option<&str>) -> u32 {
        self.cost_for_model(text.chars().count(), self.default_model())
    }

    fn list_available_voices(&self) -> Vec<String> {
        OpenAIVoice::all()
            .iter()
            .map(|v| v.as_str().to_string())
            .collect()
    }

    fn get_provider_info(&self) -> serde_json::Value {
        let characteristics: serde_json::Map<String, serde_json::Value> = OpenAIVoice::all()
            .iter()
            .map(|v| (v.as_str().to_string(), json!(v.characteristics())))
            .collect();

        json!({
            "provider": "openai",
            "api_type": "HTTP REST",
            "endpoint": self.endpoint(),
            "default_model": self.default_model().as_str(),
            "supported_models": ["tts-1", "tts-1-hd", "gpt-4o-mini-tts"],
            "supported_formats": ["mp3", "opus", "flac", "wav"],
            "default_sample_rate": 24000,
            "speed_range": { "min": SPEED_RANGE.0, "max": SPEED_RANGE.1, "default": 1.0 },
            "voices": characteristics,
            "documentation": "https://platform.openai.com/docs/api-reference/audio/createSpeech",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tts::base::JobId;

    fn tts() -> OpenAITTS {
        OpenAITTS::new(OpenAITTSConfig {
            api_key: "test_key".to_string(),
            ..Default::default()
        })
        .unwrap()
    }

    fn request(text: &str, config: VoiceConfig) -> SynthesisRequest {
        SynthesisRequest {
            job_id: JobId::new("job_1"),
            text: text.to_string(),
            voice_config: config,
            destination: "out.mp3".into(),
        }
    }

    #[test]
    fn test_requires_api_key() {
        let result = OpenAITTS::new(OpenAITTSConfig::default());
        assert!(matches!(result, Err(TTSError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_rejects_invalid_base_url() {
        let result = OpenAITTS::new(OpenAITTSConfig {
            api_key: "k".to_string(),
            base_url: "not a url".to_string(),
            ..Default::default()
        });
        assert!(matches!(result, Err(TTSError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_default_endpoint() {
        assert_eq!(tts().endpoint(), OPENAI_TTS_URL);
    }

    #[test]
    fn test_http_request_building() {
        let tts = tts();
        let mut config = VoiceConfig::new(ProviderKind::OpenAI, "fairer_tales_narrator");
        config.speed = 1.5;
        config
            .extra_params
            .insert("model".to_string(), json!("tts-1-hd"));

        let client = reqwest::Client::new();
        let built = tts
            .request_builder
            .build_http_request(&client, &request("Hello world", config))
            .build()
            .unwrap();

        assert_eq!(built.url().as_str(), OPENAI_TTS_URL);
        assert_eq!(built.headers().get("Authorization").unwrap(), "Bearer test_key");

        let body: serde_json::Value =
            serde_json::from_slice(built.body().unwrap().as_bytes().unwrap()).unwrap();
        assert_eq!(body["model"], "tts-1-hd");
        assert_eq!(body["voice"], "ash");
        assert_eq!(body["input"], "Hello world");
        assert_eq!(body["response_format"], "mp3");
        assert_eq!(body["speed"], 1.5);
    }

    #[test]
    fn test_default_speed_is_omitted() {
        let tts = tts();
        let client = reqwest::Client::new();
        let built = tts
            .request_builder
            .build_http_request(
                &client,
                &request("Hi", VoiceConfig::new(ProviderKind::OpenAI, "nova")),
            )
            .build()
            .unwrap();
        let body: serde_json::Value =
            serde_json::from_slice(built.body().unwrap().as_bytes().unwrap()).unwrap();
        assert!(body.get("speed").is_none());
        assert_eq!(body["model"], "tts-1");
    }

    #[test]
    fn test_validate_config() {
        let tts = tts();
        let good = VoiceConfig::new(ProviderKind::OpenAI, "ash");
        assert!(tts.validate_config(&good));

        let wrong_provider = VoiceConfig::new(ProviderKind::Google, "ash");
        assert!(!tts.validate_config(&wrong_provider));

        let unknown_voice = VoiceConfig::new(ProviderKind::OpenAI, "en-US-Neural2-J");
        assert!(!tts.validate_config(&unknown_voice));

        let mut too_fast = good.clone();
        too_fast.speed = 5.0;
        assert!(!tts.validate_config(&too_fast));
    }

    #[test]
    fn test_unsupported_pitch_is_only_a_notice() {
        let mut config = VoiceConfig::new(ProviderKind::OpenAI, "onyx");
        config.pitch = 3.0;
        config.volume_gain_db = -2.0;
        assert!(tts().validate_config(&config));
    }

    #[test]
    fn test_estimate_cost() {
        let tts = tts();
        assert_eq!(tts.estimate_cost("short", None), 1);
        assert_eq!(tts.estimate_cost(&"a".repeat(1_000_000), None), 1500);
        assert_eq!(tts.estimate_cost(&"a".repeat(2_000_000), Some("ash")), 3000);
    }

    #[test]
    fn test_estimate_cost_never_decreases() {
        for model in [OpenAITTSModel::Tts1, OpenAITTSModel::Tts1Hd, OpenAITTSModel::Gpt4oMiniTts] {
            let tts = OpenAITTS::new(OpenAITTSConfig {
                api_key: "test_key".to_string(),
                default_model: model,
                ..Default::default()
            })
            .unwrap();
            let mut previous = 0;
            for len in (0..=20_000).step_by(250) {
                let cost = tts.estimate_cost(&"a".repeat(len), None);
                assert!(cost >= 1, "{model} at {len} chars");
                assert!(cost >= previous, "{model} dropped at {len} chars");
                previous = cost;
            }
        }
    }

    #[test]
    fn test_limits() {
        let limits = tts().get_limits();
        assert_eq!(limits.max_characters, 4096);
        assert_eq!(limits.speed_range, (0.25, 4.0));
        assert!(limits.pitch_range.is_none());
    }

    #[tokio::test]
    async fn test_empty_text_fails_without_network() {
        let tts = OpenAITTS::new(OpenAITTSConfig {
            api_key: "k".to_string(),
            // Unroutable: any network attempt would fail differently
            base_url: "http://127.0.0.1:9".to_string(),
            ..Default::default()
        })
        .unwrap();
        let result = tts
            .synthesize(&request("  ", VoiceConfig::new(ProviderKind::OpenAI, "ash")))
            .await;
        assert!(!result.success);
        assert!(result.error_message.unwrap().contains("must not be empty"));
    }

    #[test]
    fn test_provider_info() {
        let info = tts().get_provider_info();
        assert_eq!(info["provider"], "openai");
        assert_eq!(info["voices"]["onyx"], "Deep, serious - ideal for dark stories");
    }
}
