//! Google Cloud Text-to-Speech provider implementation.
//!
//! Uses the REST endpoint `POST /v1/text:synthesize?key=...`. The response
//! carries the audio as base64 in `audioContent`.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use bytes::Bytes;
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info, warn};

use super::config::{
    GoogleTTSConfig, MAX_TEXT_LENGTH, SsmlGender, VOICE_CATALOG, audio_encoding, catalog_voice,
    language_of, pricing_tier, resolve_voice_name,
};
use crate::config::pricing::{cost_cents_for_chars, get_tts_price};
use crate::core::tts::base::{
    AudioFormat, BaseTTS, ProviderKind, ProviderLimits, SynthesisRequest, SynthesisResult,
    TTSError, TTSResult, VoiceConfig,
};
use crate::core::tts::provider::{
    TTSProvider, TTSRequestBuilder, build_artifact, check_request_text, write_audio,
};

/// Synthesize endpoint path, relative to the API base URL
pub const GOOGLE_TTS_PATH: &str = "/v1/text:synthesize";

const SPEED_RANGE: (f32, f32) = (0.25, 4.0);
const PITCH_RANGE: (f32, f32) = (-20.0, 20.0);
const VOLUME_GAIN_RANGE: (f32, f32) = (-96.0, 16.0);

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeResponse {
    #[serde(default)]
    audio_content: String,
}

// =============================================================================
// Request Builder
// =============================================================================

#[derive(Clone)]
struct GoogleRequestBuilder {
    api_key: String,
    endpoint: String,
}

impl TTSRequestBuilder for GoogleRequestBuilder {
    fn build_http_request(
        &self,
        client: &reqwest::Client,
        request: &SynthesisRequest,
    ) -> reqwest::RequestBuilder {
        let config = &request.voice_config;
        let voice_name = resolve_voice_name(&config.voice_id);
        let language_code = language_of(&voice_name)
            .map(str::to_string)
            .unwrap_or_else(|| config.language_code.clone());

        let body = json!({
            "input": { "text": request.text },
            "voice": {
                "languageCode": language_code,
                "name": voice_name,
                "ssmlGender": SsmlGender::for_voice(&voice_name).as_str(),
            },
            "audioConfig": {
                "audioEncoding": audio_encoding(config.audio_format),
                "sampleRateHertz": config.sample_rate,
                "speakingRate": config.speed.clamp(SPEED_RANGE.0, SPEED_RANGE.1),
                "pitch": config.pitch.clamp(PITCH_RANGE.0, PITCH_RANGE.1),
                "volumeGainDb": config.volume_gain_db.clamp(VOLUME_GAIN_RANGE.0, VOLUME_GAIN_RANGE.1),
            },
        });

        client
            .post(&self.endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
    }

    fn decode_audio(&self, body: Bytes) -> TTSResult<Bytes> {
        let response: SynthesizeResponse = serde_json::from_slice(&body).map_err(|e| {
            TTSError::AudioGenerationFailed(format!("unexpected synthesize response: {e}"))
        })?;
        let audio = BASE64.decode(response.audio_content.as_bytes()).map_err(|e| {
            TTSError::AudioGenerationFailed(format!("invalid base64 audioContent: {e}"))
        })?;
        Ok(Bytes::from(audio))
    }
}

// =============================================================================
// Google TTS Provider
// =============================================================================

/// Google Cloud Text-to-Speech backend.
///
/// Neural2 voices are the cost-effective default for long narration; Chirp 3
/// HD voices are available through the `myths_*` aliases.
pub struct GoogleTTS {
    provider: TTSProvider,
    request_builder: GoogleRequestBuilder,
}

impl GoogleTTS {
    pub fn new(config: GoogleTTSConfig) -> TTSResult<Self> {
        if config.api_key.trim().is_empty() {
            return Err(TTSError::InvalidConfiguration(
                "Google TTS API key is required".to_string(),
            ));
        }

        let endpoint = format!("{}{}", config.base_url.trim_end_matches('/'), GOOGLE_TTS_PATH);
        url::Url::parse(&endpoint).map_err(|e| {
            TTSError::InvalidConfiguration(format!("invalid Google base URL {}: {e}", config.base_url))
        })?;

        let provider = TTSProvider::new(config.request_timeout)?;
        info!("Google TTS provider initialized");

        Ok(Self {
            provider,
            request_builder: GoogleRequestBuilder {
                api_key: config.api_key,
                endpoint,
            },
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.request_builder.endpoint
    }

    async fn try_synthesize(&self, request: &SynthesisRequest) -> TTSResult<SynthesisResult> {
        check_request_text(request, MAX_TEXT_LENGTH)?;
        let format = request.voice_config.audio_format;
        if !self.get_limits().supports_format(format) {
            return Err(TTSError::InvalidConfiguration(format!(
                "Google TTS cannot produce {format} audio"
            )));
        }

        let audio = self
            .provider
            .generic_synthesize(&self.request_builder, request)
            .await?;
        write_audio(&request.destination, &audio).await?;

        let artifact = build_artifact(ProviderKind::Google, request, audio.len() as u64);
        let voice_name = resolve_voice_name(&request.voice_config.voice_id);
        let cost = self.estimate_cost(&request.text, Some(&voice_name));

        info!(
            job_id = %request.job_id,
            path = %request.destination.display(),
            duration_s = format!("{:.1}", artifact.duration_seconds),
            size = artifact.size_bytes,
            "Generated Google audio"
        );

        let response = json!({
            "voice": voice_name,
            "duration": artifact.duration_seconds,
            "size": artifact.size_bytes,
        });
        Ok(SynthesisResult::success(artifact, cost, response))
    }
}

#[async_trait]
impl BaseTTS for GoogleTTS {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Google
    }

    async fn synthesize(&self, request: &SynthesisRequest) -> SynthesisResult {
        match self.try_synthesize(request).await {
            Ok(result) => result,
            Err(e) => {
                error!(job_id = %request.job_id, error = %e, "Google TTS synthesis failed");
                SynthesisResult::failure(e.kind(), format!("Google TTS error: {e}"))
            }
        }
    }

    fn get_limits(&self) -> ProviderLimits {
        ProviderLimits {
            max_characters: MAX_TEXT_LENGTH,
            max_requests_per_minute: 100,
            cost_per_million_characters: get_tts_price("google", "neural2").unwrap_or(400),
            supported_formats: vec![AudioFormat::Mp3, AudioFormat::Wav, AudioFormat::Ogg],
            supported_languages: ["en-US", "en-GB", "es-ES", "fr-FR", "de-DE"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            speed_range: SPEED_RANGE,
            pitch_range: Some(PITCH_RANGE),
            volume_gain_range: Some(VOLUME_GAIN_RANGE),
        }
    }

    fn validate_config(&self, config: &VoiceConfig) -> bool {
        if config.provider != ProviderKind::Google {
            return false;
        }

        if catalog_voice(&config.voice_id).is_none() {
            warn!(voice = %config.voice_id, "Voice not available in Google TTS");
            return false;
        }

        let limits = self.get_limits();
        if !limits.speed_in_range(config.speed) {
            return false;
        }
        if !(PITCH_RANGE.0..=PITCH_RANGE.1).contains(&config.pitch) {
            return false;
        }
        if !(VOLUME_GAIN_RANGE.0..=VOLUME_GAIN_RANGE.1).contains(&config.volume_gain_db) {
            return false;
        }

        limits.supports_format(config.audio_format)
    }

    fn estimate_cost(&self, text: &str, voice_id: Option<&str>) -> u32 {
        let rate = get_tts_price("google", pricing_tier(voice_id)).unwrap_or(400);
        cost_cents_for_chars(text.chars().count(), rate)
    }

    fn list_available_voices(&self) -> Vec<String> {
        VOICE_CATALOG.iter().map(|v| v.to_string()).collect()
    }

    fn get_provider_info(&self) -> serde_json::Value {
        json!({
            "provider": "google",
            "api_type": "HTTP REST",
            "endpoint": self.endpoint(),
            "supported_formats": ["mp3", "wav", "ogg"],
            "supported_encodings": ["MP3", "LINEAR16", "OGG_OPUS"],
            "speed_range": { "min": SPEED_RANGE.0, "max": SPEED_RANGE.1, "default": 1.0 },
            "pitch_range": { "min": PITCH_RANGE.0, "max": PITCH_RANGE.1 },
            "voices": VOICE_CATALOG,
            "documentation": "https://cloud.google.com/text-to-speech/docs",
        })
    }
}
