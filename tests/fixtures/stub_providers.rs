//! In-process speech-synthesis backends with scripted behavior.
//!
//! Every call is appended to a shared [`CallLog`], so tests can assert which
//! backends were invoked and in what order.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use longform_tts::core::tts::provider::{build_artifact, write_audio};
use longform_tts::{
    AudioFormat, BaseTTS, ProviderKind, ProviderLimits, SynthesisErrorKind, SynthesisRequest,
    SynthesisResult, VoiceConfig,
};

use super::audio_fixtures::{fake_mp3, generate_speech_pattern, wav_bytes};

/// Samples of generated speech per input character
pub const SAMPLES_PER_CHAR: usize = 10;

/// One observed `synthesize` call
#[derive(Debug, Clone)]
pub struct CallRecord {
    pub provider: ProviderKind,
    pub job_id: String,
    pub text: String,
    pub voice_config: VoiceConfig,
}

pub type CallLog = Arc<Mutex<Vec<CallRecord>>>;

pub fn call_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn calls(log: &CallLog) -> Vec<CallRecord> {
    log.lock().unwrap().clone()
}

#[derive(Debug, Clone)]
pub enum StubBehavior {
    Succeed,
    Fail,
    /// Fail when the request text contains the marker
    FailWhenContains(String),
    /// Sleep before succeeding
    Hang(Duration),
}

pub struct StubProvider {
    kind: ProviderKind,
    max_characters: usize,
    max_requests_per_minute: u32,
    supported_formats: Vec<AudioFormat>,
    behavior: StubBehavior,
    log: CallLog,
}

impl StubProvider {
    pub fn new(kind: ProviderKind, log: &CallLog) -> Self {
        Self {
            kind,
            max_characters: kind.default_max_characters(),
            max_requests_per_minute: 100,
            supported_formats: vec![AudioFormat::Mp3, AudioFormat::Wav, AudioFormat::Flac],
            behavior: StubBehavior::Succeed,
            log: log.clone(),
        }
    }

    pub fn failing(kind: ProviderKind, log: &CallLog) -> Self {
        Self::new(kind, log).with_behavior(StubBehavior::Fail)
    }

    pub fn with_behavior(mut self, behavior: StubBehavior) -> Self {
        self.behavior = behavior;
        self
    }

    pub fn with_max_characters(mut self, max_characters: usize) -> Self {
        self.max_characters = max_characters;
        self
    }

    pub fn with_formats(mut self, formats: &[AudioFormat]) -> Self {
        self.supported_formats = formats.to_vec();
        self
    }

    fn fails_on(&self, text: &str) -> bool {
        match &self.behavior {
            StubBehavior::Fail => true,
            StubBehavior::FailWhenContains(marker) => text.contains(marker.as_str()),
            _ => false,
        }
    }
}

#[async_trait]
impl BaseTTS for StubProvider {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    async fn synthesize(&self, request: &SynthesisRequest) -> SynthesisResult {
        self.log.lock().unwrap().push(CallRecord {
            provider: self.kind,
            job_id: request.job_id.to_string(),
            text: request.text.clone(),
            voice_config: request.voice_config.clone(),
        });

        if let StubBehavior::Hang(delay) = &self.behavior {
            tokio::time::sleep(*delay).await;
        }

        if self.fails_on(&request.text) {
            return SynthesisResult::failure(
                SynthesisErrorKind::TransientProvider,
                format!("{} stub failure", self.kind),
            );
        }

        let chars = request.text.chars().count();
        let audio = match AudioFormat::from_path(&request.destination) {
            Some(AudioFormat::Wav) => wav_bytes(&generate_speech_pattern(chars * SAMPLES_PER_CHAR)),
            _ => fake_mp3(request.text.as_bytes()),
        };
        if let Err(e) = write_audio(&request.destination, &audio).await {
            return SynthesisResult::from_error(&e);
        }

        let artifact = build_artifact(self.kind, request, audio.len() as u64);
        SynthesisResult::success(
            artifact,
            self.estimate_cost(&request.text, None),
            serde_json::json!({ "stub": self.kind.as_str() }),
        )
    }

    fn get_limits(&self) -> ProviderLimits {
        ProviderLimits {
            max_characters: self.max_characters,
            max_requests_per_minute: self.max_requests_per_minute,
            cost_per_million_characters: 1_000_000,
            supported_formats: self.supported_formats.clone(),
            supported_languages: vec!["en-US".to_string()],
            speed_range: (0.25, 4.0),
            pitch_range: None,
            volume_gain_range: None,
        }
    }

    fn validate_config(&self, config: &VoiceConfig) -> bool {
        config.provider == self.kind && !config.voice_id.is_empty()
    }

    /// One cent per started 100 characters
    fn estimate_cost(&self, text: &str, _voice_id: Option<&str>) -> u32 {
        (text.chars().count() as u32).div_ceil(100).max(1)
    }

    fn list_available_voices(&self) -> Vec<String> {
        vec!["stub-voice".to_string()]
    }
}
