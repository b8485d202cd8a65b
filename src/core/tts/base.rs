//! Base traits and types for speech-synthesis backends.
//!
//! This module defines the value objects shared by every backend and by the
//! orchestrator, the `TTSError` taxonomy, and the `BaseTTS` capability contract
//! that each concrete backend implements.
//!
//! # Ownership
//!
//! Every type here is a value object. A `VoiceConfig` is owned by the caller and
//! cloned into each request; fallback requests use a copy with only the
//! `provider` field swapped. `AudioArtifact`s are never mutated once created:
//! combining artifacts produces a new one.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur while talking to a speech-synthesis backend.
#[derive(Debug, Error)]
pub enum TTSError {
    /// Configuration rejected before any network I/O
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// No backend registered for the requested provider
    #[error("Provider {0} not available")]
    ProviderNotRegistered(ProviderKind),

    /// Voice is not part of the backend's catalog
    #[error("Voice {voice} not available for {provider}")]
    UnsupportedVoice { provider: ProviderKind, voice: String },

    /// Transport-level failure (DNS, TLS, connection reset, ...)
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Backend answered with a non-success status
    #[error("Provider error ({status}): {message}")]
    ProviderError { status: u16, message: String },

    /// Backend quota exhausted
    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    /// Request deadline expired
    #[error("Request timed out after {0}s")]
    Timeout(u64),

    /// Backend answered but the audio payload was unusable
    #[error("Audio generation failed: {0}")]
    AudioGenerationFailed(String),

    /// Writing the audio to its destination failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TTSError {
    /// Classify this error within the pipeline failure taxonomy.
    pub fn kind(&self) -> SynthesisErrorKind {
        match self {
            Self::InvalidConfiguration(_)
            | Self::ProviderNotRegistered(_)
            | Self::UnsupportedVoice { .. } => SynthesisErrorKind::Configuration,
            _ => SynthesisErrorKind::TransientProvider,
        }
    }
}

impl From<reqwest::Error> for TTSError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::NetworkError(format!("request timed out: {err}"))
        } else {
            Self::NetworkError(err.to_string())
        }
    }
}

/// Result alias for backend operations.
pub type TTSResult<T> = Result<T, TTSError>;

/// Failure classes surfaced on a failed `SynthesisResult`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SynthesisErrorKind {
    /// Unregistered provider, unknown voice, parameter out of range, blank text
    Configuration,
    /// Network/API failure during a synthesize call
    TransientProvider,
    /// One chunk of a multi-chunk job failed after its own fallback (1-based index)
    ChunkFailure { index: usize },
    /// Stitching chunk audio into the final artifact failed
    Concatenation,
}

impl fmt::Display for SynthesisErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration => write!(f, "ConfigurationError"),
            Self::TransientProvider => write!(f, "TransientProviderError"),
            Self::ChunkFailure { index } => write!(f, "ChunkFailure(chunk {index})"),
            Self::Concatenation => write!(f, "ConcatenationFailure"),
        }
    }
}

// =============================================================================
// Provider / Format Enums
// =============================================================================

/// Closed set of speech-synthesis backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Google Cloud Text-to-Speech
    Google,
    /// OpenAI Audio Speech API
    #[serde(rename = "openai")]
    OpenAI,
}

impl ProviderKind {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::OpenAI => "openai",
        }
    }

    /// Per-request character ceiling declared by the backend.
    pub fn default_max_characters(&self) -> usize {
        match self {
            // 5000 bytes per request, 4000 characters leaves room for multibyte text
            Self::Google => 4000,
            Self::OpenAI => 4096,
        }
    }

    pub fn all() -> &'static [ProviderKind] {
        &[Self::Google, Self::OpenAI]
    }

    /// Parse a provider name, accepting common aliases.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "google" | "google-cloud" | "gcp" => Some(Self::Google),
            "openai" | "open-ai" | "open_ai" => Some(Self::OpenAI),
            _ => None,
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = TTSError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| {
            TTSError::InvalidConfiguration(format!(
                "Unsupported TTS provider: {s}. Supported providers: google, openai"
            ))
        })
    }
}

/// Audio container formats understood by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    #[default]
    Mp3,
    Wav,
    Flac,
    Ogg,
}

impl AudioFormat {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Wav => "wav",
            Self::Flac => "flac",
            Self::Ogg => "ogg",
        }
    }

    /// File extension used for scratch files of this format.
    #[inline]
    pub fn extension(&self) -> &'static str {
        self.as_str()
    }

    /// Parse from string, with fallback to default.
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "mp3" | "mpeg" => Self::Mp3,
            "wav" | "wave" | "linear16" => Self::Wav,
            "flac" => Self::Flac,
            "ogg" | "opus" | "ogg_opus" => Self::Ogg,
            _ => Self::default(),
        }
    }

    /// Infer the format from a file extension.
    pub fn from_path(path: &std::path::Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "mp3" => Some(Self::Mp3),
            "wav" => Some(Self::Wav),
            "flac" => Some(Self::Flac),
            "ogg" | "opus" => Some(Self::Ogg),
            _ => None,
        }
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Voice Configuration
// =============================================================================

/// Voice and provider selection for a synthesis call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceConfig {
    /// Backend that should synthesize the text
    pub provider: ProviderKind,
    /// Provider voice identifier or narrator alias
    pub voice_id: String,
    /// BCP-47 language code (e.g. "en-US")
    pub language_code: String,
    /// Speaking rate multiplier (1.0 = normal)
    #[serde(default = "default_speed")]
    pub speed: f32,
    /// Pitch shift in semitones
    #[serde(default)]
    pub pitch: f32,
    /// Volume gain in dB
    #[serde(default)]
    pub volume_gain_db: f32,
    /// Output sample rate in Hz
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    /// Output container
    #[serde(default)]
    pub audio_format: AudioFormat,
    /// Provider-specific parameters (e.g. `model` for OpenAI)
    #[serde(default)]
    pub extra_params: HashMap<String, serde_json::Value>,
}

fn default_speed() -> f32 {
    1.0
}

fn default_sample_rate() -> u32 {
    24000
}

impl VoiceConfig {
    /// Create a configuration with default prosody for the given provider and voice.
    pub fn new(provider: ProviderKind, voice_id: impl Into<String>) -> Self {
        Self {
            provider,
            voice_id: voice_id.into(),
            language_code: "en-US".to_string(),
            speed: default_speed(),
            pitch: 0.0,
            volume_gain_db: 0.0,
            sample_rate: default_sample_rate(),
            audio_format: AudioFormat::default(),
            extra_params: HashMap::new(),
        }
    }

    /// Copy of this configuration targeting a different backend.
    ///
    /// Only `provider` changes; the original is left untouched.
    pub fn with_provider(&self, provider: ProviderKind) -> Self {
        Self {
            provider,
            ..self.clone()
        }
    }

    /// String-valued extra parameter, if present.
    pub fn extra_str(&self, key: &str) -> Option<&str> {
        self.extra_params.get(key).and_then(|v| v.as_str())
    }
}

// =============================================================================
// Provider Limits
// =============================================================================

/// Static declaration of a backend's limits and capabilities.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderLimits {
    pub max_characters: usize,
    pub max_requests_per_minute: u32,
    /// List price in cents per one million characters for the default tier
    pub cost_per_million_characters: u32,
    pub supported_formats: Vec<AudioFormat>,
    pub supported_languages: Vec<String>,
    /// Inclusive (min, max) speaking rate
    pub speed_range: (f32, f32),
    /// Inclusive (min, max) pitch in semitones; `None` when pitch is not supported
    pub pitch_range: Option<(f32, f32)>,
    /// Inclusive (min, max) volume gain in dB; `None` when gain is not supported
    pub volume_gain_range: Option<(f32, f32)>,
}

impl ProviderLimits {
    #[inline]
    pub fn speed_in_range(&self, speed: f32) -> bool {
        speed >= self.speed_range.0 && speed <= self.speed_range.1
    }

    pub fn supports_format(&self, format: AudioFormat) -> bool {
        self.supported_formats.contains(&format)
    }
}

// =============================================================================
// Requests, Artifacts and Results
// =============================================================================

/// Identifier of one synthesis job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fresh, globally unique job identifier.
    pub fn generate() -> Self {
        Self(format!("job_{}", uuid::Uuid::new_v4().simple()))
    }

    /// Identifier of the n-th (1-based) chunk of this job.
    pub fn chunk(&self, index: usize) -> Self {
        Self(format!("{}_chunk_{index}", self.0))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One synthesize call against one backend.
#[derive(Debug, Clone)]
pub struct SynthesisRequest {
    pub job_id: JobId,
    pub text: String,
    pub voice_config: VoiceConfig,
    /// Where the backend must write the audio bytes
    pub destination: PathBuf,
}

/// A produced audio file together with its descriptive metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AudioArtifact {
    pub id: String,
    pub file_location: PathBuf,
    pub duration_seconds: f64,
    pub size_bytes: u64,
    pub format: AudioFormat,
    pub sample_rate: u32,
    /// Estimated bitrate in kbps
    pub bitrate: u32,
    pub voice_config: VoiceConfig,
    #[serde(with = "time::serde::rfc3339")]
    pub generated_at: OffsetDateTime,
    pub source_text: String,
}

impl AudioArtifact {
    #[inline]
    pub fn duration_minutes(&self) -> f64 {
        self.duration_seconds / 60.0
    }

    pub fn exists(&self) -> bool {
        self.file_location.exists()
    }
}

/// Terminal outcome of a synthesis call or job.
///
/// `audio_artifact` is present if and only if `success` is true. Use the
/// `success`/`failure` constructors to keep that invariant.
#[derive(Debug, Clone, Serialize)]
pub struct SynthesisResult {
    pub success: bool,
    pub audio_artifact: Option<AudioArtifact>,
    pub error_message: Option<String>,
    pub error_kind: Option<SynthesisErrorKind>,
    pub cost_cents: Option<u32>,
    pub provider_response: serde_json::Value,
}

impl SynthesisResult {
    pub fn success(artifact: AudioArtifact, cost_cents: u32, provider_response: serde_json::Value) -> Self {
        Self {
            success: true,
            audio_artifact: Some(artifact),
            error_message: None,
            error_kind: None,
            cost_cents: Some(cost_cents),
            provider_response,
        }
    }

    pub fn failure(kind: SynthesisErrorKind, message: impl Into<String>) -> Self {
        Self {
            success: false,
            audio_artifact: None,
            error_message: Some(message.into()),
            error_kind: Some(kind),
            cost_cents: Some(0),
            provider_response: serde_json::Value::Null,
        }
    }

    /// Failure result carrying the classification of a backend error.
    pub fn from_error(err: &TTSError) -> Self {
        Self::failure(err.kind(), err.to_string())
    }

    pub fn error_kind(&self) -> Option<SynthesisErrorKind> {
        self.error_kind
    }
}

// =============================================================================
// Backend Contract
// =============================================================================

/// Capability contract implemented by every speech-synthesis backend.
///
/// `synthesize` never returns an error: all failures are folded into a failed
/// `SynthesisResult` with a human-readable message.
#[async_trait]
pub trait BaseTTS: Send + Sync {
    /// Which provider this backend implements.
    fn kind(&self) -> ProviderKind;

    /// Synthesize `request.text` and write the audio to `request.destination`.
    async fn synthesize(&self, request: &SynthesisRequest) -> SynthesisResult;

    /// Static limits declaration, no I/O.
    fn get_limits(&self) -> ProviderLimits;

    /// Check provider identity, voice availability and parameter ranges.
    fn validate_config(&self, config: &VoiceConfig) -> bool;

    /// Estimated cost in cents, at least 1.
    fn estimate_cost(&self, text: &str, voice_id: Option<&str>) -> u32;

    /// Voice identifiers in catalog order.
    fn list_available_voices(&self) -> Vec<String>;

    /// Descriptive metadata about the backend.
    fn get_provider_info(&self) -> serde_json::Value {
        serde_json::json!({ "provider": self.kind().as_str() })
    }
}

/// Shared handle to a backend.
pub type BoxedTTS = Arc<dyn BaseTTS>;
