//! Configuration types for OpenAI TTS API.
//!
//! This module contains configuration types for OpenAI's text-to-speech API:
//! - Model selection (tts-1, tts-1-hd, gpt-4o-mini-tts)
//! - Voice catalog, narrator aliases and voice characteristics
//! - Response format mapping and backend settings

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::tts::base::AudioFormat;

/// Default OpenAI API base URL
pub const OPENAI_API_BASE: &str = "https://api.openai.com";

/// Maximum characters accepted per speech request.
pub const MAX_TEXT_LENGTH: usize = 4096;

// =============================================================================
// OpenAI TTS Models
// =============================================================================

/// Supported OpenAI TTS models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OpenAITTSModel {
    /// Standard quality, cost-effective
    #[default]
    #[serde(rename = "tts-1")]
    Tts1,
    /// High definition quality
    #[serde(rename = "tts-1-hd")]
    Tts1Hd,
    #[serde(rename = "gpt-4o-mini-tts")]
    Gpt4oMiniTts,
}

impl OpenAITTSModel {
    /// Convert to the API parameter value.
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tts1 => "tts-1",
            Self::Tts1Hd => "tts-1-hd",
            Self::Gpt4oMiniTts => "gpt-4o-mini-tts",
        }
    }

    /// Parse from string, with fallback to default.
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "tts-1" | "tts1" | "standard" => Self::Tts1,
            "tts-1-hd" | "tts1-hd" | "tts1hd" | "hd" => Self::Tts1Hd,
            "gpt-4o-mini-tts" | "gpt4o-mini-tts" => Self::Gpt4oMiniTts,
            _ => Self::default(),
        }
    }
}

impl std::fmt::Display for OpenAITTSModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// OpenAI TTS Voices
// =============================================================================

/// Available voices for OpenAI TTS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpenAIVoice {
    #[default]
    Alloy,
    Ash,
    Echo,
    Fable,
    Onyx,
    Nova,
    Shimmer,
}

impl OpenAIVoice {
    /// Convert to the API parameter value.
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Alloy => "alloy",
            Self::Ash => "ash",
            Self::Echo => "echo",
            Self::Fable => "fable",
            Self::Onyx => "onyx",
            Self::Nova => "nova",
            Self::Shimmer => "shimmer",
        }
    }

    /// Parse a voice name or narrator alias.
    pub fn parse(s: &str) -> Option<Self> {
        let lowered = s.to_lowercase();
        let name = resolve_alias(&lowered).unwrap_or(lowered.as_str());
        match name {
            "alloy" => Some(Self::Alloy),
            "ash" => Some(Self::Ash),
            "echo" => Some(Self::Echo),
            "fable" => Some(Self::Fable),
            "onyx" => Some(Self::Onyx),
            "nova" => Some(Self::Nova),
            "shimmer" => Some(Self::Shimmer),
            _ => None,
        }
    }

    /// Parse from string, with fallback to default.
    pub fn from_str_or_default(s: &str) -> Self {
        Self::parse(s).unwrap_or_default()
    }

    /// Get all available voices.
    pub fn all() -> &'static [OpenAIVoice] {
        &[
            Self::Alloy,
            Self::Echo,
            Self::Fable,
            Self::Onyx,
            Self::Nova,
            Self::Shimmer,
            Self::Ash,
        ]
    }

    /// Short description of the voice's delivery.
    pub fn characteristics(&self) -> &'static str {
        match self {
            Self::Ash => "Warm, engaging storyteller",
            Self::Nova => "Bright, dynamic - good for lighter content",
            Self::Onyx => "Deep, serious - ideal for dark stories",
            Self::Echo => "Expressive, dramatic - great for emotional scenes",
            Self::Fable => "Gentle, comforting",
            Self::Shimmer => "Soft, mysterious",
            Self::Alloy => "Neutral, reliable - good backup option",
        }
    }
}

impl std::fmt::Display for OpenAIVoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Narrator aliases mapped to catalog voices.
const VOICE_ALIASES: &[(&str, &str)] = &[
    ("fairer_tales_narrator", "ash"),
    ("fairer_tales_dramatic", "nova"),
    ("fairer_tales_warm", "shimmer"),
    ("fairer_tales_serious", "onyx"),
    ("fairer_tales_expressive", "echo"),
    ("fairer_tales_gentle", "fable"),
];

/// Resolve a narrator alias to a catalog voice name.
pub fn resolve_alias(alias: &str) -> Option<&'static str> {
    VOICE_ALIASES
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(alias))
        .map(|(_, voice)| *voice)
}

// =============================================================================
// Response Format
// =============================================================================

/// `response_format` parameter for a pipeline audio format.
pub fn response_format(format: AudioFormat) -> &'static str {
    match format {
        AudioFormat::Mp3 => "mp3",
        AudioFormat::Wav => "wav",
        AudioFormat::Flac => "flac",
        AudioFormat::Ogg => "opus",
    }
}

// =============================================================================
// Backend Settings
// =============================================================================

/// Settings for constructing an `OpenAITTS` backend.
#[derive(Debug, Clone)]
pub struct OpenAITTSConfig {
    pub api_key: String,
    /// API base URL without the `/v1/...` path
    pub base_url: String,
    /// Model used when a voice configuration does not name one
    pub default_model: OpenAITTSModel,
    pub request_timeout: Duration,
}

impl Default for OpenAITTSConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: OPENAI_API_BASE.to_string(),
            default_model: OpenAITTSModel::default(),
            request_timeout: Duration::from_secs(120),
        }
    }
}
