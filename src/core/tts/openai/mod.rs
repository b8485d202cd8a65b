//! OpenAI TTS provider module.
//!
//! Text-to-speech through OpenAI's Audio Speech API.
//!
//! # Supported Models
//!
//! - `tts-1` - Standard quality, lower latency
//! - `tts-1-hd` - High definition quality, higher latency
//! - `gpt-4o-mini-tts` - Latest model with improved quality
//!
//! The model comes from `VoiceConfig::extra_params["model"]` when present,
//! otherwise from the backend's configured default.
//!
//! # Supported Voices
//!
//! alloy, echo, fable, onyx, nova, shimmer, ash, plus the `fairer_tales_*`
//! narrator aliases.

mod config;
mod provider;

pub use config::{
    MAX_TEXT_LENGTH, OPENAI_API_BASE, OpenAITTSConfig, OpenAITTSModel, OpenAIVoice,
    resolve_alias, response_format,
};
pub use provider::{OPENAI_TTS_PATH, OPENAI_TTS_URL, OpenAITTS};
