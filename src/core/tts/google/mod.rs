//! Google Cloud Text-to-Speech provider module.
//!
//! Neural2 and Chirp 3 HD voices over the REST API, authenticated with an
//! API key.
//!
//! # Audio Encodings
//!
//! | Format | Encoding |
//! |--------|----------|
//! | mp3    | `MP3`      |
//! | wav    | `LINEAR16` |
//! | ogg    | `OGG_OPUS` |

mod config;
mod provider;

pub use config::{
    DEFAULT_VOICE, GOOGLE_API_BASE, GoogleTTSConfig, MAX_TEXT_LENGTH, SsmlGender, VOICE_CATALOG,
    audio_encoding, catalog_voice, pricing_tier, resolve_alias, resolve_voice_name,
};
pub use provider::{GOOGLE_TTS_PATH, GoogleTTS};
