//! Google Cloud Text-to-Speech configuration.
//!
//! Voice catalog, narrator aliases, SSML gender lookup, pricing tiers and
//! audio encodings for the REST `text:synthesize` endpoint.
//!
//! # References
//!
//! - [API Reference](https://cloud.google.com/text-to-speech/docs/reference/rest/v1/text/synthesize)
//! - [Voices](https://cloud.google.com/text-to-speech/docs/voices)

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::tts::base::AudioFormat;

// =============================================================================
// Constants
// =============================================================================

/// Default Google Cloud Text-to-Speech API base URL.
pub const GOOGLE_API_BASE: &str = "https://texttospeech.googleapis.com";

/// Voice used when a request names no catalog voice.
pub const DEFAULT_VOICE: &str = "en-US-Neural2-J";

/// Maximum characters per request.
///
/// The API limit is 5000 bytes; 4000 characters keeps multibyte text under it.
pub const MAX_TEXT_LENGTH: usize = 4000;

/// Voices offered by this backend, in catalog order.
pub const VOICE_CATALOG: &[&str] = &[
    "en-US-Neural2-A",
    "en-US-Neural2-C",
    "en-US-Neural2-D",
    "en-US-Neural2-F",
    "en-US-Neural2-G",
    "en-US-Neural2-H",
    "en-US-Neural2-I",
    "en-US-Neural2-J",
    "en-GB-Neural2-A",
    "en-GB-Neural2-B",
    "en-GB-Neural2-C",
    "en-US-Chirp3-HD-A",
    "en-US-Chirp3-HD-B",
    "en-US-Chirp3-HD-C",
];

/// Narrator aliases mapped to catalog voices.
const VOICE_ALIASES: &[(&str, &str)] = &[
    ("timeless_narrator_male", "en-US-Neural2-J"),
    ("timeless_narrator_female", "en-US-Neural2-F"),
    ("timeless_british_male", "en-GB-Neural2-B"),
    ("myths_energetic_male", "en-US-Chirp3-HD-A"),
    ("myths_energetic_female", "en-US-Chirp3-HD-B"),
    ("myths_dramatic", "en-US-Chirp3-HD-C"),
];

const FEMALE_VOICES: &[&str] = &[
    "en-US-Neural2-C",
    "en-US-Neural2-E",
    "en-US-Neural2-F",
    "en-US-Neural2-G",
    "en-US-Neural2-H",
    "en-US-Journey-F",
    "en-US-Studio-O",
];

const MALE_VOICES: &[&str] = &[
    "en-US-Neural2-A",
    "en-US-Neural2-B",
    "en-US-Neural2-D",
    "en-US-Neural2-I",
    "en-US-Neural2-J",
    "en-US-Journey-D",
    "en-US-Journey-O",
    "en-US-Studio-Q",
    "en-US-Wavenet-A",
    "en-US-Wavenet-B",
    "en-US-Wavenet-D",
    "en-US-Wavenet-I",
    "en-US-Wavenet-J",
];

// =============================================================================
// Voice Resolution
// =============================================================================

/// Resolve a narrator alias to a catalog voice name.
pub fn resolve_alias(alias: &str) -> Option<&'static str> {
    VOICE_ALIASES
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(alias))
        .map(|(_, voice)| *voice)
}

/// Catalog voice for a voice id or alias, if it is part of the catalog.
pub fn catalog_voice(voice_id: &str) -> Option<&'static str> {
    let name = resolve_alias(voice_id).unwrap_or(voice_id);
    VOICE_CATALOG.iter().copied().find(|v| *v == name)
}

/// Voice name to send for `voice_id`.
///
/// Aliases resolve to their catalog voice, ids shaped like a Google voice
/// name (`ll-CC-...`) pass through, anything else becomes `DEFAULT_VOICE`.
pub fn resolve_voice_name(voice_id: &str) -> String {
    if let Some(voice) = catalog_voice(voice_id) {
        return voice.to_string();
    }
    if language_of(voice_id).is_some() {
        return voice_id.to_string();
    }
    DEFAULT_VOICE.to_string()
}

/// Language code prefix of a Google voice name, e.g. `en-GB` for `en-GB-Neural2-B`.
pub fn language_of(voice_name: &str) -> Option<&str> {
    let mut parts = voice_name.splitn(3, '-');
    let lang = parts.next()?;
    let region = parts.next()?;
    parts.next()?;
    let lang_ok = (2..=3).contains(&lang.len()) && lang.chars().all(|c| c.is_ascii_lowercase());
    let region_ok = region.len() == 2 && region.chars().all(|c| c.is_ascii_uppercase());
    if lang_ok && region_ok {
        Some(&voice_name[..lang.len() + 1 + region.len()])
    } else {
        None
    }
}

// =============================================================================
// SSML Gender
// =============================================================================

/// `ssmlGender` parameter of a voice selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SsmlGender {
    Male,
    Female,
    Neutral,
}

impl SsmlGender {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Male => "MALE",
            Self::Female => "FEMALE",
            Self::Neutral => "NEUTRAL",
        }
    }

    /// Gender of a known voice, `Neutral` otherwise.
    pub fn for_voice(voice_name: &str) -> Self {
        if FEMALE_VOICES.contains(&voice_name) {
            Self::Female
        } else if MALE_VOICES.contains(&voice_name) {
            Self::Male
        } else {
            Self::Neutral
        }
    }
}

// =============================================================================
// Pricing Tiers
// =============================================================================

/// Pricing tier key for a voice, as used in the pricing table.
pub fn pricing_tier(voice_id: Option<&str>) -> &'static str {
    match voice_id {
        Some(v) if v.contains("Journey") => "journey",
        Some(v) if v.contains("Studio") => "studio",
        Some(v) if v.contains("Wavenet") => "wavenet",
        _ => "neural2",
    }
}

// =============================================================================
// Audio Encoding
// =============================================================================

/// `audioEncoding` parameter for a pipeline audio format.
pub fn audio_encoding(format: AudioFormat) -> &'static str {
    match format {
        AudioFormat::Wav => "LINEAR16",
        AudioFormat::Ogg => "OGG_OPUS",
        _ => "MP3",
    }
}

// =============================================================================
// Backend Settings
// =============================================================================

/// Settings for constructing a `GoogleTTS` backend.
#[derive(Debug, Clone)]
pub struct GoogleTTSConfig {
    /// API key sent as the `key` query parameter
    pub api_key: String,
    pub base_url: String,
    pub request_timeout: Duration,
}

impl Default for GoogleTTSConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: GOOGLE_API_BASE.to_string(),
            request_timeout: Duration::from_secs(120),
        }
    }
}
