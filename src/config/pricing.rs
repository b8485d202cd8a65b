//! Centralized pricing table for the speech-synthesis backends.
//!
//! This module is the single source of truth for per-character pricing.
//! Backends consult it for `estimate_cost`, so prices can be updated without
//! touching provider code.
//!
//! All prices are in US cents per one million input characters.
//!
//! # Usage
//!
//! ```rust
//! use longform_tts::config::pricing::{cost_cents_for_chars, get_tts_price};
//!
//! let rate = get_tts_price("openai", "tts-1").unwrap();
//! assert_eq!(cost_cents_for_chars(1_000_000, rate), 1500);
//! ```

use std::collections::HashMap;
use std::sync::LazyLock;

/// Pricing information for one provider tier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TierPricing {
    /// Cents per one million characters
    pub cents_per_million_chars: u32,
    /// Optional notes about the tier
    pub notes: Option<&'static str>,
}

impl TierPricing {
    pub const fn new(cents_per_million_chars: u32) -> Self {
        Self {
            cents_per_million_chars,
            notes: None,
        }
    }

    pub const fn with_notes(cents_per_million_chars: u32, notes: &'static str) -> Self {
        Self {
            cents_per_million_chars,
            notes: Some(notes),
        }
    }
}

/// TTS pricing database.
/// Key format: "provider:tier" (lowercase)
static TTS_PRICING: LazyLock<HashMap<&'static str, TierPricing>> = LazyLock::new(|| {
    let mut m = HashMap::new();

    // -------------------------------------------------------------------------
    // Google Cloud Text-to-Speech
    // https://cloud.google.com/text-to-speech/pricing
    // -------------------------------------------------------------------------
    m.insert("google:standard", TierPricing::new(400));
    m.insert(
        "google:neural2",
        TierPricing::with_notes(400, "Default tier for narrator voices"),
    );
    m.insert("google:wavenet", TierPricing::new(1600));
    m.insert(
        "google:studio",
        TierPricing::with_notes(16000, "Premium studio voices"),
    );
    m.insert(
        "google:journey",
        TierPricing::with_notes(16000, "Premium conversational voices"),
    );
    m.insert(
        "google:chirp3-hd",
        TierPricing::with_notes(3000, "Chirp 3 HD voices"),
    );

    // -------------------------------------------------------------------------
    // OpenAI TTS
    // https://openai.com/api/pricing/
    // -------------------------------------------------------------------------
    m.insert("openai:tts-1", TierPricing::new(1500));
    m.insert("openai:tts-1-hd", TierPricing::new(3000));
    m.insert(
        "openai:gpt-4o-mini-tts",
        TierPricing::with_notes(1500, "Billed per token upstream; character rate is an approximation"),
    );

    m
});

/// Look up the pricing entry for a provider tier.
pub fn get_tts_pricing(provider: &str, tier: &str) -> Option<TierPricing> {
    let key = format!("{}:{}", provider.to_lowercase(), tier.to_lowercase());
    TTS_PRICING.get(key.as_str()).copied()
}

/// Price in cents per million characters for a provider tier.
pub fn get_tts_price(provider: &str, tier: &str) -> Option<u32> {
    get_tts_pricing(provider, tier).map(|p| p.cents_per_million_chars)
}

/// All known tiers for a provider, sorted.
pub fn list_tts_tiers(provider: &str) -> Vec<&'static str> {
    let prefix = format!("{}:", provider.to_lowercase());
    let mut tiers: Vec<&'static str> = TTS_PRICING
        .keys()
        .filter_map(|k| k.strip_prefix(prefix.as_str()))
        .collect();
    tiers.sort_unstable();
    tiers
}

/// Cost in whole cents for `chars` characters at `cents_per_million`.
///
/// Floors the exact amount and never charges less than one cent, so the
/// result is non-decreasing in `chars`.
pub fn cost_cents_for_chars(chars: usize, cents_per_million: u32) -> u32 {
    let exact = (chars as u128 * cents_per_million as u128) / 1_000_000;
    exact.clamp(1, u32::MAX as u128) as u32
}
