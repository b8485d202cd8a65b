//! Validation rules applied to a fully merged configuration.

use std::collections::HashMap;

use crate::core::tts::ProviderKind;

/// Valid output sample rates for concatenated audio.
pub const SAMPLE_RATE_RANGE: std::ops::RangeInclusive<u32> = 8000..=48000;

/// Reject fallback maps where a provider falls back to itself.
pub fn validate_fallbacks(
    fallbacks: &HashMap<ProviderKind, ProviderKind>,
) -> Result<(), Box<dyn std::error::Error>> {
    for (primary, fallback) in fallbacks {
        if primary == fallback {
            return Err(format!("Provider {primary} cannot fall back to itself").into());
        }
    }
    Ok(())
}

/// Require a strictly positive integer setting.
pub fn validate_positive(name: &str, value: u64) -> Result<(), Box<dyn std::error::Error>> {
    if value == 0 {
        return Err(format!("{name} must be greater than 0").into());
    }
    Ok(())
}

pub fn validate_sample_rate(sample_rate: u32) -> Result<(), Box<dyn std::error::Error>> {
    if !SAMPLE_RATE_RANGE.contains(&sample_rate) {
        return Err(format!(
            "target_sample_rate {sample_rate} is outside {}..={}",
            SAMPLE_RATE_RANGE.start(),
            SAMPLE_RATE_RANGE.end()
        )
        .into());
    }
    Ok(())
}

/// Bitrates are ffmpeg-style strings such as `128k` or `96000`.
pub fn validate_bitrate(bitrate: &str) -> Result<(), Box<dyn std::error::Error>> {
    let digits = bitrate.strip_suffix(['k', 'K']).unwrap_or(bitrate);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(format!("Invalid target_bitrate: {bitrate}").into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_self_fallback_rejected() {
        let mut fallbacks = HashMap::new();
        fallbacks.insert(ProviderKind::Google, ProviderKind::Google);
        let err = validate_fallbacks(&fallbacks).unwrap_err();
        assert!(err.to_string().contains("cannot fall back to itself"));
    }

    #[test]
    fn test_cross_fallback_accepted() {
        let mut fallbacks = HashMap::new();
        fallbacks.insert(ProviderKind::Google, ProviderKind::OpenAI);
        fallbacks.insert(ProviderKind::OpenAI, ProviderKind::Google);
        assert!(validate_fallbacks(&fallbacks).is_ok());
    }

    #[test]
    fn test_validate_positive() {
        assert!(validate_positive("max_concurrent_chunks", 1).is_ok());
        let err = validate_positive("max_concurrent_chunks", 0).unwrap_err();
        assert_eq!(err.to_string(), "max_concurrent_chunks must be greater than 0");
    }

    #[test]
    fn test_validate_sample_rate() {
        assert!(validate_sample_rate(24000).is_ok());
        assert!(validate_sample_rate(8000).is_ok());
        assert!(validate_sample_rate(48000).is_ok());
        assert!(validate_sample_rate(96000).is_err());
        assert!(validate_sample_rate(0).is_err());
    }

    #[test]
    fn test_validate_bitrate() {
        assert!(validate_bitrate("128k").is_ok());
        assert!(validate_bitrate("96000").is_ok());
        assert!(validate_bitrate("k").is_err());
        assert!(validate_bitrate("fast").is_err());
    }
}
