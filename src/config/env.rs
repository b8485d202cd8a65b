//! Environment-variable layer of the configuration.
//!
//! `.env` values are loaded into the process environment by the binary before
//! this runs, so real environment variables and `.env` entries look the same
//! here.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use super::PipelineConfig;
use crate::core::tts::ProviderKind;

/// Read a non-empty environment variable.
pub(crate) fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Parse an environment variable, failing on malformed values.
pub(crate) fn parse_env<T: FromStr>(name: &str) -> Result<Option<T>, Box<dyn std::error::Error>> {
    match env_var(name) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| format!("Invalid value for {name}: {raw}").into()),
        None => Ok(None),
    }
}

/// Build a configuration from defaults overridden by environment variables.
pub(crate) fn load_env_config() -> Result<PipelineConfig, Box<dyn std::error::Error>> {
    let mut config = PipelineConfig::default();

    // Providers
    config.providers.openai_api_key = env_var("OPENAI_API_KEY");
    if let Some(url) = env_var("OPENAI_BASE_URL") {
        config.providers.openai_base_url = url;
    }
    if let Some(model) = env_var("OPENAI_TTS_MODEL") {
        config.providers.openai_model = model;
    }
    config.providers.google_api_key = env_var("GOOGLE_TTS_API_KEY");
    if let Some(url) = env_var("GOOGLE_TTS_BASE_URL") {
        config.providers.google_base_url = url;
    }

    // Pipeline
    if let Some(name) = env_var("TTS_DEFAULT_PROVIDER") {
        config.default_provider = name.parse::<ProviderKind>()?;
    }
    if let Some(dir) = env_var("TTS_SCRATCH_DIR") {
        config.scratch_dir = PathBuf::from(dir);
    }
    if let Some(secs) = parse_env("TTS_REQUEST_TIMEOUT_SECONDS")? {
        config.request_timeout_seconds = secs;
    }
    if let Some(n) = parse_env("TTS_MAX_CONCURRENT_CHUNKS")? {
        config.max_concurrent_chunks = n;
    }
    if let Some(n) = parse_env("TTS_CHUNK_OVERLAP_CHARS")? {
        config.chunk_overlap_chars = n;
    }

    // Audio
    if let Some(path) = env_var("FFMPEG_PATH") {
        config.audio.ffmpeg_path = PathBuf::from(path);
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn cleanup_env_vars() {
        unsafe {
            env::remove_var("OPENAI_API_KEY");
            env::remove_var("OPENAI_TTS_MODEL");
            env::remove_var("TTS_DEFAULT_PROVIDER");
            env::remove_var("TTS_MAX_CONCURRENT_CHUNKS");
            env::remove_var("FFMPEG_PATH");
        }
    }

    #[test]
    #[serial]
    fn test_load_env_config_defaults() {
        cleanup_env_vars();

        let config = load_env_config().unwrap();
        assert_eq!(config.default_provider, ProviderKind::Google);
        assert_eq!(config.max_concurrent_chunks, 1);
        assert_eq!(config.audio.ffmpeg_path, PathBuf::from("ffmpeg"));
    }

    #[test]
    #[serial]
    fn test_load_env_config_overrides() {
        cleanup_env_vars();
        unsafe {
            env::set_var("OPENAI_API_KEY", "env-key");
            env::set_var("OPENAI_TTS_MODEL", "tts-1-hd");
            env::set_var("TTS_DEFAULT_PROVIDER", "openai");
            env::set_var("TTS_MAX_CONCURRENT_CHUNKS", "4");
            env::set_var("FFMPEG_PATH", "/usr/local/bin/ffmpeg");
        }

        let config = load_env_config().unwrap();
        assert_eq!(config.providers.openai_api_key.as_deref(), Some("env-key"));
        assert_eq!(config.providers.openai_model, "tts-1-hd");
        assert_eq!(config.default_provider, ProviderKind::OpenAI);
        assert_eq!(config.max_concurrent_chunks, 4);
        assert_eq!(
            config.audio.ffmpeg_path,
            PathBuf::from("/usr/local/bin/ffmpeg")
        );

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_invalid_number_is_rejected() {
        cleanup_env_vars();
        unsafe {
            env::set_var("TTS_MAX_CONCURRENT_CHUNKS", "many");
        }

        let err = load_env_config().unwrap_err();
        assert!(err.to_string().contains("TTS_MAX_CONCURRENT_CHUNKS"));

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_unknown_default_provider() {
        cleanup_env_vars();
        unsafe {
            env::set_var("TTS_DEFAULT_PROVIDER", "polly");
        }

        let err = load_env_config().unwrap_err();
        assert!(err.to_string().contains("Unsupported TTS provider"));

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_blank_values_are_ignored() {
        cleanup_env_vars();
        unsafe {
            env::set_var("OPENAI_API_KEY", "  ");
        }

        let config = load_env_config().unwrap();
        assert!(config.providers.openai_api_key.is_none());

        cleanup_env_vars();
    }
}
