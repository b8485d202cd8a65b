//! Configuration module for the narration pipeline
//!
//! This module handles pipeline configuration from various sources: .env files, YAML files,
//! and environment variables. Priority: YAML > ENV vars > .env values > defaults.
//!
//! # Modules
//! - `yaml`: YAML configuration file loading
//! - `env`: Environment variable loading
//! - `validation`: Configuration validation logic
//! - `pricing`: Per-provider, per-tier price table
//!
//! # Example
//! ```rust,no_run
//! use longform_tts::config::PipelineConfig;
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load from environment variables only
//! let config = PipelineConfig::from_env()?;
//!
//! // Load from YAML file with environment variable overrides
//! let config_path = PathBuf::from("config.yaml");
//! let config = PipelineConfig::from_file(&config_path)?;
//!
//! println!("Default provider: {}", config.default_provider);
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

mod env;
pub mod pricing;
mod validation;
mod yaml;

pub use pricing::{TierPricing, cost_cents_for_chars, get_tts_price, get_tts_pricing, list_tts_tiers};
pub use validation::SAMPLE_RATE_RANGE;

use crate::core::tts::ProviderKind;

/// Provider credentials and endpoints
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderSettings {
    /// OpenAI API key for the Audio Speech API
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    /// Default model (tts-1, tts-1-hd, gpt-4o-mini-tts)
    pub openai_model: String,
    /// Google Cloud API key with Text-to-Speech enabled
    pub google_api_key: Option<String>,
    pub google_base_url: String,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            openai_base_url: "https://api.openai.com".to_string(),
            openai_model: "tts-1".to_string(),
            google_api_key: None,
            google_base_url: "https://texttospeech.googleapis.com".to_string(),
        }
    }
}

/// Audio concatenation settings
#[derive(Debug, Clone, PartialEq)]
pub struct AudioSettings {
    /// ffmpeg executable, resolved through PATH when relative
    pub ffmpeg_path: PathBuf,
    /// Deadline for the `ffmpeg -version` availability probe
    pub probe_timeout_seconds: u64,
    /// Deadline for a single ffmpeg concatenation run
    pub ffmpeg_timeout_seconds: u64,
    /// Silence inserted between segments when pauses are requested
    pub pause_ms: u64,
    /// Overlap between segments when crossfade is requested
    pub crossfade_ms: u64,
    pub target_bitrate: String,
    pub target_sample_rate: u32,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            ffmpeg_path: PathBuf::from("ffmpeg"),
            probe_timeout_seconds: 5,
            ffmpeg_timeout_seconds: 120,
            pause_ms: 200,
            crossfade_ms: 100,
            target_bitrate: "128k".to_string(),
            target_sample_rate: 24000,
        }
    }
}

/// Pipeline configuration
///
/// Contains everything needed to run a narration job:
/// - Provider credentials and endpoints
/// - Default provider and the single-hop fallback map
/// - Scratch space, deadlines and chunk concurrency
/// - Concatenation and episode pacing settings
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub providers: ProviderSettings,

    // Orchestration
    pub default_provider: ProviderKind,
    /// Primary provider to its single fallback provider
    pub fallbacks: HashMap<ProviderKind, ProviderKind>,
    /// Parent directory for per-job scratch directories
    pub scratch_dir: PathBuf,
    pub request_timeout_seconds: u64,
    /// Chunks synthesized at once; 1 is strictly sequential
    pub max_concurrent_chunks: usize,
    pub chunk_overlap_chars: usize,
    /// Accept a first-segment-only concatenation as success
    pub accept_partial_concatenation: bool,

    pub audio: AudioSettings,

    // Episodes
    /// Narration pace at speed 1.0
    pub words_per_minute: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let mut fallbacks = HashMap::new();
        fallbacks.insert(ProviderKind::Google, ProviderKind::OpenAI);
        fallbacks.insert(ProviderKind::OpenAI, ProviderKind::Google);

        Self {
            providers: ProviderSettings::default(),
            default_provider: ProviderKind::Google,
            fallbacks,
            scratch_dir: std::env::temp_dir().join("longform-tts"),
            request_timeout_seconds: 120,
            max_concurrent_chunks: 1,
            chunk_overlap_chars: 0,
            accept_partial_concatenation: false,
            audio: AudioSettings::default(),
            words_per_minute: 150,
        }
    }
}

impl PipelineConfig {
    /// Load configuration from environment variables only
    ///
    /// Missing variables fall back to defaults. The result is validated.
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        let config = env::load_env_config()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file with environment variable base
    ///
    /// Priority order (highest to lowest):
    /// 1. YAML file values
    /// 2. Environment variables (actual ENV vars override .env values)
    /// 3. .env file values
    /// 4. Default values
    ///
    /// # Errors
    /// Returns an error if:
    /// - The YAML file cannot be read or is malformed
    /// - Environment variables have invalid formats
    /// - Configuration validation fails
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        // .env is loaded into the environment by main.rs at startup
        let yaml_config = yaml::YamlConfig::from_file(path)?;

        let mut config = env::load_env_config()?;
        config.apply_yaml(yaml_config)?;
        config.validate()?;

        Ok(config)
    }

    fn apply_yaml(&mut self, yaml: yaml::YamlConfig) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(p) = yaml.providers {
            if p.openai_api_key.is_some() {
                self.providers.openai_api_key = p.openai_api_key;
            }
            if let Some(url) = p.openai_base_url {
                self.providers.openai_base_url = url;
            }
            if let Some(model) = p.openai_model {
                self.providers.openai_model = model;
            }
            if p.google_api_key.is_some() {
                self.providers.google_api_key = p.google_api_key;
            }
            if let Some(url) = p.google_base_url {
                self.providers.google_base_url = url;
            }
        }

        if let Some(p) = yaml.pipeline {
            if let Some(name) = p.default_provider {
                self.default_provider = name.parse::<ProviderKind>()?;
            }
            if let Some(map) = p.fallbacks {
                let mut fallbacks = HashMap::new();
                for (primary, fallback) in map {
                    fallbacks.insert(
                        primary.parse::<ProviderKind>()?,
                        fallback.parse::<ProviderKind>()?,
                    );
                }
                self.fallbacks = fallbacks;
            }
            if let Some(dir) = p.scratch_dir {
                self.scratch_dir = PathBuf::from(dir);
            }
            if let Some(secs) = p.request_timeout_seconds {
                self.request_timeout_seconds = secs;
            }
            if let Some(n) = p.max_concurrent_chunks {
                self.max_concurrent_chunks = n;
            }
            if let Some(n) = p.chunk_overlap_chars {
                self.chunk_overlap_chars = n;
            }
            if let Some(accept) = p.accept_partial_concatenation {
                self.accept_partial_concatenation = accept;
            }
        }

        if let Some(a) = yaml.audio {
            if let Some(path) = a.ffmpeg_path {
                self.audio.ffmpeg_path = PathBuf::from(path);
            }
            if let Some(secs) = a.probe_timeout_seconds {
                self.audio.probe_timeout_seconds = secs;
            }
            if let Some(secs) = a.ffmpeg_timeout_seconds {
                self.audio.ffmpeg_timeout_seconds = secs;
            }
            if let Some(ms) = a.pause_ms {
                self.audio.pause_ms = ms;
            }
            if let Some(ms) = a.crossfade_ms {
                self.audio.crossfade_ms = ms;
            }
            if let Some(bitrate) = a.target_bitrate {
                self.audio.target_bitrate = bitrate;
            }
            if let Some(rate) = a.target_sample_rate {
                self.audio.target_sample_rate = rate;
            }
        }

        if let Some(e) = yaml.episodes {
            if let Some(wpm) = e.words_per_minute {
                self.words_per_minute = wpm;
            }
        }

        Ok(())
    }

    /// Check the merged configuration.
    pub fn validate(&self) -> Result<(), Box<dyn std::error::Error>> {
        validation::validate_fallbacks(&self.fallbacks)?;
        validation::validate_positive("max_concurrent_chunks", self.max_concurrent_chunks as u64)?;
        validation::validate_positive("request_timeout_seconds", self.request_timeout_seconds)?;
        validation::validate_positive("probe_timeout_seconds", self.audio.probe_timeout_seconds)?;
        validation::validate_positive("ffmpeg_timeout_seconds", self.audio.ffmpeg_timeout_seconds)?;
        validation::validate_positive("words_per_minute", self.words_per_minute as u64)?;
        validation::validate_sample_rate(self.audio.target_sample_rate)?;
        validation::validate_bitrate(&self.audio.target_bitrate)?;
        Ok(())
    }

    /// Fallback provider configured for `primary`, if any.
    pub fn fallback_for(&self, primary: ProviderKind) -> Option<ProviderKind> {
        self.fallbacks.get(&primary).copied()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    /// Get API key for a specific provider
    ///
    /// # Returns
    /// * `Result<String, String>` - The API key on success, or an error message on failure
    pub fn get_api_key(&self, provider: ProviderKind) -> Result<String, String> {
        match provider {
            ProviderKind::OpenAI => self
                .providers
                .openai_api_key
                .clone()
                .ok_or_else(|| "OpenAI API key not configured".to_string()),
            ProviderKind::Google => self
                .providers
                .google_api_key
                .clone()
                .ok_or_else(|| "Google TTS API key not configured".to_string()),
        }
    }
}
