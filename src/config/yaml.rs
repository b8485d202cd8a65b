use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;

/// Complete YAML configuration structure
///
/// All fields are optional to allow partial configuration. Values present here
/// override environment variables.
///
/// # Example YAML structure
/// ```yaml
/// providers:
///   openai_api_key: "sk-..."
///   openai_model: "tts-1-hd"
///   google_api_key: "AIza..."
///
/// pipeline:
///   default_provider: "google"
///   fallbacks:
///     google: "openai"
///     openai: "google"
///   scratch_dir: "/var/tmp/longform-tts"
///   request_timeout_seconds: 120
///   max_concurrent_chunks: 2
///   chunk_overlap_chars: 0
///   accept_partial_concatenation: false
///
/// audio:
///   ffmpeg_path: "/usr/bin/ffmpeg"
///   probe_timeout_seconds: 5
///   ffmpeg_timeout_seconds: 120
///   pause_ms: 200
///   crossfade_ms: 100
///   target_bitrate: "128k"
///   target_sample_rate: 24000
///
/// episodes:
///   words_per_minute: 150
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub providers: Option<ProvidersYaml>,
    pub pipeline: Option<PipelineYaml>,
    pub audio: Option<AudioYaml>,
    pub episodes: Option<EpisodesYaml>,
}

/// Provider credentials and endpoints from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ProvidersYaml {
    pub openai_api_key: Option<String>,
    /// Override for the OpenAI API base URL (proxies, tests)
    pub openai_base_url: Option<String>,
    /// Default OpenAI model (tts-1, tts-1-hd, gpt-4o-mini-tts)
    pub openai_model: Option<String>,
    /// Google Cloud API key with Text-to-Speech enabled
    pub google_api_key: Option<String>,
    pub google_base_url: Option<String>,
}

/// Orchestrator settings from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct PipelineYaml {
    pub default_provider: Option<String>,
    /// Primary provider name to fallback provider name
    pub fallbacks: Option<HashMap<String, String>>,
    pub scratch_dir: Option<String>,
    pub request_timeout_seconds: Option<u64>,
    pub max_concurrent_chunks: Option<usize>,
    pub chunk_overlap_chars: Option<usize>,
    pub accept_partial_concatenation: Option<bool>,
}

/// Concatenation settings from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AudioYaml {
    pub ffmpeg_path: Option<String>,
    pub probe_timeout_seconds: Option<u64>,
    pub ffmpeg_timeout_seconds: Option<u64>,
    pub pause_ms: Option<u64>,
    pub crossfade_ms: Option<u64>,
    pub target_bitrate: Option<String>,
    pub target_sample_rate: Option<u32>,
}

/// Episode segmentation settings from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct EpisodesYaml {
    pub words_per_minute: Option<u32>,
}

impl YamlConfig {
    /// Load YAML configuration from a file
    ///
    /// # Errors
    /// Returns an error if:
    /// - The file cannot be read
    /// - The YAML is malformed
    /// - Required fields have invalid types
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file {}: {e}", path.display()))?;

        let config: YamlConfig = serde_yaml::from_str(&contents)
            .map_err(|e| format!("Failed to parse YAML config: {e}"))?;

        Ok(config)
    }
}
