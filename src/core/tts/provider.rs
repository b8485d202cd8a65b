//! Shared HTTP plumbing for request/response speech backends.
//!
//! Each backend supplies a `TTSRequestBuilder` describing how to turn a
//! `SynthesisRequest` into an HTTP request and how to pull audio bytes out of
//! the response. `TTSProvider` owns the pooled client and does the rest:
//! sending, status mapping, writing the audio file and building the artifact.

use std::path::Path;
use std::time::Duration;

use bytes::Bytes;
use time::OffsetDateTime;
use tracing::debug;

use super::base::{AudioArtifact, ProviderKind, SynthesisRequest, TTSError, TTSResult};

/// Average narration pace at speed 1.0.
pub const BASE_WORDS_PER_MINUTE: f64 = 150.0;

/// Bitrate reported when the duration is unknown.
pub const DEFAULT_BITRATE_KBPS: u32 = 128;

/// Longest provider error body kept in messages.
const MAX_ERROR_BODY: usize = 512;

/// Backend-specific request construction.
pub trait TTSRequestBuilder: Send + Sync {
    /// Build the HTTP request for one synthesis call.
    fn build_http_request(
        &self,
        client: &reqwest::Client,
        request: &SynthesisRequest,
    ) -> reqwest::RequestBuilder;

    /// Extract raw audio bytes from a successful response body.
    fn decode_audio(&self, body: Bytes) -> TTSResult<Bytes> {
        Ok(body)
    }
}

/// Pooled HTTP client shared by a backend's requests.
#[derive(Debug, Clone)]
pub struct TTSProvider {
    client: reqwest::Client,
    request_timeout: Duration,
}

impl TTSProvider {
    /// Create a client whose requests are bounded by `request_timeout`.
    pub fn new(request_timeout: Duration) -> TTSResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| TTSError::InvalidConfiguration(format!("HTTP client: {e}")))?;
        Ok(Self {
            client,
            request_timeout,
        })
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Send the request built by `builder` and return the decoded audio.
    pub async fn generic_synthesize<B: TTSRequestBuilder>(
        &self,
        builder: &B,
        request: &SynthesisRequest,
    ) -> TTSResult<Bytes> {
        let response = builder
            .build_http_request(&self.client, request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TTSError::Timeout(self.request_timeout.as_secs())
                } else {
                    TTSError::from(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = truncate(&body, MAX_ERROR_BODY);
            if status.as_u16() == 429 {
                return Err(TTSError::RateLimited(message));
            }
            return Err(TTSError::ProviderError {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.bytes().await?;
        let audio = builder.decode_audio(body)?;
        if audio.is_empty() {
            return Err(TTSError::AudioGenerationFailed(
                "provider returned empty audio".to_string(),
            ));
        }

        debug!(
            job_id = %request.job_id,
            bytes = audio.len(),
            "Received synthesized audio"
        );
        Ok(audio)
    }
}

/// Write audio bytes to `destination`, creating parent directories.
pub async fn write_audio(destination: &Path, audio: &[u8]) -> TTSResult<()> {
    if let Some(parent) = destination.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    tokio::fs::write(destination, audio).await?;
    Ok(())
}

/// Estimated spoken duration in seconds for `text` at `speed`.
pub fn estimate_duration_seconds(text: &str, speed: f32) -> f64 {
    let words = text.split_whitespace().count() as f64;
    let speed = if speed > 0.0 { speed as f64 } else { 1.0 };
    words / (BASE_WORDS_PER_MINUTE * speed) * 60.0
}

/// Estimated bitrate in kbps, clamped to [32, 320].
pub fn estimate_bitrate_kbps(size_bytes: u64, duration_seconds: f64) -> u32 {
    if duration_seconds <= 0.0 {
        return DEFAULT_BITRATE_KBPS;
    }
    let kbps = (size_bytes as f64 * 8.0 / duration_seconds / 1000.0) as u32;
    kbps.clamp(32, 320)
}

/// Build the artifact describing audio freshly written for `request`.
pub fn build_artifact(kind: ProviderKind, request: &SynthesisRequest, size_bytes: u64) -> AudioArtifact {
    let config = &request.voice_config;
    let duration = estimate_duration_seconds(&request.text, config.speed);
    AudioArtifact {
        id: format!("{}_{}", kind.as_str(), request.job_id),
        file_location: request.destination.clone(),
        duration_seconds: duration,
        size_bytes,
        format: config.audio_format,
        sample_rate: config.sample_rate,
        bitrate: estimate_bitrate_kbps(size_bytes, duration),
        voice_config: config.clone(),
        generated_at: OffsetDateTime::now_utc(),
        source_text: request.text.clone(),
    }
}

/// Reject requests that must never reach the network.
pub fn check_request_text(request: &SynthesisRequest, max_characters: usize) -> TTSResult<()> {
    if request.text.trim().is_empty() {
        return Err(TTSError::InvalidConfiguration(
            "text must not be empty".to_string(),
        ));
    }
    let chars = request.text.chars().count();
    if chars > max_characters {
        return Err(TTSError::InvalidConfiguration(format!(
            "text has {chars} characters, provider limit is {max_characters}"
        )));
    }
    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}
