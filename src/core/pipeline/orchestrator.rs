use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use futures::StreamExt;
use futures::stream;
use serde_json::json;
use time::OffsetDateTime;
use tracing::{debug, error, info, warn};

use super::FallbackPolicy;
use crate::config::PipelineConfig;
use crate::core::audio::{AudioConcatenator, ConcatOptions};
use crate::core::chunking::chunk_text;
use crate::core::episodes::{EpisodeSegment, EpisodeSegmenter};
use crate::core::tts::provider::estimate_bitrate_kbps;
use crate::core::tts::{
    AudioArtifact, AudioFormat, BoxedTTS, JobId, ProviderKind, ProviderLimits, ProviderRegistry,
    SynthesisErrorKind, SynthesisRequest, SynthesisResult, TTSError, VoiceConfig,
};

/// Primary backend of a job and its registered fallback, if any.
#[derive(Clone, Copy)]
struct Route<'a> {
    primary: &'a BoxedTTS,
    fallback: Option<&'a BoxedTTS>,
}

/// Turns arbitrarily long text into one audio file.
///
/// Text within the character limit of the provider and its fallback is synthesized with a single
/// request; longer text is chunked, synthesized chunk by chunk and stitched
/// together. Every synthesize call (whole text or chunk) gets at most one
/// retry against the configured fallback provider.
///
/// All failures come back as a failed [`SynthesisResult`]; nothing panics or
/// returns an error past this boundary.
pub struct AudioPipeline {
    registry: ProviderRegistry,
    fallbacks: FallbackPolicy,
    concatenator: AudioConcatenator,
    segmenter: EpisodeSegmenter,
    concat_options: ConcatOptions,
    scratch_dir: PathBuf,
    request_timeout: Duration,
    max_concurrent_chunks: usize,
    chunk_overlap_chars: usize,
    accept_partial_concatenation: bool,
}

impl AudioPipeline {
    pub fn new(registry: ProviderRegistry, config: &PipelineConfig) -> Self {
        Self {
            registry,
            fallbacks: FallbackPolicy::from_config(config),
            concatenator: AudioConcatenator::from_config(config),
            segmenter: EpisodeSegmenter::new(config.words_per_minute),
            concat_options: ConcatOptions::default(),
            scratch_dir: config.scratch_dir.clone(),
            request_timeout: config.request_timeout(),
            max_concurrent_chunks: config.max_concurrent_chunks.max(1),
            chunk_overlap_chars: config.chunk_overlap_chars,
            accept_partial_concatenation: config.accept_partial_concatenation,
        }
    }

    /// Replace the fallback routes taken from the configuration.
    pub fn with_fallbacks(mut self, fallbacks: FallbackPolicy) -> Self {
        self.fallbacks = fallbacks;
        self
    }

    pub fn with_concat_options(mut self, options: ConcatOptions) -> Self {
        self.concat_options = options;
        self
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    pub fn fallbacks(&self) -> &FallbackPolicy {
        &self.fallbacks
    }

    /// Registered providers in declaration order.
    pub fn available_providers(&self) -> Vec<ProviderKind> {
        self.registry.kinds()
    }

    /// Default-voice cost of `text` on every registered provider, in cents.
    pub fn estimate_costs_all_providers(&self, text: &str) -> BTreeMap<ProviderKind, u32> {
        self.registry
            .kinds()
            .into_iter()
            .filter_map(|kind| {
                self.registry
                    .get(kind)
                    .map(|p| (kind, p.estimate_cost(text, None)))
            })
            .collect()
    }

    pub fn split_into_episodes(
        &self,
        text: &str,
        target_duration_minutes: f64,
        voice_config: &VoiceConfig,
    ) -> Vec<EpisodeSegment> {
        self.segmenter
            .split_into_episodes(text, target_duration_minutes, voice_config)
    }

    /// Synthesize `text` into `destination` with the provider named by `voice_config`.
    ///
    /// Configuration problems (unregistered provider, rejected voice or
    /// parameters, blank text) fail before any network call.
    pub async fn generate_audio(
        &self,
        text: &str,
        voice_config: &VoiceConfig,
        destination: &Path,
        job_id: Option<JobId>,
    ) -> SynthesisResult {
        let job_id = job_id.unwrap_or_else(JobId::generate);
        let kind = voice_config.provider;

        let primary = match self.registry.require(kind) {
            Ok(provider) => provider,
            Err(e) => {
                error!(job_id = %job_id, provider = %kind, "Provider not registered");
                return SynthesisResult::from_error(&e);
            }
        };

        if text.trim().is_empty() {
            error!(job_id = %job_id, provider = %kind, "Empty text");
            return SynthesisResult::failure(
                SynthesisErrorKind::Configuration,
                "Text must not be empty",
            );
        }

        if !primary.validate_config(voice_config) {
            error!(
                job_id = %job_id,
                provider = %kind,
                voice = %voice_config.voice_id,
                "Voice configuration rejected"
            );
            return SynthesisResult::failure(
                SynthesisErrorKind::Configuration,
                format!(
                    "Invalid voice configuration for {kind}: voice '{}' unavailable or parameters out of range",
                    voice_config.voice_id
                ),
            );
        }

        // A fallback that cannot produce the requested format is never tried
        let fallback = self
            .fallbacks
            .fallback_for(kind)
            .and_then(|f| self.registry.get(f))
            .filter(|f| {
                let usable = f.get_limits().supports_format(voice_config.audio_format);
                if !usable {
                    warn!(
                        job_id = %job_id,
                        provider = %kind,
                        fallback = %f.kind(),
                        format = %voice_config.audio_format,
                        "Fallback provider does not support the requested format, disabled for this job"
                    );
                }
                usable
            });
        let route = Route { primary, fallback };

        // Both the primary and its fallback must accept every request of the job
        let limits = primary.get_limits();
        let fallback_limits = fallback.map(|f| f.get_limits());
        let budget = chunk_budget(&limits, fallback_limits.as_ref());
        let chars = text.chars().count();
        if chars <= budget {
            info!(job_id = %job_id, provider = %kind, chars, "Synthesizing in a single request");
            let request = SynthesisRequest {
                job_id: job_id.clone(),
                text: text.to_string(),
                voice_config: voice_config.clone(),
                destination: destination.to_path_buf(),
            };
            return self.synthesize_with_fallback(route, &request, None).await;
        }

        self.generate_chunked(text, voice_config, destination, &job_id, route)
            .await
    }

    async fn generate_chunked(
        &self,
        text: &str,
        voice_config: &VoiceConfig,
        destination: &Path,
        job_id: &JobId,
        route: Route<'_>,
    ) -> SynthesisResult {
        let limits = route.primary.get_limits();
        let fallback_limits = route.fallback.map(|f| f.get_limits());
        let budget = chunk_budget(&limits, fallback_limits.as_ref());
        let concurrency = chunk_concurrency(self.max_concurrent_chunks, &limits);

        let chunks = chunk_text(text, budget, self.chunk_overlap_chars);
        let total = chunks.len();
        info!(
            job_id = %job_id,
            provider = %voice_config.provider,
            chunks = total,
            budget,
            concurrency,
            "Text exceeds provider limit, synthesizing in chunks"
        );

        // Removed with everything in it when this function returns
        let scratch = match self.job_scratch(job_id).await {
            Ok(dir) => dir,
            Err(e) => {
                error!(job_id = %job_id, error = %e, "Cannot create scratch directory");
                return SynthesisResult::failure(
                    SynthesisErrorKind::Configuration,
                    format!(
                        "Cannot create scratch directory under {}: {e}",
                        self.scratch_dir.display()
                    ),
                );
            }
        };

        let extension = voice_config.audio_format.extension();
        let requests: Vec<SynthesisRequest> = chunks
            .iter()
            .map(|chunk| {
                let chunk_id = job_id.chunk(chunk.index);
                SynthesisRequest {
                    destination: scratch.path().join(format!("{chunk_id}.{extension}")),
                    job_id: chunk_id,
                    text: chunk.text.clone(),
                    voice_config: voice_config.clone(),
                }
            })
            .collect();

        // `buffered` yields in source order; dropping the stream on failure
        // cancels chunks still in flight
        let mut results = stream::iter(requests.iter().enumerate().map(move |(i, request)| async move {
            let index = i + 1;
            (index, self.synthesize_with_fallback(route, request, Some(index)).await)
        }))
        .buffered(concurrency);

        let mut artifacts: Vec<AudioArtifact> = Vec::with_capacity(total);
        let mut chunk_providers = Vec::with_capacity(total);
        let mut total_cost = 0u32;

        while let Some((index, result)) = results.next().await {
            let artifact = match result.audio_artifact {
                Some(artifact) if result.success => artifact,
                _ => {
                    let message = result.error_message.unwrap_or_default();
                    error!(job_id = %job_id, chunk = index, error = %message, "Chunk failed, aborting job");
                    return SynthesisResult::failure(
                        SynthesisErrorKind::ChunkFailure { index },
                        format!("Chunk {index} of {total} failed: {message}"),
                    );
                }
            };
            debug!(job_id = %job_id, chunk = index, total, "Chunk synthesized");
            total_cost = total_cost.saturating_add(result.cost_cents.unwrap_or(0));
            chunk_providers.push(artifact.voice_config.provider);
            artifacts.push(artifact);
        }

        let segments: Vec<PathBuf> = artifacts.iter().map(|a| a.file_location.clone()).collect();
        let outcome = match self
            .concatenator
            .concatenate(&segments, destination, self.concat_options)
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(job_id = %job_id, error = %e, "Audio concatenation failed");
                return SynthesisResult::failure(e.kind(), format!("Audio concatenation failed: {e}"));
            }
        };

        if !outcome.is_complete() && !self.accept_partial_concatenation {
            let warning = outcome.warning.clone().unwrap_or_default();
            error!(job_id = %job_id, method = %outcome.method, "Concatenation incomplete, discarding output");
            if let Err(e) = tokio::fs::remove_file(destination).await {
                warn!(job_id = %job_id, error = %e, "Failed to remove partial output");
            }
            return SynthesisResult::failure(
                SynthesisErrorKind::Concatenation,
                format!("Audio concatenation incomplete: {warning}"),
            );
        }

        let duration_seconds: f64 = artifacts.iter().map(|a| a.duration_seconds).sum();
        let artifact = AudioArtifact {
            id: job_id.to_string(),
            file_location: destination.to_path_buf(),
            duration_seconds,
            size_bytes: outcome.size_bytes,
            format: AudioFormat::from_path(destination).unwrap_or(voice_config.audio_format),
            sample_rate: voice_config.sample_rate,
            bitrate: estimate_bitrate_kbps(outcome.size_bytes, duration_seconds),
            voice_config: voice_config.clone(),
            generated_at: OffsetDateTime::now_utc(),
            source_text: text.to_string(),
        };

        info!(
            job_id = %job_id,
            chunks = total,
            cost_cents = total_cost,
            size_bytes = outcome.size_bytes,
            "Long-form synthesis complete"
        );

        let response = json!({
            "job_id": job_id,
            "chunks": total,
            "chunk_providers": chunk_providers,
            "concatenation": outcome,
        });
        SynthesisResult::success(artifact, total_cost, response)
    }

    /// One synthesize call plus at most one fallback retry.
    ///
    /// Configuration failures are final. The retry uses a copy of the voice
    /// configuration with only the provider swapped.
    async fn synthesize_with_fallback(
        &self,
        route: Route<'_>,
        request: &SynthesisRequest,
        chunk: Option<usize>,
    ) -> SynthesisResult {
        let primary = route.primary;
        let result = self.synthesize_once(primary, request).await;
        if result.success {
            return result;
        }

        let message = result.error_message.clone().unwrap_or_default();
        let fallback = route
            .fallback
            .filter(|_| result.error_kind != Some(SynthesisErrorKind::Configuration));
        let Some(fallback) = fallback else {
            error!(
                job_id = %request.job_id,
                chunk,
                provider = %primary.kind(),
                error = %message,
                "Synthesis failed"
            );
            return result;
        };

        warn!(
            job_id = %request.job_id,
            chunk,
            provider = %primary.kind(),
            fallback = %fallback.kind(),
            error = %message,
            "Synthesis failed, retrying with fallback provider"
        );

        let retry = SynthesisRequest {
            voice_config: request.voice_config.with_provider(fallback.kind()),
            ..request.clone()
        };
        let second = self.synthesize_once(fallback, &retry).await;
        if !second.success {
            error!(
                job_id = %request.job_id,
                chunk,
                provider = %fallback.kind(),
                error = %second.error_message.as_deref().unwrap_or_default(),
                "Fallback synthesis failed"
            );
        }
        second
    }

    async fn synthesize_once(&self, provider: &BoxedTTS, request: &SynthesisRequest) -> SynthesisResult {
        debug!(
            job_id = %request.job_id,
            provider = %provider.kind(),
            chars = request.text.chars().count(),
            "Dispatching synthesis request"
        );
        match tokio::time::timeout(self.request_timeout, provider.synthesize(request)).await {
            Ok(result) => result,
            Err(_) => SynthesisResult::from_error(&TTSError::Timeout(self.request_timeout.as_secs())),
        }
    }

    async fn job_scratch(&self, job_id: &JobId) -> std::io::Result<tempfile::TempDir> {
        tokio::fs::create_dir_all(&self.scratch_dir).await?;
        tempfile::Builder::new()
            .prefix(&format!("{job_id}_"))
            .tempdir_in(&self.scratch_dir)
    }
}

/// Largest chunk both the primary and its fallback accept.
fn chunk_budget(primary: &ProviderLimits, fallback: Option<&ProviderLimits>) -> usize {
    match fallback {
        Some(f) => primary.max_characters.min(f.max_characters),
        None => primary.max_characters,
    }
}

/// Chunks in flight at once, never above the provider's per-minute quota.
fn chunk_concurrency(max_concurrent_chunks: usize, limits: &ProviderLimits) -> usize {
    max_concurrent_chunks
        .min(limits.max_requests_per_minute as usize)
        .max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits(max_characters: usize, rpm: u32) -> ProviderLimits {
        ProviderLimits {
            max_characters,
            max_requests_per_minute: rpm,
            cost_per_million_characters: 400,
            supported_formats: vec![AudioFormat::Mp3],
            supported_languages: vec!["en-US".to_string()],
            speed_range: (0.25, 4.0),
            pitch_range: None,
            volume_gain_range: None,
        }
    }

    #[test]
    fn test_chunk_budget() {
        let google = limits(4000, 100);
        let openai = limits(4096, 50);
        assert_eq!(chunk_budget(&openai, Some(&google)), 4000);
        assert_eq!(chunk_budget(&google, Some(&openai)), 4000);
        assert_eq!(chunk_budget(&openai, None), 4096);
    }

    #[test]
    fn test_chunk_concurrency() {
        assert_eq!(chunk_concurrency(1, &limits(4000, 100)), 1);
        assert_eq!(chunk_concurrency(8, &limits(4000, 3)), 3);
        assert_eq!(chunk_concurrency(8, &limits(4000, 0)), 1);
    }

    #[test]
    fn test_new_from_config() {
        let mut config = PipelineConfig::default();
        config.fallbacks.clear();
        let pipeline = AudioPipeline::new(ProviderRegistry::new(), &config);
        assert!(pipeline.available_providers().is_empty());
        assert_eq!(pipeline.fallbacks(), &FallbackPolicy::none());
        assert!(pipeline.estimate_costs_all_providers("hello").is_empty());
    }

    #[tokio::test]
    async fn test_unregistered_provider_fails_fast() {
        let pipeline = AudioPipeline::new(ProviderRegistry::new(), &PipelineConfig::default());
        let voice = VoiceConfig::new(ProviderKind::OpenAI, "alloy");
        let result = pipeline
            .generate_audio("Hello there.", &voice, Path::new("out.mp3"), None)
            .await;

        assert!(!result.success);
        assert!(result.audio_artifact.is_none());
        assert_eq!(result.error_kind(), Some(SynthesisErrorKind::Configuration));
        assert!(result.error_message.unwrap().contains("not available"));
    }
}
