pub mod audio;
pub mod chunking;
pub mod episodes;
pub mod pipeline;
pub mod tts;

// Re-export commonly used types for convenience
pub use chunking::{ChunkContentType, ChunkingStats, TextChunk, chunk_for_provider, chunk_text, normalize};

pub use tts::{
    AudioArtifact, AudioFormat, BaseTTS, BoxedTTS, JobId, ProviderKind, ProviderLimits,
    ProviderRegistry, SynthesisErrorKind, SynthesisRequest, SynthesisResult, TTSError, TTSResult,
    VoiceConfig, create_tts_provider,
};

pub use audio::{AudioConcatenator, ConcatError, ConcatMethod, ConcatOptions, ConcatOutcome, ConcatStatus};

pub use episodes::{BreakType, EpisodeSegment, EpisodeSegmenter};

pub use pipeline::{AudioPipeline, FallbackPolicy};
