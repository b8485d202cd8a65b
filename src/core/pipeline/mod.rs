//! Synthesis orchestration: single-request and chunked jobs with single-hop
//! provider fallback.

mod fallback;
mod orchestrator;

pub use fallback::FallbackPolicy;
pub use orchestrator::AudioPipeline;
