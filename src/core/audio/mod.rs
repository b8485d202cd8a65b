//! Audio concatenation: stitches ordered chunk audio into one artifact.
//!
//! The preferred path drives ffmpeg. When ffmpeg is missing or fails, WAV and
//! MP3 inputs are spliced in-process and anything else degrades to copying the
//! first segment, reported as [`ConcatStatus::Partial`].

mod concatenator;
pub mod ffmpeg;
mod splice;

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::core::tts::SynthesisErrorKind;

pub use concatenator::AudioConcatenator;
pub use ffmpeg::Ffmpeg;

/// Errors raised while concatenating audio segments.
#[derive(Debug, Error)]
pub enum ConcatError {
    #[error("No input segments to concatenate")]
    NoInput,

    #[error("Audio tool not available: {0}")]
    ToolUnavailable(String),

    #[error("ffmpeg exited with status {code:?}: {stderr}")]
    ToolFailed { code: Option<i32>, stderr: String },

    #[error("ffmpeg timed out after {0}s")]
    Timeout(u64),

    /// In-process splicing rejected the inputs
    #[error("Splice failed: {0}")]
    SpliceFailed(String),

    #[error("Output file {0} is missing or empty")]
    EmptyOutput(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConcatError {
    pub fn kind(&self) -> SynthesisErrorKind {
        SynthesisErrorKind::Concatenation
    }
}

impl From<hound::Error> for ConcatError {
    fn from(err: hound::Error) -> Self {
        match err {
            hound::Error::IoError(e) => Self::Io(e),
            other => Self::SpliceFailed(other.to_string()),
        }
    }
}

/// Caller's joining preferences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConcatOptions {
    /// Insert silence between consecutive segments
    pub add_pauses: bool,
    /// Overlap consecutive segments; ignored when `add_pauses` is set
    pub crossfade: bool,
}

impl Default for ConcatOptions {
    fn default() -> Self {
        Self {
            add_pauses: true,
            crossfade: false,
        }
    }
}

/// How the output was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConcatMethod {
    SingleFileCopy,
    Ffmpeg,
    StreamSplice,
    FirstSegmentOnly,
}

impl ConcatMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SingleFileCopy => "single-file copy",
            Self::Ffmpeg => "ffmpeg",
            Self::StreamSplice => "stream splice",
            Self::FirstSegmentOnly => "first segment only",
        }
    }
}

impl fmt::Display for ConcatMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether every input segment made it into the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConcatStatus {
    Complete,
    Partial,
}

/// Successful concatenation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConcatOutcome {
    pub output: PathBuf,
    pub method: ConcatMethod,
    pub status: ConcatStatus,
    /// Input segments present in the output
    pub segments_processed: usize,
    pub size_bytes: u64,
    pub warning: Option<String>,
}

impl ConcatOutcome {
    pub fn is_complete(&self) -> bool {
        self.status == ConcatStatus::Complete
    }
}
