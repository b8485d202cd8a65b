//! Boundary-aware text chunking.
//!
//! Splits long narration into pieces that fit a provider's per-request
//! character ceiling while cutting at the most natural boundary available:
//! paragraph breaks first, commas last, whitespace only when nothing else fits.
//!
//! All lengths are counted in Unicode scalar values (`char`s), never bytes.
//!
//! # Example
//!
//! ```rust
//! use longform_tts::core::chunking::chunk_text;
//!
//! let text = "First paragraph.\n\nSecond paragraph.";
//! let chunks = chunk_text(text, 20, 0);
//! assert_eq!(chunks.len(), 2);
//! assert_eq!(chunks[0].text, "First paragraph.");
//! assert_eq!(chunks[1].text, "Second paragraph.");
//! ```

mod stats;

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::core::tts::ProviderKind;
use crate::core::tts::provider::estimate_duration_seconds;

pub use stats::ChunkingStats;

// =============================================================================
// Patterns
// =============================================================================

/// Split candidates from strongest to weakest.
///
/// Each pattern captures the separator in group 1; the split point is the end
/// of that group, so the separator stays with the preceding chunk.
static BREAK_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        // Paragraph break
        r"(\n\n+)",
        // Sentence end followed by a line break
        r"[.!?](\s*\n)",
        // Sentence boundary before a capitalized word
        r#"[.!?]["”]?(\s+)["“]?[A-Z]"#,
        // Comma before a transition word
        r",(\s+)(?:And|But|However|Meanwhile|Then|Now|Still) ",
        r";(\s+)",
        r":(\s+)",
        // Any comma
        r",(\s+)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("break pattern is a valid regex"))
    .collect()
});

static TRAILING_LINE_SPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t]+\n").expect("valid regex"));
static LEADING_LINE_SPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n[ \t]+").expect("valid regex"));
static BLANK_LINE_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid regex"));
static HORIZONTAL_SPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t]+").expect("valid regex"));
static RUN_ON_SENTENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([.!?])([A-Z])").expect("valid regex"));

static QUOTED_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""[^"]*"|“[^”]*”"#).expect("valid regex"));
static SENTENCE_PUNCT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]").expect("valid regex"));
static TRANSITION_WORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:Meanwhile|Then|Now|Later|Suddenly)\b").expect("valid regex")
});

// =============================================================================
// Types
// =============================================================================

/// Heuristic classification of a chunk's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkContentType {
    #[default]
    Narrative,
    Dialogue,
    Transition,
}

impl ChunkContentType {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Narrative => "narrative",
            Self::Dialogue => "dialogue",
            Self::Transition => "transition",
        }
    }

    pub fn all() -> &'static [ChunkContentType] {
        &[Self::Narrative, Self::Dialogue, Self::Transition]
    }

    /// Dialogue when quoted spans outnumber half the sentence marks,
    /// transition when a transition word appears, narrative otherwise.
    pub fn detect(text: &str) -> Self {
        let quoted = QUOTED_SPAN.find_iter(text).count() as f64;
        let sentences = SENTENCE_PUNCT.find_iter(text).count() as f64;
        if quoted > sentences * 0.5 {
            Self::Dialogue
        } else if TRANSITION_WORD.is_match(text) {
            Self::Transition
        } else {
            Self::Narrative
        }
    }
}

impl std::fmt::Display for ChunkContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One provider-sized piece of the source text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextChunk {
    pub text: String,
    /// 1-based position in the sequence
    pub index: usize,
    pub total_count: usize,
    pub character_count: usize,
    /// Spoken duration at 150 words per minute
    pub estimated_duration_seconds: f64,
    pub content_type: ChunkContentType,
}

impl TextChunk {
    fn new(text: String, index: usize, total_count: usize) -> Self {
        Self {
            character_count: text.chars().count(),
            estimated_duration_seconds: estimate_duration_seconds(&text, 1.0),
            content_type: ChunkContentType::detect(&text),
            text,
            index,
            total_count,
        }
    }
}

// =============================================================================
// Normalization
// =============================================================================

/// Canonical whitespace and punctuation spacing for synthesis.
///
/// - spaces around em-dashes
/// - no leading or trailing horizontal whitespace on any line
/// - at most one blank line between paragraphs
/// - single spaces inside lines
/// - a space after sentence punctuation directly followed by a capital letter
///
/// Normalizing twice yields the same text as normalizing once.
pub fn normalize(text: &str) -> String {
    let text = text.replace('—', " — ");
    let text = TRAILING_LINE_SPACE.replace_all(&text, "\n");
    let text = LEADING_LINE_SPACE.replace_all(&text, "\n");
    let text = BLANK_LINE_RUNS.replace_all(&text, "\n\n");
    let text = HORIZONTAL_SPACE.replace_all(&text, " ");
    let text = RUN_ON_SENTENCE.replace_all(&text, "$1 $2");
    text.trim().to_string()
}

// =============================================================================
// Chunking
// =============================================================================

/// Split `text` into chunks of at most `max_chars` characters.
///
/// Text that fits after normalization comes back as a single chunk equal to
/// the normalized text. With `overlap_chars > 0` each chunk after the first
/// starts up to `overlap_chars` characters before the previous split point,
/// snapped forward to a word start.
///
/// A `max_chars` of zero is treated as one.
pub fn chunk_text(text: &str, max_chars: usize, overlap_chars: usize) -> Vec<TextChunk> {
    let max_chars = max_chars.max(1);
    let normalized = normalize(text);

    let pieces = if normalized.chars().count() <= max_chars {
        vec![normalized]
    } else {
        split_pieces(&normalized, max_chars, overlap_chars)
    };

    let total = pieces.len();
    pieces
        .into_iter()
        .enumerate()
        .map(|(i, piece)| TextChunk::new(piece, i + 1, total))
        .collect()
}

/// Chunk with the character ceiling of a provider.
pub fn chunk_for_provider(text: &str, provider: ProviderKind) -> Vec<TextChunk> {
    chunk_text(text, provider.default_max_characters(), 0)
}

fn split_pieces(text: &str, max_chars: usize, overlap_chars: usize) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut remaining = text;

    while !remaining.is_empty() {
        let Some(window_end) = byte_offset(remaining, max_chars) else {
            pieces.push(remaining.to_string());
            break;
        };

        let split = find_break(&remaining[..window_end])
            .unwrap_or_else(|| force_split(remaining, window_end));

        let piece = remaining[..split].trim();
        if !piece.is_empty() {
            pieces.push(piece.to_string());
        }

        let next = next_start(remaining, split, overlap_chars);
        remaining = remaining[next..].trim_start();
    }

    pieces
}

/// Byte offset of the `n`-th char, or `None` when the text has at most `n` chars.
fn byte_offset(text: &str, n: usize) -> Option<usize> {
    text.char_indices().nth(n).map(|(i, _)| i)
}

/// Rightmost match of the first pattern that matches anywhere in `window`.
fn find_break(window: &str) -> Option<usize> {
    BREAK_PATTERNS.iter().find_map(|pattern| {
        pattern
            .captures_iter(window)
            .filter_map(|caps| caps.get(1).map(|sep| sep.end()))
            .filter(|&end| end > 0)
            .last()
    })
}

/// Whitespace at or before the window end, else exactly the window end.
fn force_split(text: &str, window_end: usize) -> usize {
    if text[window_end..].starts_with(char::is_whitespace) {
        return window_end;
    }
    text[..window_end]
        .char_indices()
        .rev()
        .find(|(i, c)| *i > 0 && c.is_whitespace())
        .map(|(i, _)| i)
        .unwrap_or(window_end)
}

fn next_start(text: &str, split: usize, overlap_chars: usize) -> usize {
    if overlap_chars == 0 {
        return split;
    }

    // Walk back `overlap_chars` chars, but never to the start of this chunk
    let mut start = split;
    for (i, _) in text[..split].char_indices().rev().take(overlap_chars) {
        start = i;
    }
    if start == 0 {
        start = text[..split]
            .char_indices()
            .nth(1)
            .map(|(i, _)| i)
            .unwrap_or(split);
    }

    // Snap forward to the start of the next word
    let starts_word = |i: usize| {
        text[..i]
            .chars()
            .next_back()
            .is_none_or(|c| c.is_whitespace())
    };
    while start < split && !starts_word(start) {
        start += text[start..].chars().next().map_or(1, char::len_utf8);
    }
    start
}
