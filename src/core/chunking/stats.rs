use std::collections::BTreeMap;

use serde::Serialize;

use super::{ChunkContentType, TextChunk};

/// Summary of a chunking result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChunkingStats {
    pub total_chunks: usize,
    pub total_characters: usize,
    pub total_estimated_duration_minutes: f64,
    pub average_chunk_size: f64,
    pub largest_chunk: usize,
    pub smallest_chunk: usize,
    /// Count per content type, every type present (possibly zero)
    pub chunk_types: BTreeMap<String, usize>,
}

impl ChunkingStats {
    pub fn from_chunks(chunks: &[TextChunk]) -> Self {
        let total_characters: usize = chunks.iter().map(|c| c.character_count).sum();
        let total_seconds: f64 = chunks.iter().map(|c| c.estimated_duration_seconds).sum();

        let chunk_types = ChunkContentType::all()
            .iter()
            .map(|t| {
                let count = chunks.iter().filter(|c| c.content_type == *t).count();
                (t.as_str().to_string(), count)
            })
            .collect();

        Self {
            total_chunks: chunks.len(),
            total_characters,
            total_estimated_duration_minutes: total_seconds / 60.0,
            average_chunk_size: if chunks.is_empty() {
                0.0
            } else {
                total_characters as f64 / chunks.len() as f64
            },
            largest_chunk: chunks.iter().map(|c| c.character_count).max().unwrap_or(0),
            smallest_chunk: chunks.iter().map(|c| c.character_count).min().unwrap_or(0),
            chunk_types,
        }
    }
}
