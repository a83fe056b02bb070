//! Chunk configuration and output types.

use std::ops::RangeInclusive;

use serde::Serialize;

// ── Configuration ───────────────────────────────────────────────────────────

/// Configuration for the chunker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkConfig {
    /// Maximum words per chunk (default: 2000). A single page above the
    /// budget becomes its own oversized chunk; pages are never split.
    pub word_budget: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            word_budget: pdfdeck_core::config::DEFAULT_CHUNK_WORD_BUDGET,
        }
    }
}

// ── Chunk output ────────────────────────────────────────────────────────────

/// Consecutive pages batched for one generation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chunk {
    /// 0-based position among the document's chunks.
    pub index: usize,
    /// Index of the first page in this chunk.
    pub first_page: usize,
    /// Index of the last page in this chunk (inclusive).
    pub last_page: usize,
    /// Page texts joined by a blank line.
    pub text: String,
    /// Whitespace-delimited word count of `text`.
    pub word_count: usize,
}

impl Chunk {
    pub fn page_range(&self) -> RangeInclusive<usize> {
        self.first_page..=self.last_page
    }

    pub fn page_count(&self) -> usize {
        self.last_page - self.first_page + 1
    }
}
