//! Word-budgeted chunking of normalized pages.
//!
//! Pages are accumulated greedily in document order. A chunk closes when the
//! next page would push it past the word budget. No page is ever split.

mod types;

pub use types::{Chunk, ChunkConfig};

use crate::document::Page;

/// Separator placed between page texts inside a chunk.
pub const PAGE_SEPARATOR: &str = "\n\n";

/// Group pages into chunks. Every page lands in exactly one chunk; zero-word
/// pages are kept. An empty page list yields no chunks.
pub fn chunk_pages(pages: &[Page], config: &ChunkConfig) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut current: Vec<&Page> = Vec::new();
    let mut current_words = 0usize;

    for page in pages {
        let words = page.word_count();
        if !current.is_empty() && current_words + words > config.word_budget {
            chunks.push(build_chunk(chunks.len(), &current, current_words));
            current.clear();
            current_words = 0;
        }
        current.push(page);
        current_words += words;
    }

    if !current.is_empty() {
        chunks.push(build_chunk(chunks.len(), &current, current_words));
    }

    let oversized = chunks.iter().filter(|c| c.word_count > config.word_budget).count();
    tracing::debug!(
        pages = pages.len(),
        chunks = chunks.len(),
        oversized,
        budget = config.word_budget,
        "Chunked document"
    );
    chunks
}

fn build_chunk(index: usize, pages: &[&Page], word_count: usize) -> Chunk {
    let text = pages
        .iter()
        .map(|p| p.text.as_str())
        .collect::<Vec<_>>()
        .join(PAGE_SEPARATOR);
    Chunk {
        index,
        first_page: pages.first().map_or(0, |p| p.index),
        last_page: pages.last().map_or(0, |p| p.index),
        text,
        word_count,
    }
}
