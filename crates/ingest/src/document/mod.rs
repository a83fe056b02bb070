//! The in-memory document model and the per-page extraction steps that fill it.

pub mod classify;
pub mod normalize;
pub mod source;
pub mod text_layer;

use std::fmt;
use std::sync::Arc;

use image::GrayImage;
use serde::Serialize;
use sha2::{Digest, Sha256};

pub use classify::{classify_page, PageClass, MIN_TEXT_LAYER_CHARS};
pub use normalize::normalize_page_text;
pub use source::PdfSource;

// ── Identity ────────────────────────────────────────────────────────────────

/// Where a document came from: the file name when known, otherwise a content hash.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum SourceId {
    Filename(String),
    ContentHash(String),
}

impl SourceId {
    /// Hex SHA-256 of the raw PDF bytes.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let digest = Sha256::digest(bytes);
        let hex = digest.iter().map(|b| format!("{b:02x}")).collect::<String>();
        SourceId::ContentHash(hex)
    }

    pub fn filename(name: impl Into<String>) -> Self {
        SourceId::Filename(name.into())
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceId::Filename(name) => f.write_str(name),
            SourceId::ContentHash(hash) => {
                let short: String = hash.chars().take(12).collect();
                write!(f, "sha256:{short}")
            }
        }
    }
}

// ── Pages ───────────────────────────────────────────────────────────────────

/// How a page's text was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExtractionOrigin {
    TextLayer,
    Ocr,
    Empty,
}

impl ExtractionOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionOrigin::TextLayer => "text-layer",
            ExtractionOrigin::Ocr => "ocr",
            ExtractionOrigin::Empty => "empty",
        }
    }
}

/// One normalized page.
#[derive(Debug, Clone)]
pub struct Page {
    /// 0-based position in the document.
    pub index: usize,
    /// Normalized text; empty when nothing could be extracted.
    pub text: String,
    pub origin: ExtractionOrigin,
    /// The rendered page, kept for OCR pages so recognition can be retried.
    pub raster: Option<Arc<GrayImage>>,
}

impl Page {
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }

    pub fn is_blank(&self) -> bool {
        self.text.is_empty()
    }
}

// ── Document ────────────────────────────────────────────────────────────────

/// An extracted document. Pages are in source order and never change after load.
#[derive(Debug, Clone)]
pub struct Document {
    pub source: SourceId,
    pages: Vec<Page>,
}

impl Document {
    pub fn new(source: SourceId, pages: Vec<Page>) -> Self {
        Self { source, pages }
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn total_words(&self) -> usize {
        self.pages.iter().map(Page::word_count).sum()
    }

    /// Count of pages per extraction origin: (text-layer, ocr, empty).
    pub fn origin_counts(&self) -> (usize, usize, usize) {
        self.pages
            .iter()
            .fold((0, 0, 0), |(t, o, e), page| match page.origin {
                ExtractionOrigin::TextLayer => (t + 1, o, e),
                ExtractionOrigin::Ocr => (t, o + 1, e),
                ExtractionOrigin::Empty => (t, o, e + 1),
            })
    }

    /// All page texts joined by a blank line.
    pub fn full_text(&self) -> String {
        self.pages
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}
