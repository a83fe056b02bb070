//! PDF ingestion: per-page text extraction with OCR fallback, normalization,
//! and word-budgeted chunking.

pub mod cancel;
pub mod chunker;
pub mod document;
pub mod error;
pub mod extract;
pub mod ocr;

pub use cancel::CancelToken;
pub use chunker::{chunk_pages, Chunk, ChunkConfig};
pub use document::{Document, ExtractionOrigin, Page, PageClass, SourceId};
pub use error::{IngestError, OcrError};
pub use extract::{ExtractionSettings, Extractor};
