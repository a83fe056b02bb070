//! Flashcard side of the pipeline: generation over chunks, quality filtering,
//! topic scanning, deck export, and the job runner tying it to ingestion.

pub mod error;
pub mod export;
pub mod generator;
pub mod job;
pub mod parse;
pub mod prompt;
pub mod quality;
pub mod topics;
pub mod unit;

#[cfg(test)]
mod testing;

pub use error::{ExportError, GenerationError, JobError};
pub use export::{deck_id, DeckExporter, DeckManifest, DeckSection};
pub use generator::{CardGenerator, GenerationRequest, LlmCardGenerator};
pub use job::{ingest_document, JobOutput, JobRunner};
pub use quality::{filter_units, FilterReport, QualityConfig};
pub use topics::{Topic, TopicScanner};
pub use unit::GeneratedUnit;
