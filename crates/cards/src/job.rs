//! One PDF in, one filtered card set out.
//!
//! Extraction runs on the blocking pool (it drives its own rayon pool),
//! generation fans out over chunks with bounded concurrency, and the quality
//! filter runs once over all units in chunk order.

use std::sync::Arc;
use std::time::Instant;

use futures::stream::{self, StreamExt};
use tracing::{info, warn};

use pdfdeck_core::PipelineConfig;
use pdfdeck_ingest::{chunk_pages, CancelToken, Chunk, ChunkConfig, Document, Extractor, SourceId};

use crate::error::JobError;
use crate::export::DeckManifest;
use crate::generator::{CardGenerator, GenerationRequest};
use crate::quality::{filter_units, FilterReport, QualityConfig};
use crate::topics::{Topic, TopicScanner};
use crate::unit::GeneratedUnit;

/// Everything a finished job produced.
#[derive(Debug, Clone)]
pub struct JobOutput {
    pub source: SourceId,
    pub page_count: usize,
    pub chunks: Vec<Chunk>,
    pub topics: Vec<Topic>,
    /// Units before filtering, across all chunks.
    pub generated: usize,
    /// Chunks whose generation call failed and contributed nothing.
    pub failed_chunks: usize,
    pub units: Vec<GeneratedUnit>,
    pub report: FilterReport,
}

impl JobOutput {
    /// Topic sub-decks when topics were scanned, otherwise a single deck.
    pub fn manifest(&self, deck_name: &str) -> DeckManifest {
        let manifest = if self.topics.is_empty() {
            DeckManifest::single(deck_name, self.units.clone())
        } else {
            let names: Vec<String> = self.topics.iter().map(|t| t.name.clone()).collect();
            DeckManifest::by_topic(deck_name, self.units.clone(), &names)
        };
        manifest.with_source(self.source.to_string())
    }
}

/// Run extraction on the blocking pool, then chunk the pages.
pub async fn ingest_document(
    extractor: Arc<Extractor>,
    bytes: Vec<u8>,
    source: SourceId,
    cancel: CancelToken,
    word_budget: usize,
) -> Result<(Document, Vec<Chunk>), JobError> {
    let document = tokio::task::spawn_blocking(move || extractor.extract(&bytes, source, &cancel)).await??;
    let chunks = chunk_pages(document.pages(), &ChunkConfig { word_budget });
    info!(
        source = %document.source,
        pages = document.page_count(),
        chunks = chunks.len(),
        "Document chunked"
    );
    Ok((document, chunks))
}

enum ChunkOutcome {
    Generated(Vec<GeneratedUnit>),
    Failed,
    Skipped,
}

pub struct JobRunner {
    config: PipelineConfig,
    extractor: Arc<Extractor>,
    generator: Arc<dyn CardGenerator>,
    scanner: Option<TopicScanner>,
    cancel: CancelToken,
}

impl JobRunner {
    /// Validates `config` up front so nothing runs on a bad configuration.
    pub fn new(
        config: PipelineConfig,
        extractor: Extractor,
        generator: Arc<dyn CardGenerator>,
    ) -> Result<Self, JobError> {
        config.validate()?;
        Ok(Self {
            config,
            extractor: Arc::new(extractor),
            generator,
            scanner: None,
            cancel: CancelToken::new(),
        })
    }

    /// Used only when `topic_scan` is enabled.
    pub fn with_topic_scanner(mut self, scanner: TopicScanner) -> Self {
        self.scanner = Some(scanner);
        self
    }

    /// Share an existing token instead of the runner's own.
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Handle for cancelling this job from elsewhere (e.g. a signal handler).
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Extract and chunk without generating.
    pub async fn ingest(&self, bytes: Vec<u8>, source: SourceId) -> Result<(Document, Vec<Chunk>), JobError> {
        ingest_document(
            Arc::clone(&self.extractor),
            bytes,
            source,
            self.cancel.clone(),
            self.config.chunk_word_budget,
        )
        .await
    }

    pub async fn run(&self, bytes: Vec<u8>, source: SourceId) -> Result<JobOutput, JobError> {
        let started = Instant::now();
        let (document, chunks) = self.ingest(bytes, source).await?;
        self.check_cancelled()?;

        let topics = self.scan_topics(&chunks).await;
        self.check_cancelled()?;

        let topic_names: Vec<String> = topics.iter().map(|t| t.name.clone()).collect();
        let (units, failed_chunks) = self.generate(&chunks, &topic_names).await?;
        let generated = units.len();

        let (units, report) = filter_units(units, &QualityConfig::from(&self.config));
        info!(
            source = %document.source,
            chunks = chunks.len(),
            failed_chunks,
            generated,
            accepted = report.accepted,
            dropped = report.dropped(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Job complete"
        );

        Ok(JobOutput {
            source: document.source.clone(),
            page_count: document.page_count(),
            chunks,
            topics,
            generated,
            failed_chunks,
            units,
            report,
        })
    }

    async fn scan_topics(&self, chunks: &[Chunk]) -> Vec<Topic> {
        if !self.config.topic_scan {
            return Vec::new();
        }
        let Some(scanner) = &self.scanner else {
            warn!("Topic scan requested but no scanner configured");
            return Vec::new();
        };
        let topics = scanner.scan(chunks).await;
        if topics.is_empty() {
            warn!("Topic scan found nothing, generating without topic restriction");
        }
        topics
    }

    /// Generate for every chunk; results come back in chunk order.
    async fn generate(&self, chunks: &[Chunk], topics: &[String]) -> Result<(Vec<GeneratedUnit>, usize), JobError> {
        let requests: Vec<GenerationRequest> = chunks
            .iter()
            .map(|chunk| GenerationRequest::for_chunk(chunk, &self.config, topics))
            .collect();

        let mut outcomes: Vec<(usize, ChunkOutcome)> = stream::iter(requests)
            .map(|request| {
                let generator = Arc::clone(&self.generator);
                let cancel = self.cancel.clone();
                async move {
                    if cancel.is_cancelled() {
                        return (request.chunk_index, ChunkOutcome::Skipped);
                    }
                    match generator.generate(&request).await {
                        Ok(units) => (request.chunk_index, ChunkOutcome::Generated(units)),
                        Err(e) => {
                            warn!(chunk = request.chunk_index, error = %e, "Generation failed, chunk yields no cards");
                            (request.chunk_index, ChunkOutcome::Failed)
                        }
                    }
                }
            })
            .buffer_unordered(self.config.generation_concurrency.max(1))
            .collect()
            .await;

        // In-flight results are discarded once cancelled.
        self.check_cancelled()?;

        outcomes.sort_by_key(|(index, _)| *index);
        let mut units = Vec::new();
        let mut failed = 0;
        for (_, outcome) in outcomes {
            match outcome {
                ChunkOutcome::Generated(batch) => units.extend(batch),
                ChunkOutcome::Failed => failed += 1,
                ChunkOutcome::Skipped => {}
            }
        }
        Ok((units, failed))
    }

    fn check_cancelled(&self) -> Result<(), JobError> {
        if self.cancel.is_cancelled() {
            Err(JobError::Cancelled)
        } else {
            Ok(())
        }
    }
}
