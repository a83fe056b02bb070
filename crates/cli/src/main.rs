mod cli;
mod config;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use pdfdeck_cards::{ingest_document, DeckExporter, JobRunner, LlmCardGenerator, TopicScanner};
use pdfdeck_core::config::load_dotenv;
use pdfdeck_ingest::ocr::engine::{self, TesseractRecognizer};
use pdfdeck_ingest::ocr::raster::PdftoppmRasterizer;
use pdfdeck_ingest::{CancelToken, ExtractionSettings, Extractor, SourceId};
use pdfdeck_llm::create_provider;

use crate::cli::CliArgs;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    load_dotenv();
    let args = CliArgs::parse();
    let (pipeline, llm) = config::resolve(&args)?;
    pipeline.log_summary();

    probe_ocr_tools();

    let bytes = tokio::fs::read(&args.pdf)
        .await
        .with_context(|| format!("failed to read {}", args.pdf.display()))?;
    let source = source_id(&args, &bytes);
    let extractor = Extractor::new(ExtractionSettings::from(&pipeline));

    let cancel = CancelToken::new();
    spawn_ctrl_c_handler(cancel.clone());

    if args.chunks_only {
        let (_, chunks) = ingest_document(
            Arc::new(extractor),
            bytes,
            source,
            cancel,
            pipeline.chunk_word_budget,
        )
        .await
        .context("ingestion failed")?;
        println!("{}", serde_json::to_string_pretty(&chunks)?);
        return Ok(());
    }

    llm.log_summary();
    let provider = create_provider(&llm).context("failed to create LLM provider")?;
    let generator = Arc::new(LlmCardGenerator::from_config(provider.clone(), &llm));
    let deck_name = pipeline.deck_name.clone();
    let language = pipeline.language;

    let runner = JobRunner::new(pipeline, extractor, generator)?
        .with_topic_scanner(TopicScanner::new(provider, language))
        .with_cancel_token(cancel);
    let output = runner.run(bytes, source).await.context("job failed")?;

    if output.units.is_empty() {
        warn!("No cards survived generation and filtering");
    }
    let manifest = output.manifest(&deck_name);
    let exporter = DeckExporter::new(args.output_path());
    exporter
        .write(&manifest)
        .with_context(|| format!("failed to write {}", exporter.path().display()))?;

    println!(
        "{} cards in {} deck(s) from {} pages ({} generated, {} dropped) -> {}",
        manifest.card_count,
        manifest.decks.len(),
        output.page_count,
        output.generated,
        output.report.dropped(),
        exporter.path().display()
    );
    Ok(())
}

fn source_id(args: &CliArgs, bytes: &[u8]) -> SourceId {
    match args.pdf.file_name() {
        Some(name) => SourceId::filename(name.to_string_lossy()),
        None => SourceId::from_bytes(bytes),
    }
}

/// Install the OCR engine and warn early when a scanned page would fail.
fn probe_ocr_tools() {
    let recognizer = TesseractRecognizer::default();
    if !recognizer.is_available() {
        warn!("tesseract not found on PATH; scanned pages will come out empty");
    }
    if let Err(e) = engine::install(Arc::new(recognizer)) {
        warn!(error = %e, "OCR engine already installed");
    }
    if !PdftoppmRasterizer::default().is_available() {
        warn!("pdftoppm not found on PATH; scanned pages will come out empty");
    }
}

fn spawn_ctrl_c_handler(cancel: CancelToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, cancelling job");
            cancel.cancel();
        }
    });
}
