use std::path::PathBuf;

use clap::Parser;

use pdfdeck_core::{AnswerFormat, CardType, Language, PipelineOverrides};

/// Turn a PDF (digital or scanned) into a flashcard deck.
///
/// Settings layer as defaults, then `PDFDECK_*` environment variables, then
/// the `--config` file, then these flags.
#[derive(Parser, Debug)]
#[command(name = "pdfdeck", version, about = "Turn a PDF into a flashcard deck")]
pub struct CliArgs {
    /// PDF to ingest
    pub pdf: PathBuf,

    /// Deck name (topic sub-decks become `name::topic`)
    #[arg(long)]
    pub deck_name: Option<String>,

    /// basic, cloze, or both
    #[arg(long)]
    pub card_type: Option<CardType>,

    /// sentences or bullets
    #[arg(long)]
    pub answer_format: Option<AnswerFormat>,

    /// Card language as ISO code or name (de, English, Español, ...)
    #[arg(long)]
    pub language: Option<Language>,

    /// Maximum words per chunk sent to the model
    #[arg(long)]
    pub chunk_word_budget: Option<usize>,

    /// Rasterization DPI for OCR pages (72..=1200)
    #[arg(long)]
    pub ocr_dpi: Option<u32>,

    /// Tesseract language spec (eng, deu+eng, ...) or `auto`
    #[arg(long)]
    pub ocr_language: Option<String>,

    /// Similarity at or above which a later card is dropped as a duplicate
    #[arg(long)]
    pub dedup_threshold: Option<f64>,

    /// Minimum answer length in characters
    #[arg(long)]
    pub min_answer_length: Option<usize>,

    /// Generation calls in flight at once
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Extraction worker threads (default: all cores)
    #[arg(long)]
    pub workers: Option<usize>,

    /// Scan for the document's main topics and build one sub-deck per topic
    #[arg(long)]
    pub topics: bool,

    /// LLM provider override: openai or ollama
    #[arg(long)]
    pub provider: Option<String>,

    /// Model name override for the selected provider
    #[arg(long)]
    pub model: Option<String>,

    /// Where to write the deck manifest (default: `<pdf stem>.deck.json`)
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// TOML settings file with `[pipeline]` and `[llm]` tables
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Print chunks as JSON and stop before generation (no LLM needed)
    #[arg(long)]
    pub chunks_only: bool,
}

impl CliArgs {
    /// Pipeline flags as the topmost override layer.
    pub fn pipeline_overrides(&self) -> PipelineOverrides {
        PipelineOverrides {
            deck_name: self.deck_name.clone(),
            card_type: self.card_type,
            answer_format: self.answer_format,
            language: self.language,
            chunk_word_budget: self.chunk_word_budget,
            ocr_dpi: self.ocr_dpi,
            ocr_language: self.ocr_language.clone(),
            dedup_threshold: self.dedup_threshold,
            min_answer_length: self.min_answer_length,
            workers: self.workers,
            generation_concurrency: self.concurrency,
            topic_scan: self.topics.then_some(true),
        }
    }

    pub fn output_path(&self) -> PathBuf {
        self.output.clone().unwrap_or_else(|| {
            let stem = self
                .pdf
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "deck".to_string());
            PathBuf::from(format!("{stem}.deck.json"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_parse_into_overrides() {
        let args = CliArgs::parse_from([
            "pdfdeck",
            "notes.pdf",
            "--card-type",
            "cloze",
            "--language",
            "Deutsch",
            "--dedup-threshold",
            "0.8",
            "--concurrency",
            "2",
            "--topics",
        ]);
        let overrides = args.pipeline_overrides();
        assert_eq!(overrides.card_type, Some(CardType::Cloze));
        assert_eq!(overrides.language, Some(Language::German));
        assert_eq!(overrides.dedup_threshold, Some(0.8));
        assert_eq!(overrides.generation_concurrency, Some(2));
        assert_eq!(overrides.topic_scan, Some(true));
        assert_eq!(overrides.deck_name, None);
    }

    #[test]
    fn topics_flag_absent_leaves_lower_layers_alone() {
        let args = CliArgs::parse_from(["pdfdeck", "notes.pdf"]);
        assert_eq!(args.pipeline_overrides().topic_scan, None);
    }

    #[test]
    fn unknown_language_is_rejected() {
        assert!(CliArgs::try_parse_from(["pdfdeck", "a.pdf", "--language", "klingon"]).is_err());
    }

    #[test]
    fn default_output_follows_pdf_name() {
        let args = CliArgs::parse_from(["pdfdeck", "/tmp/lectures/week1.pdf"]);
        assert_eq!(args.output_path(), PathBuf::from("week1.deck.json"));
        let args = CliArgs::parse_from(["pdfdeck", "a.pdf", "-o", "out/deck.json"]);
        assert_eq!(args.output_path(), PathBuf::from("out/deck.json"));
    }
}
