//! Parallel page extraction: classify every page, read text layers, OCR the
//! rest, normalize, and assemble the immutable [`Document`].

use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use pdfdeck_core::config::DEFAULT_OCR_DPI;
use pdfdeck_core::PipelineConfig;

use crate::cancel::CancelToken;
use crate::document::text_layer::{probe_page, TextLayerProbe};
use crate::document::{normalize_page_text, Document, ExtractionOrigin, Page, PageClass, PdfSource, SourceId};
use crate::error::IngestError;
use crate::ocr::raster::PdftoppmRasterizer;
use crate::ocr::{engine, recognize_page, PageRasterizer, TextRecognizer};

/// Knobs the extractor needs out of the pipeline config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionSettings {
    pub ocr_dpi: u32,
    /// Tesseract language spec, already resolved (`deu+eng`, not `auto`).
    pub ocr_language: String,
    pub workers: usize,
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        Self {
            ocr_dpi: DEFAULT_OCR_DPI,
            ocr_language: "eng".to_string(),
            workers: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
        }
    }
}

impl From<&PipelineConfig> for ExtractionSettings {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            ocr_dpi: config.ocr_dpi,
            ocr_language: config.resolved_ocr_language(),
            workers: config.resolved_workers(),
        }
    }
}

/// Turns PDF bytes into a normalized [`Document`].
pub struct Extractor {
    settings: ExtractionSettings,
    rasterizer: Arc<dyn PageRasterizer>,
    recognizer: Arc<dyn TextRecognizer>,
}

impl Extractor {
    /// Extractor backed by `pdftoppm` and the process-wide OCR engine.
    pub fn new(settings: ExtractionSettings) -> Self {
        Self::with_backends(settings, Arc::new(PdftoppmRasterizer::default()), engine::shared())
    }

    pub fn with_backends(
        settings: ExtractionSettings,
        rasterizer: Arc<dyn PageRasterizer>,
        recognizer: Arc<dyn TextRecognizer>,
    ) -> Self {
        Self {
            settings,
            rasterizer,
            recognizer,
        }
    }

    pub fn settings(&self) -> &ExtractionSettings {
        &self.settings
    }

    /// Extract every page. Page-level failures degrade that page to empty
    /// text; the call only fails when the PDF cannot be loaded, nothing at all
    /// could be extracted, or `cancel` fires.
    pub fn extract(&self, bytes: &[u8], source: SourceId, cancel: &CancelToken) -> Result<Document, IngestError> {
        let started = Instant::now();
        let pdf = PdfSource::load(bytes)?;
        let page_count = pdf.page_count();
        info!(source = %source, pages = page_count, workers = self.settings.workers, "Extracting PDF");

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.settings.workers.max(1))
            .thread_name(|i| format!("pdfdeck-extract-{i}"))
            .build()?;

        let probes: Vec<Option<TextLayerProbe>> = pool.install(|| {
            (0..page_count)
                .into_par_iter()
                .map(|index| (!cancel.is_cancelled()).then(|| probe_page(&pdf, index)))
                .collect()
        });
        if cancel.is_cancelled() {
            return Err(IngestError::Cancelled);
        }
        let probes: Vec<TextLayerProbe> = probes.into_iter().flatten().collect();

        let ocr_pages = probes.iter().filter(|p| p.class.needs_ocr()).count();
        let staged = if ocr_pages > 0 {
            debug!(ocr_pages, "Staging PDF for rasterization");
            Some(stage_pdf(bytes)?)
        } else {
            None
        };
        let staged_path = staged.as_ref().map(|file| file.path());

        let pages: Vec<Option<Page>> = pool.install(|| {
            probes
                .into_par_iter()
                .map(|probe| (!cancel.is_cancelled()).then(|| self.finish_page(probe, staged_path)))
                .collect()
        });
        if cancel.is_cancelled() {
            return Err(IngestError::Cancelled);
        }
        let pages: Vec<Page> = pages.into_iter().flatten().collect();

        if pages.iter().all(Page::is_blank) {
            return Err(IngestError::NoExtractableText { pages: page_count });
        }

        let document = Document::new(source, pages);
        let (text_layer, ocr, empty) = document.origin_counts();
        info!(
            source = %document.source,
            pages = page_count,
            text_layer,
            ocr,
            empty,
            words = document.total_words(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Extraction complete"
        );
        Ok(document)
    }

    /// Run recognition again on a page's retained raster. `None` when the
    /// page was not rendered for OCR.
    pub fn rerecognize(&self, page: &Page) -> Option<String> {
        let raster = page.raster.as_ref()?;
        let ocr = recognize_page(raster, self.recognizer.as_ref(), &self.settings.ocr_language);
        Some(normalize_page_text(&ocr.text(), ExtractionOrigin::Ocr))
    }

    fn finish_page(&self, probe: TextLayerProbe, staged: Option<&Path>) -> Page {
        match probe.class {
            PageClass::TextLayer => Page {
                index: probe.index,
                text: normalize_page_text(&probe.text, ExtractionOrigin::TextLayer),
                origin: ExtractionOrigin::TextLayer,
                raster: None,
            },
            PageClass::Empty => Page {
                index: probe.index,
                text: String::new(),
                origin: ExtractionOrigin::Empty,
                raster: None,
            },
            PageClass::NeedsOcr => self.ocr_page(probe, staged),
        }
    }

    fn ocr_page(&self, probe: TextLayerProbe, staged: Option<&Path>) -> Page {
        let index = probe.index;
        let page_number = index as u32 + 1;

        let rendered = match staged {
            Some(path) => self.rasterizer.rasterize(path, page_number, self.settings.ocr_dpi),
            None => {
                warn!(page = index, "No staged PDF for OCR page");
                return short_text_fallback(probe);
            }
        };

        let raster = match rendered {
            Ok(raster) => raster,
            Err(e) => {
                warn!(page = index, error = %e, "Rasterization failed, page degrades to empty text");
                return short_text_fallback(probe);
            }
        };

        let ocr = recognize_page(&raster, self.recognizer.as_ref(), &self.settings.ocr_language);
        let text = normalize_page_text(&ocr.text(), ExtractionOrigin::Ocr);
        debug!(
            page = index,
            regions = ocr.regions.len(),
            order = ?ocr.order,
            words = text.split_whitespace().count(),
            "OCR page"
        );

        if text.is_empty() && !probe.text.trim().is_empty() {
            return short_text_fallback(probe);
        }

        Page {
            index,
            text,
            origin: ExtractionOrigin::Ocr,
            raster: Some(Arc::new(raster)),
        }
    }
}

/// When OCR produced nothing, a short text layer is better than no text.
fn short_text_fallback(probe: TextLayerProbe) -> Page {
    let text = normalize_page_text(&probe.text, ExtractionOrigin::TextLayer);
    let origin = if text.is_empty() {
        ExtractionOrigin::Ocr
    } else {
        ExtractionOrigin::TextLayer
    };
    Page {
        index: probe.index,
        text,
        origin,
        raster: None,
    }
}

/// `pdftoppm` reads from disk, so OCR pages need the bytes in a temp file.
fn stage_pdf(bytes: &[u8]) -> Result<NamedTempFile, IngestError> {
    let mut file = tempfile::Builder::new()
        .prefix("pdfdeck-")
        .suffix(".pdf")
        .tempfile()
        .map_err(IngestError::Staging)?;
    file.write_all(bytes).map_err(IngestError::Staging)?;
    file.flush().map_err(IngestError::Staging)?;
    Ok(file)
}
