//! The process-wide text recognizer and its default Tesseract implementation.

use std::path::PathBuf;
use std::process::Command;
use std::sync::{Arc, OnceLock};

use image::{GrayImage, ImageFormat};

use super::raster::spawn_error;
use super::TextRecognizer;
use crate::error::OcrError;

const TOOL: &str = "tesseract";
/// "Assume a single uniform block of text"; regions are already segmented.
const DEFAULT_PAGE_SEGMENTATION: u8 = 6;

static ENGINE: OnceLock<Arc<dyn TextRecognizer>> = OnceLock::new();

/// Install the recognizer for this process. Call once at startup, before any
/// extraction; a second call fails and leaves the first engine in place.
pub fn install(engine: Arc<dyn TextRecognizer>) -> Result<(), OcrError> {
    ENGINE.set(engine).map_err(|_| OcrError::AlreadyInstalled)
}

/// The installed recognizer, creating the default Tesseract engine on first use.
pub fn shared() -> Arc<dyn TextRecognizer> {
    ENGINE
        .get_or_init(|| {
            tracing::info!("Initializing default OCR engine ({TOOL})");
            Arc::new(TesseractRecognizer::default())
        })
        .clone()
}

/// Runs the `tesseract` CLI on each region image.
#[derive(Debug, Clone)]
pub struct TesseractRecognizer {
    binary: PathBuf,
    page_segmentation: u8,
}

impl Default for TesseractRecognizer {
    fn default() -> Self {
        Self {
            binary: PathBuf::from(TOOL),
            page_segmentation: DEFAULT_PAGE_SEGMENTATION,
        }
    }
}

impl TesseractRecognizer {
    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            ..Self::default()
        }
    }

    pub fn is_available(&self) -> bool {
        Command::new(&self.binary).arg("--version").output().is_ok()
    }
}

impl TextRecognizer for TesseractRecognizer {
    fn recognize(&self, region: &GrayImage, language: &str) -> Result<String, OcrError> {
        let file = tempfile::Builder::new()
            .prefix("pdfdeck-region-")
            .suffix(".png")
            .tempfile()?;
        region.save_with_format(file.path(), ImageFormat::Png)?;
        let psm = self.page_segmentation.to_string();

        let output = Command::new(&self.binary)
            .arg(file.path())
            .arg("stdout")
            .args(["-l", language])
            .args(["--psm", psm.as_str()])
            .output()
            .map_err(|e| spawn_error(TOOL, e))?;

        if !output.status.success() {
            return Err(OcrError::ToolFailed {
                tool: TOOL,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn name(&self) -> &str {
        TOOL
    }
}
