//! Page rendering through Poppler's `pdftoppm`.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;

use image::GrayImage;

use super::PageRasterizer;
use crate::error::OcrError;

const TOOL: &str = "pdftoppm";

/// Renders single pages with `pdftoppm -gray -png -singlefile`.
#[derive(Debug, Clone)]
pub struct PdftoppmRasterizer {
    binary: PathBuf,
}

impl Default for PdftoppmRasterizer {
    fn default() -> Self {
        Self {
            binary: PathBuf::from(TOOL),
        }
    }
}

impl PdftoppmRasterizer {
    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Whether the binary can be spawned at all.
    pub fn is_available(&self) -> bool {
        Command::new(&self.binary).arg("-v").output().is_ok()
    }
}

impl PageRasterizer for PdftoppmRasterizer {
    fn rasterize(&self, pdf: &Path, page_number: u32, dpi: u32) -> Result<GrayImage, OcrError> {
        let out_dir = tempfile::tempdir()?;
        let prefix = out_dir.path().join("page");
        let page = page_number.to_string();
        let dpi_arg = dpi.to_string();

        let output = Command::new(&self.binary)
            .args(["-f", page.as_str(), "-l", page.as_str()])
            .args(["-r", dpi_arg.as_str()])
            .args(["-gray", "-png", "-singlefile"])
            .arg(pdf)
            .arg(&prefix)
            .output()
            .map_err(|e| spawn_error(TOOL, e))?;

        if !output.status.success() {
            return Err(OcrError::ToolFailed {
                tool: TOOL,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let image = image::open(prefix.with_extension("png"))?;
        tracing::debug!(page = page_number, dpi, width = image.width(), height = image.height(), "Rasterized page");
        Ok(image.to_luma8())
    }
}

pub(crate) fn spawn_error(tool: &'static str, e: std::io::Error) -> OcrError {
    if e.kind() == ErrorKind::NotFound {
        OcrError::ToolUnavailable { tool, source: e }
    } else {
        OcrError::Io(e)
    }
}
