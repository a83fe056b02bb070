//! OCR fallback for pages without a usable text layer.
//!
//! A page is rendered to grayscale, enhanced, segmented into column regions,
//! and each region is recognized separately. Region texts are joined in
//! reading order.

pub mod engine;
pub mod enhance;
pub mod layout;
pub mod raster;

use std::path::Path;

use image::GrayImage;
use serde::Serialize;

use crate::error::OcrError;

pub use layout::{BoundingBox, ReadingOrder};

/// Separator placed between region texts.
pub const REGION_SEPARATOR: &str = "\n\n";

// ── Backend seams ───────────────────────────────────────────────────────────

/// Renders one page of a PDF on disk to a grayscale raster.
pub trait PageRasterizer: Send + Sync {
    fn rasterize(&self, pdf: &Path, page_number: u32, dpi: u32) -> Result<GrayImage, OcrError>;
}

/// Recognizes the characters in one region image.
pub trait TextRecognizer: Send + Sync {
    fn recognize(&self, region: &GrayImage, language: &str) -> Result<String, OcrError>;

    fn name(&self) -> &str;
}

// ── Regions ─────────────────────────────────────────────────────────────────

/// A detected text block with its reading-order rank and recognized text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnRegion {
    pub bbox: BoundingBox,
    /// 0-based position in reading order.
    pub rank: usize,
    pub text: String,
}

/// Result of recognizing one page.
#[derive(Debug, Clone)]
pub struct PageOcr {
    pub regions: Vec<ColumnRegion>,
    pub order: ReadingOrder,
}

impl PageOcr {
    /// Region texts in rank order, joined by a blank line. Empty regions are skipped.
    pub fn text(&self) -> String {
        self.regions
            .iter()
            .map(|r| r.text.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(REGION_SEPARATOR)
    }
}

/// Enhance, segment, and recognize a rendered page.
///
/// A region that fails recognition contributes an empty string; the other
/// regions are still returned.
pub fn recognize_page(raster: &GrayImage, recognizer: &dyn TextRecognizer, language: &str) -> PageOcr {
    let enhanced = enhance::enhance(raster);
    let ink = enhance::ink_mask(&enhanced);
    let layout = layout::detect_regions(&ink);

    if layout.order == ReadingOrder::TopToBottom {
        tracing::debug!(regions = layout.boxes.len(), "Ambiguous column layout, reading top to bottom");
    }

    let regions = layout
        .boxes
        .iter()
        .enumerate()
        .map(|(rank, bbox)| {
            let crop = image::imageops::crop_imm(&enhanced, bbox.left, bbox.top, bbox.width, bbox.height)
                .to_image();
            let text = match recognizer.recognize(&crop, language) {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!(rank, error = %e, "Region recognition failed");
                    String::new()
                }
            };
            ColumnRegion {
                bbox: *bbox,
                rank,
                text,
            }
        })
        .collect();

    PageOcr {
        regions,
        order: layout.order,
    }
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;

    #[test]
    fn two_columns_are_read_left_then_right() {
        let page = page_with_blocks(400, 300, &[(20, 20, 160, 260), (220, 20, 160, 260)]);
        let recognizer = ScriptedRecognizer::default();
        let ocr = recognize_page(&page, &recognizer, "eng");

        assert_eq!(ocr.order, ReadingOrder::ColumnMajor);
        assert_eq!(ocr.regions.len(), 2);
        assert!(ocr.regions[0].bbox.left < ocr.regions[1].bbox.left);
        assert_eq!(ocr.text(), "region 0\n\nregion 1");
    }

    #[test]
    fn failed_region_yields_empty_text_but_keeps_others() {
        let page = page_with_blocks(400, 300, &[(20, 20, 160, 260), (220, 20, 160, 260)]);
        let recognizer = ScriptedRecognizer::failing_on(vec![0]);
        let ocr = recognize_page(&page, &recognizer, "eng");

        assert_eq!(ocr.regions.len(), 2);
        assert_eq!(ocr.regions[0].text, "");
        assert_eq!(ocr.regions[1].text, "region 1");
        assert_eq!(ocr.text(), "region 1");
    }

    #[test]
    fn blank_page_has_no_regions() {
        let page = page_with_blocks(200, 200, &[]);
        let recognizer = ScriptedRecognizer::default();
        let ocr = recognize_page(&page, &recognizer, "eng");
        assert!(ocr.regions.is_empty());
        assert_eq!(ocr.text(), "");
    }

    #[test]
    fn regions_are_cropped_to_ink() {
        let page = page_with_blocks(300, 300, &[(50, 40, 200, 100)]);
        let recognizer = ScriptedRecognizer::default();
        let ocr = recognize_page(&page, &recognizer, "eng");
        assert_eq!(ocr.regions.len(), 1);
        let sizes = recognizer.seen_sizes.lock().unwrap().clone();
        assert_eq!(sizes.len(), 1);
        let (w, h) = sizes[0];
        assert!(w <= 210 && w >= 200, "width {w}");
        assert!(h <= 110 && h >= 95, "height {h}");
    }
}
