//! Text-layer extraction with decode failures turned into an OCR escalation.

use super::classify::{classify_page, PageClass};
use super::source::PdfSource;

/// What the text layer of one page yielded, plus its classification.
#[derive(Debug, Clone)]
pub struct TextLayerProbe {
    pub index: usize,
    /// Raw text as decoded; word order kept, hyphenation untouched.
    pub text: String,
    pub has_images: bool,
    pub class: PageClass,
}

/// Read and classify one page. A decode error empties the text and sends the
/// page to OCR instead of failing the document.
pub fn probe_page(source: &PdfSource, index: usize) -> TextLayerProbe {
    let has_images = source.page_has_images(index);
    match source.text_layer(index) {
        Ok(text) => {
            let class = classify_page(&text, has_images);
            TextLayerProbe {
                index,
                text,
                has_images,
                class,
            }
        }
        Err(e) => {
            tracing::warn!(page = index, error = %e, "Text layer decode failed, escalating to OCR");
            TextLayerProbe {
                index,
                text: String::new(),
                has_images,
                class: PageClass::NeedsOcr,
            }
        }
    }
}
