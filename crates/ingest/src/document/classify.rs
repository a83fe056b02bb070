//! Decide per page whether the text layer is usable or the page needs OCR.

use serde::Serialize;

/// Text layers shorter than this (after whitespace collapsing) are suspect
/// when the page also carries images.
pub const MIN_TEXT_LAYER_CHARS: usize = 80;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PageClass {
    TextLayer,
    NeedsOcr,
    Empty,
}

impl PageClass {
    pub fn needs_ocr(&self) -> bool {
        matches!(self, PageClass::NeedsOcr)
    }
}

/// Classify a page from its raw text layer and whether it paints images.
///
/// A short text layer on a page without images is kept as is; a page with
/// neither text nor images is empty, not an error.
pub fn classify_page(text_layer: &str, has_images: bool) -> PageClass {
    let chars = visible_chars(text_layer);
    if chars >= MIN_TEXT_LAYER_CHARS {
        return PageClass::TextLayer;
    }
    match (chars, has_images) {
        (_, true) => PageClass::NeedsOcr,
        (0, false) => PageClass::Empty,
        _ => PageClass::TextLayer,
    }
}

/// Character count after collapsing whitespace runs to one space and trimming.
fn visible_chars(text: &str) -> usize {
    let mut count = 0;
    let mut pending_space = false;
    for c in text.chars() {
        if c.is_whitespace() {
            pending_space = count > 0;
        } else {
            if pending_space {
                count += 1;
                pending_space = false;
            }
            count += 1;
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_text_layer_is_used_even_with_images() {
        let text = "word ".repeat(40);
        assert_eq!(classify_page(&text, true), PageClass::TextLayer);
        assert_eq!(classify_page(&text, false), PageClass::TextLayer);
    }

    #[test]
    fn short_text_with_images_needs_ocr() {
        assert_eq!(classify_page("Fig. 1", true), PageClass::NeedsOcr);
        assert_eq!(classify_page("", true), PageClass::NeedsOcr);
        assert!(classify_page("  \n ", true).needs_ocr());
    }

    #[test]
    fn short_text_without_images_keeps_text_layer() {
        assert_eq!(classify_page("Chapter 3", false), PageClass::TextLayer);
    }

    #[test]
    fn nothing_at_all_is_empty() {
        assert_eq!(classify_page("", false), PageClass::Empty);
        assert_eq!(classify_page(" \t\n\n ", false), PageClass::Empty);
    }

    #[test]
    fn threshold_counts_collapsed_whitespace() {
        // 79 visible chars padded with lots of whitespace stays below the bar.
        let short = format!("   {}   \n\n\n", "a".repeat(79));
        assert_eq!(visible_chars(&short), 79);
        assert_eq!(classify_page(&short, true), PageClass::NeedsOcr);

        // "aaaa bbbb" style runs: inner whitespace counts as one char.
        let words = "abcd     ".repeat(16);
        assert_eq!(visible_chars(&words), 16 * 5 - 1);
        assert_eq!(classify_page(&words, true), PageClass::NeedsOcr);

        let exact = "a".repeat(MIN_TEXT_LAYER_CHARS);
        assert_eq!(classify_page(&exact, true), PageClass::TextLayer);
    }
}
