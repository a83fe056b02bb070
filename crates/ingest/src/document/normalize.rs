//! Page text normalization. Text-layer and OCR output leave here in the same shape.

use super::ExtractionOrigin;

/// Longest run of digits that counts as a standalone page number line.
const MAX_PAGE_NUMBER_DIGITS: usize = 4;

/// Normalize raw page text for its origin.
///
/// Steps, in order: unify line endings, drop page-number lines, join words
/// hyphenated across a line break, strip control characters, collapse
/// whitespace, trim. `Empty` pages always normalize to the empty string.
pub fn normalize_page_text(raw: &str, origin: ExtractionOrigin) -> String {
    if origin == ExtractionOrigin::Empty {
        return String::new();
    }

    let unified = raw.replace("\r\n", "\n").replace(['\r', '\x0C'], "\n");
    let lines: Vec<&str> = unified
        .split('\n')
        .filter(|line| !is_page_number(line))
        .collect();

    let joined = dehyphenate(&lines);
    let visible: String = joined
        .chars()
        .filter(|c| !c.is_control() || c.is_whitespace())
        .collect();

    visible.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_page_number(line: &str) -> bool {
    let t = line.trim();
    !t.is_empty() && t.len() <= MAX_PAGE_NUMBER_DIGITS && t.bytes().all(|b| b.is_ascii_digit())
}

/// Join `exam-` + `ple` into `example` when the hyphen follows a letter and
/// the next line starts lowercase. Compound words split at a line end
/// (`well-` / `known`) are joined too; that imprecision is accepted.
fn dehyphenate(lines: &[&str]) -> String {
    let mut out = String::new();
    let mut continues_word = false;

    for (i, line) in lines.iter().enumerate() {
        let line = if continues_word { line.trim_start() } else { line };
        let next_lower = lines
            .get(i + 1)
            .and_then(|next| next.trim_start().chars().next())
            .is_some_and(char::is_lowercase);

        let trimmed = line.trim_end();
        let mut tail = trimmed.chars().rev();
        let hyphen_after_letter =
            tail.next() == Some('-') && tail.next().is_some_and(char::is_alphabetic);

        if hyphen_after_letter && next_lower {
            out.push_str(&trimmed[..trimmed.len() - 1]);
            continues_word = true;
        } else {
            out.push_str(line);
            out.push('\n');
            continues_word = false;
        }
    }
    out
}
