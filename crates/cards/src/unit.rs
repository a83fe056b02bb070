//! Generated card records and cloze mask handling.

use serde::{Deserialize, Serialize};

/// One candidate flashcard.
///
/// Basic units carry a question and its answer. Cloze units carry the masked
/// sentence (`{{c1::term}}`) as the prompt and the fully revealed sentence as
/// the answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedUnit {
    pub prompt: String,
    pub answer: String,
    pub is_cloze: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
}

impl GeneratedUnit {
    pub fn basic(prompt: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            answer: answer.into(),
            is_cloze: false,
            topic: None,
        }
    }

    /// Cloze unit from masked text; the answer is the text with masks revealed.
    pub fn cloze(text: impl Into<String>) -> Self {
        let prompt = text.into();
        let answer = reveal_cloze(&prompt);
        Self {
            prompt,
            answer,
            is_cloze: true,
            topic: None,
        }
    }

    pub fn with_topic(mut self, topic: Option<String>) -> Self {
        self.topic = topic.filter(|t| !t.trim().is_empty());
        self
    }

    pub fn kind(&self) -> &'static str {
        if self.is_cloze {
            "cloze"
        } else {
            "basic"
        }
    }
}

// ── Cloze masks ─────────────────────────────────────────────────────────────

/// One `{{cN::term}}` or `{{cN::term::hint}}` occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClozeMask<'a> {
    pub number: u32,
    pub term: &'a str,
    /// Byte range of the whole mask in the source text.
    pub span: std::ops::Range<usize>,
}

/// All well-formed cloze masks in `text`, in order.
pub fn cloze_masks(text: &str) -> Vec<ClozeMask<'_>> {
    let mut masks = Vec::new();
    let mut from = 0;

    while let Some(offset) = text[from..].find("{{c") {
        let start = from + offset;
        match parse_mask(text, start) {
            Some(mask) => {
                from = mask.span.end;
                masks.push(mask);
            }
            None => from = start + 3,
        }
    }
    masks
}

fn parse_mask(text: &str, start: usize) -> Option<ClozeMask<'_>> {
    let rest = &text[start + 3..];
    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let number: u32 = rest[..digits].parse().ok()?;
    let body = rest[digits..].strip_prefix("::")?;
    let close = body.find("}}")?;
    let inner = &body[..close];
    let term = inner.split("::").next().unwrap_or(inner);
    if term.trim().is_empty() {
        return None;
    }
    // "{{c" + digits + "::" + inner + "}}"
    let end = start + 3 + digits + 2 + close + 2;
    Some(ClozeMask {
        number,
        term,
        span: start..end,
    })
}

pub fn has_cloze_mask(text: &str) -> bool {
    !cloze_masks(text).is_empty()
}

/// Replace every mask with its term, dropping hints.
pub fn reveal_cloze(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for mask in cloze_masks(text) {
        out.push_str(&text[last..mask.span.start]);
        out.push_str(mask.term);
        last = mask.span.end;
    }
    out.push_str(&text[last..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_numbered_masks_with_and_without_hints() {
        let text = "{{c1::Oxidative phosphorylation}} yields about {{c2::30::number}} ATP.";
        let masks = cloze_masks(text);
        assert_eq!(masks.len(), 2);
        assert_eq!((masks[0].number, masks[0].term), (1, "Oxidative phosphorylation"));
        assert_eq!((masks[1].number, masks[1].term), (2, "30"));
        assert_eq!(&text[masks[1].span.clone()], "{{c2::30::number}}");
    }

    #[test]
    fn malformed_masks_are_ignored() {
        assert!(!has_cloze_mask("{{c::missing number}}"));
        assert!(!has_cloze_mask("{{c1:single colon}}"));
        assert!(!has_cloze_mask("{{c1::never closed"));
        assert!(!has_cloze_mask("{{c1::}} empty"));
        assert!(!has_cloze_mask("plain sentence"));
        assert!(has_cloze_mask("{{c{{c3::nested start}}"));
    }

    #[test]
    fn reveal_unwraps_terms() {
        assert_eq!(
            reveal_cloze("The {{c1::mitochondrion}} makes {{c2::ATP::molecule}}."),
            "The mitochondrion makes ATP."
        );
        assert_eq!(reveal_cloze("no masks here"), "no masks here");
    }

    #[test]
    fn cloze_unit_answer_is_revealed_sentence() {
        let unit = GeneratedUnit::cloze("{{c1::Insulin}} lowers blood glucose.");
        assert!(unit.is_cloze);
        assert_eq!(unit.prompt, "{{c1::Insulin}} lowers blood glucose.");
        assert_eq!(unit.answer, "Insulin lowers blood glucose.");
        assert_eq!(unit.kind(), "cloze");
    }

    #[test]
    fn blank_topic_is_dropped() {
        let unit = GeneratedUnit::basic("q", "a").with_topic(Some("  ".into()));
        assert_eq!(unit.topic, None);
    }
}
