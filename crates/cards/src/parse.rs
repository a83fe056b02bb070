//! Lenient parsing of LLM JSON payloads into cards and topics.
//!
//! Models wrap output in code fences, add prose around the object, or pick
//! their own top-level key. Anything unusable is skipped, never an error.

use serde_json::{Map, Value};
use tracing::debug;

use crate::topics::Topic;
use crate::unit::GeneratedUnit;

const CARD_KEYS: &[&str] = &["cards", "flashcards", "karten", "anki_cards", "data", "items"];
const TOPIC_KEYS: &[&str] = &["topics", "themen", "temas", "sujets", "argomenti", "items"];

/// Topic names this short are noise ("AI" survives only inside longer names).
const MIN_TOPIC_NAME_CHARS: usize = 3;

/// Parse a card payload. With `topic_aware`, a non-blank `topic` field is kept.
pub fn parse_cards(raw: &str, topic_aware: bool) -> Vec<GeneratedUnit> {
    let Some(items) = payload(raw).and_then(|v| item_list(v, CARD_KEYS)) else {
        debug!(len = raw.len(), "No card list in LLM payload");
        return Vec::new();
    };
    items
        .iter()
        .filter_map(Value::as_object)
        .filter_map(|card| card_from(card, topic_aware))
        .collect()
}

pub fn parse_topics(raw: &str) -> Vec<Topic> {
    let Some(items) = payload(raw).and_then(|v| item_list(v, TOPIC_KEYS)) else {
        debug!(len = raw.len(), "No topic list in LLM payload");
        return Vec::new();
    };
    items
        .iter()
        .filter_map(Value::as_object)
        .filter_map(topic_from)
        .collect()
}

// ── Payload extraction ──────────────────────────────────────────────

/// Strip code fences and decode; fall back to the outermost `{...}` span.
fn payload(raw: &str) -> Option<Value> {
    let stripped = strip_fences(raw);
    if let Ok(value) = serde_json::from_str(&stripped) {
        return Some(value);
    }
    let start = stripped.find('{')?;
    let end = stripped.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&stripped[start..=end]).ok()
}

fn strip_fences(raw: &str) -> String {
    raw.replace("```json", "").replace("```", "").trim().to_string()
}

/// A known key holding a list, else the first list value, else a bare list.
fn item_list(value: Value, keys: &[&str]) -> Option<Vec<Value>> {
    match value {
        Value::Array(items) => Some(items),
        Value::Object(mut map) => {
            for key in keys {
                if let Some(Value::Array(items)) = map.remove(*key) {
                    return Some(items);
                }
            }
            map.into_iter().find_map(|(_, v)| match v {
                Value::Array(items) => Some(items),
                _ => None,
            })
        }
        _ => None,
    }
}

// ── Field coercion ──────────────────────────────────────────────────

/// Strings pass through trimmed; numbers and booleans are stringified.
fn text_field(map: &Map<String, Value>, key: &str) -> Option<String> {
    match map.get(key)? {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// First key present wins, even when its value is blank.
fn first_field(map: &Map<String, Value>, keys: &[&str]) -> String {
    keys.iter()
        .find(|k| map.contains_key(**k))
        .and_then(|k| text_field(map, k))
        .unwrap_or_default()
}

fn card_from(card: &Map<String, Value>, topic_aware: bool) -> Option<GeneratedUnit> {
    let explicit_cloze = card.get("type").and_then(Value::as_str) == Some("cloze");
    let topic = if topic_aware { text_field(card, "topic") } else { None };

    if explicit_cloze || (card.contains_key("text") && !card.contains_key("front")) {
        let text = text_field(card, "text")?;
        // Mask validity is checked by the quality filter.
        if text.is_empty() || !text.contains("{{c") {
            return None;
        }
        return Some(GeneratedUnit::cloze(text).with_topic(topic));
    }

    let front = text_field(card, "front")?;
    let back = text_field(card, "back")?;
    if front.is_empty() || back.is_empty() {
        return None;
    }
    Some(GeneratedUnit::basic(front, back).with_topic(topic))
}

fn topic_from(topic: &Map<String, Value>) -> Option<Topic> {
    let name = first_field(topic, &["name", "topic", "titel", "thema"]);
    if name.chars().count() < MIN_TOPIC_NAME_CHARS {
        return None;
    }
    let description = first_field(topic, &["description", "beschreibung", "summary"]);
    Some(Topic { name, description })
}
