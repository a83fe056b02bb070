//! Drop short, malformed, and near-duplicate units before export.
//!
//! One sequential pass in document order. A unit is compared against every
//! unit accepted so far, so earlier phrasings win.

use std::collections::HashSet;

use pdfdeck_core::config::{DEFAULT_DEDUP_THRESHOLD, DEFAULT_MIN_ANSWER_LENGTH};
use pdfdeck_core::PipelineConfig;
use serde::Serialize;

use crate::unit::{has_cloze_mask, reveal_cloze, GeneratedUnit};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualityConfig {
    /// Minimum answer length in characters after whitespace normalization.
    pub min_answer_length: usize,
    /// Similarity at or above which a later unit is a duplicate.
    pub dedup_threshold: f64,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            min_answer_length: DEFAULT_MIN_ANSWER_LENGTH,
            dedup_threshold: DEFAULT_DEDUP_THRESHOLD,
        }
    }
}

impl From<&PipelineConfig> for QualityConfig {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            min_answer_length: config.min_answer_length,
            dedup_threshold: config.dedup_threshold,
        }
    }
}

/// Why units were dropped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FilterReport {
    pub accepted: usize,
    pub too_short: usize,
    pub missing_cloze_mask: usize,
    pub duplicates: usize,
}

impl FilterReport {
    pub fn dropped(&self) -> usize {
        self.too_short + self.missing_cloze_mask + self.duplicates
    }
}

/// Return the accepted subset of `units`, order preserved.
pub fn filter_units(units: Vec<GeneratedUnit>, config: &QualityConfig) -> (Vec<GeneratedUnit>, FilterReport) {
    let mut report = FilterReport::default();
    let mut accepted = Vec::with_capacity(units.len());
    let mut seen: Vec<HashSet<String>> = Vec::new();

    for unit in units {
        if answer_length(&unit.answer) < config.min_answer_length {
            report.too_short += 1;
            continue;
        }
        if unit.is_cloze && !has_cloze_mask(&unit.prompt) {
            report.missing_cloze_mask += 1;
            continue;
        }

        let tokens = token_set(&unit);
        if seen.iter().any(|s| jaccard(&tokens, s) >= config.dedup_threshold) {
            report.duplicates += 1;
            continue;
        }

        seen.push(tokens);
        accepted.push(unit);
    }

    report.accepted = accepted.len();
    tracing::debug!(
        accepted = report.accepted,
        too_short = report.too_short,
        missing_cloze_mask = report.missing_cloze_mask,
        duplicates = report.duplicates,
        "Quality filter"
    );
    (accepted, report)
}

/// Characters in the answer once whitespace runs are collapsed and ends trimmed.
pub fn answer_length(answer: &str) -> usize {
    let words: Vec<&str> = answer.split_whitespace().collect();
    let chars: usize = words.iter().map(|w| w.chars().count()).sum();
    chars + words.len().saturating_sub(1)
}

/// Lowercase whitespace tokens of prompt and answer, cloze masks unwrapped.
pub fn token_set(unit: &GeneratedUnit) -> HashSet<String> {
    let prompt = if unit.is_cloze {
        reveal_cloze(&unit.prompt)
    } else {
        unit.prompt.clone()
    };
    prompt
        .split_whitespace()
        .chain(unit.answer.split_whitespace())
        .map(str::to_lowercase)
        .collect()
}

/// |A ∩ B| / |A ∪ B|; zero when either set is empty.
pub fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let shared = a.intersection(b).count();
    let union = a.len() + b.len() - shared;
    shared as f64 / union as f64
}

pub fn similarity(a: &GeneratedUnit, b: &GeneratedUnit) -> f64 {
    jaccard(&token_set(a), &token_set(b))
}
