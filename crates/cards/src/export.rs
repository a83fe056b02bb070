//! JSON deck manifest: accepted cards grouped into decks with stable ids.

use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::error::ExportError;
use crate::unit::GeneratedUnit;

const MANIFEST_VERSION: u32 = 1;

/// Deterministic deck id: the first 8 bytes of SHA-256(name), big-endian,
/// with the sign bit cleared.
pub fn deck_id(name: &str) -> i64 {
    let digest = Sha256::digest(name.as_bytes());
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest[..8]);
    let id = (u64::from_be_bytes(head) & i64::MAX as u64) as i64;
    id.max(1)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeckSection {
    /// Full deck name; topic sub-decks use `parent::topic`.
    pub name: String,
    pub deck_id: i64,
    pub cards: Vec<GeneratedUnit>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeckManifest {
    pub version: u32,
    pub deck_name: String,
    pub deck_id: i64,
    /// RFC 3339 creation time.
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub card_count: usize,
    pub decks: Vec<DeckSection>,
    /// Cards whose topic matched none of the requested topics.
    #[serde(default)]
    pub unassigned: usize,
}

impl DeckManifest {
    /// One deck holding every unit.
    pub fn single(deck_name: &str, units: Vec<GeneratedUnit>) -> Self {
        let section = DeckSection {
            name: deck_name.to_string(),
            deck_id: deck_id(deck_name),
            cards: units,
        };
        Self::from_sections(deck_name, vec![section], 0)
    }

    /// One sub-deck per topic, in topic order. Units are matched to topics
    /// exactly, then case-insensitively; the rest are counted and omitted.
    /// Topics that received no cards get no sub-deck.
    pub fn by_topic(deck_name: &str, units: Vec<GeneratedUnit>, topics: &[String]) -> Self {
        let mut buckets: Vec<Vec<GeneratedUnit>> = vec![Vec::new(); topics.len()];
        let mut unassigned = 0;

        for unit in units {
            let label = unit.topic.as_deref().unwrap_or("").trim();
            let slot = if label.is_empty() {
                None
            } else {
                topics
                    .iter()
                    .position(|t| t == label)
                    .or_else(|| topics.iter().position(|t| t.to_lowercase() == label.to_lowercase()))
            };
            match slot {
                Some(i) => buckets[i].push(unit),
                None => unassigned += 1,
            }
        }

        for (topic, bucket) in topics.iter().zip(&buckets) {
            if bucket.is_empty() {
                warn!(topic = %topic, "No cards generated for topic");
            }
        }

        let sections = topics
            .iter()
            .zip(buckets)
            .filter(|(_, cards)| !cards.is_empty())
            .map(|(topic, cards)| {
                let name = format!("{deck_name}::{topic}");
                DeckSection {
                    deck_id: deck_id(&name),
                    name,
                    cards,
                }
            })
            .collect();
        Self::from_sections(deck_name, sections, unassigned)
    }

    fn from_sections(deck_name: &str, decks: Vec<DeckSection>, unassigned: usize) -> Self {
        Self {
            version: MANIFEST_VERSION,
            deck_name: deck_name.to_string(),
            deck_id: deck_id(deck_name),
            created_at: Utc::now().to_rfc3339(),
            source: None,
            card_count: decks.iter().map(|d| d.cards.len()).sum(),
            decks,
            unassigned,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// Writes manifests under a fixed path.
pub struct DeckExporter {
    path: PathBuf,
}

impl DeckExporter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write(&self, manifest: &DeckManifest) -> Result<(), ExportError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(manifest)?;
        std::fs::write(&self.path, json)?;
        info!(
            path = %self.path.display(),
            decks = manifest.decks.len(),
            cards = manifest.card_count,
            "Deck written"
        );
        Ok(())
    }

    pub fn load(&self) -> Result<DeckManifest, ExportError> {
        let json = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&json)?)
    }
}
