use std::env;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::options::{AnswerFormat, CardType, Language};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled key through `lookup`: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_opt(lookup: &dyn Fn(&str) -> Option<String>, profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = lookup(&prefixed).filter(|s| !s.is_empty()) {
            return Some(v);
        }
    }
    lookup(key).filter(|s| !s.is_empty())
}

fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    profiled_opt(&env_opt, profile, key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_u32(profile: &str, key: &str, default: u32) -> u32 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn parse_key<T: std::str::FromStr>(key: &str, value: String) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Parse {
        key: key.to_string(),
        value,
    })
}

fn parse_bool(key: &str, value: String) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Parse {
            key: key.to_string(),
            value,
        }),
    }
}

// ── Pipeline ──────────────────────────────────────────────────

/// Default word budget per chunk (roughly 4-5 pages of prose).
pub const DEFAULT_CHUNK_WORD_BUDGET: usize = 2000;
/// Default rasterization resolution for OCR.
pub const DEFAULT_OCR_DPI: u32 = 300;
/// Default Jaccard threshold at or above which a later card is a duplicate.
pub const DEFAULT_DEDUP_THRESHOLD: f64 = 0.72;
/// Default minimum answer length in characters.
pub const DEFAULT_MIN_ANSWER_LENGTH: usize = 10;
/// Default number of generation calls in flight at once.
pub const DEFAULT_GENERATION_CONCURRENCY: usize = 4;

const MIN_OCR_DPI: u32 = 72;
const MAX_OCR_DPI: u32 = 1200;

/// Settings for one PDF → deck job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub deck_name: String,
    pub card_type: CardType,
    pub answer_format: AnswerFormat,
    /// Output language of the generated cards.
    pub language: Language,
    pub chunk_word_budget: usize,
    pub ocr_dpi: u32,
    /// Tesseract language spec (`eng`, `deu+eng`, ...). `auto` derives it from `language`.
    pub ocr_language: String,
    pub dedup_threshold: f64,
    pub min_answer_length: usize,
    /// Extraction worker threads. `None` = one per available core.
    pub workers: Option<usize>,
    pub generation_concurrency: usize,
    /// Scan the document for its main topics and restrict generation to them.
    pub topic_scan: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            deck_name: "PDF Deck".to_string(),
            card_type: CardType::default(),
            answer_format: AnswerFormat::default(),
            language: Language::default(),
            chunk_word_budget: DEFAULT_CHUNK_WORD_BUDGET,
            ocr_dpi: DEFAULT_OCR_DPI,
            ocr_language: "eng".to_string(),
            dedup_threshold: DEFAULT_DEDUP_THRESHOLD,
            min_answer_length: DEFAULT_MIN_ANSWER_LENGTH,
            workers: None,
            generation_concurrency: DEFAULT_GENERATION_CONCURRENCY,
            topic_scan: false,
        }
    }
}

impl PipelineConfig {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `PDFDECK_PROFILE`. When set (e.g. `PROD`), every key
    /// is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let profile = env_or("PDFDECK_PROFILE", "").to_uppercase();
        Self::from_lookup(&profile, &env_opt)
    }

    /// Build config from an arbitrary key lookup. Unset keys keep their defaults;
    /// set keys that fail to parse are errors.
    pub fn from_lookup(
        profile: &str,
        lookup: &dyn Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let p = profile.to_uppercase();
        let get = |key: &str| profiled_opt(lookup, &p, key);

        let overrides = PipelineOverrides {
            deck_name: get("PDFDECK_DECK_NAME"),
            card_type: get("PDFDECK_CARD_TYPE").map(|v| v.parse::<CardType>()).transpose()?,
            answer_format: get("PDFDECK_ANSWER_FORMAT").map(|v| v.parse::<AnswerFormat>()).transpose()?,
            language: get("PDFDECK_LANGUAGE").map(|v| v.parse::<Language>()).transpose()?,
            chunk_word_budget: get("PDFDECK_CHUNK_WORD_BUDGET")
                .map(|v| parse_key("PDFDECK_CHUNK_WORD_BUDGET", v))
                .transpose()?,
            ocr_dpi: get("PDFDECK_OCR_DPI")
                .map(|v| parse_key("PDFDECK_OCR_DPI", v))
                .transpose()?,
            ocr_language: get("PDFDECK_OCR_LANGUAGE"),
            dedup_threshold: get("PDFDECK_DEDUP_THRESHOLD")
                .map(|v| parse_key("PDFDECK_DEDUP_THRESHOLD", v))
                .transpose()?,
            min_answer_length: get("PDFDECK_MIN_ANSWER_LENGTH")
                .map(|v| parse_key("PDFDECK_MIN_ANSWER_LENGTH", v))
                .transpose()?,
            workers: get("PDFDECK_WORKERS")
                .map(|v| parse_key("PDFDECK_WORKERS", v))
                .transpose()?,
            generation_concurrency: get("PDFDECK_GENERATION_CONCURRENCY")
                .map(|v| parse_key("PDFDECK_GENERATION_CONCURRENCY", v))
                .transpose()?,
            topic_scan: get("PDFDECK_TOPIC_SCAN")
                .map(|v| parse_bool("PDFDECK_TOPIC_SCAN", v))
                .transpose()?,
        };

        let mut config = Self::default();
        overrides.apply(&mut config);
        Ok(config)
    }

    /// Reject settings the pipeline cannot honor. Call before any extraction.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.deck_name.trim().is_empty() {
            return Err(ConfigError::invalid("deck_name", "must not be empty"));
        }
        if self.chunk_word_budget == 0 {
            return Err(ConfigError::invalid("chunk_word_budget", "must be at least 1"));
        }
        if !(MIN_OCR_DPI..=MAX_OCR_DPI).contains(&self.ocr_dpi) {
            return Err(ConfigError::invalid(
                "ocr_dpi",
                format!("{} is outside {MIN_OCR_DPI}..={MAX_OCR_DPI}", self.ocr_dpi),
            ));
        }
        let lang_ok = !self.ocr_language.is_empty()
            && self
                .ocr_language
                .chars()
                .all(|c| c.is_ascii_lowercase() || c == '_' || c == '+');
        if !lang_ok {
            return Err(ConfigError::invalid(
                "ocr_language",
                format!("'{}' is not a tesseract language spec", self.ocr_language),
            ));
        }
        if !self.dedup_threshold.is_finite()
            || self.dedup_threshold <= 0.0
            || self.dedup_threshold > 1.0
        {
            return Err(ConfigError::invalid(
                "dedup_threshold",
                format!("{} is outside (0, 1]", self.dedup_threshold),
            ));
        }
        if self.workers == Some(0) {
            return Err(ConfigError::invalid("workers", "must be at least 1"));
        }
        if self.generation_concurrency == 0 {
            return Err(ConfigError::invalid(
                "generation_concurrency",
                "must be at least 1",
            ));
        }
        Ok(())
    }

    /// Tesseract language spec with `auto` resolved against the card language.
    pub fn resolved_ocr_language(&self) -> String {
        if self.ocr_language != "auto" {
            return self.ocr_language.clone();
        }
        match self.language.tesseract_code() {
            "eng" => "eng".to_string(),
            code => format!("{code}+eng"),
        }
    }

    /// Extraction worker count, falling back to the number of available cores.
    pub fn resolved_workers(&self) -> usize {
        self.workers.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Pipeline config:");
        tracing::info!("  deck:        name={}, cards={}, answers={}", self.deck_name, self.card_type, self.answer_format);
        tracing::info!("  language:    {} ({})", self.language, self.language.code());
        tracing::info!("  chunking:    budget={} words", self.chunk_word_budget);
        tracing::info!("  ocr:         dpi={}, lang={}", self.ocr_dpi, self.resolved_ocr_language());
        tracing::info!("  quality:     dedup>={}, min_answer={}", self.dedup_threshold, self.min_answer_length);
        tracing::info!("  concurrency: workers={}, generation={}", self.resolved_workers(), self.generation_concurrency);
    }
}

/// Partial settings layered on top of a [`PipelineConfig`]: a TOML file, CLI
/// flags, or environment variables. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineOverrides {
    pub deck_name: Option<String>,
    pub card_type: Option<CardType>,
    pub answer_format: Option<AnswerFormat>,
    pub language: Option<Language>,
    pub chunk_word_budget: Option<usize>,
    pub ocr_dpi: Option<u32>,
    pub ocr_language: Option<String>,
    pub dedup_threshold: Option<f64>,
    pub min_answer_length: Option<usize>,
    pub workers: Option<usize>,
    pub generation_concurrency: Option<usize>,
    pub topic_scan: Option<bool>,
}

impl PipelineOverrides {
    pub fn apply(self, config: &mut PipelineConfig) {
        if let Some(v) = self.deck_name {
            config.deck_name = v;
        }
        if let Some(v) = self.card_type {
            config.card_type = v;
        }
        if let Some(v) = self.answer_format {
            config.answer_format = v;
        }
        if let Some(v) = self.language {
            config.language = v;
        }
        if let Some(v) = self.chunk_word_budget {
            config.chunk_word_budget = v;
        }
        if let Some(v) = self.ocr_dpi {
            config.ocr_dpi = v;
        }
        if let Some(v) = self.ocr_language {
            config.ocr_language = v;
        }
        if let Some(v) = self.dedup_threshold {
            config.dedup_threshold = v;
        }
        if let Some(v) = self.min_answer_length {
            config.min_answer_length = v;
        }
        if let Some(v) = self.workers {
            config.workers = Some(v);
        }
        if let Some(v) = self.generation_concurrency {
            config.generation_concurrency = v;
        }
        if let Some(v) = self.topic_scan {
            config.topic_scan = v;
        }
    }
}

// ── LLM (OpenAI / Ollama) ─────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// "openai", "ollama"
    pub provider: String,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub openai_base_url: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub ollama: OllamaConfig,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "openai".into(),
            openai_api_key: None,
            openai_model: "gpt-4o-mini".into(),
            openai_base_url: None,
            temperature: 0.25,
            max_tokens: 4096,
            ollama: OllamaConfig::default(),
        }
    }
}

impl LlmConfig {
    /// Build from env, honoring the `PDFDECK_PROFILE` prefix like [`PipelineConfig::from_env`].
    pub fn from_env() -> Self {
        let p = env_or("PDFDECK_PROFILE", "").to_uppercase();
        let p = p.as_str();
        Self {
            provider: profiled_env_or(p, "LLM_PROVIDER", "openai"),
            openai_api_key: profiled_env_opt(p, "OPENAI_API_KEY"),
            openai_model: profiled_env_or(p, "OPENAI_MODEL", "gpt-4o-mini"),
            openai_base_url: profiled_env_opt(p, "OPENAI_BASE_URL"),
            temperature: profiled_env_or(p, "LLM_TEMPERATURE", "0.25")
                .parse()
                .unwrap_or(0.25),
            max_tokens: profiled_env_u32(p, "LLM_MAX_TOKENS", 4096),
            ollama: OllamaConfig::from_env_profiled(p),
        }
    }

    pub fn is_configured(&self) -> bool {
        match self.provider.as_str() {
            "openai" => self.openai_api_key.is_some(),
            "ollama" => true,
            _ => false,
        }
    }

    /// Log provider selection without secrets.
    pub fn log_summary(&self) {
        let model = match self.provider.as_str() {
            "ollama" => self.ollama.model.as_str(),
            _ => self.openai_model.as_str(),
        };
        tracing::info!(
            "  llm:         provider={}, model={}, configured={}",
            self.provider,
            model,
            self.is_configured()
        );
    }
}

// ── Ollama (local models) ─────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    pub url: String,
    pub model: String,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:11434".into(),
            model: "llama3.2".into(),
        }
    }
}

impl OllamaConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            url: profiled_env_or(p, "OLLAMA_URL", "http://localhost:11434"),
            model: profiled_env_or(p, "OLLAMA_MODEL", "llama3.2"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_are_valid() {
        let config = PipelineConfig::default();
        assert_eq!(config.chunk_word_budget, 2000);
        assert_eq!(config.ocr_dpi, 300);
        assert!((config.dedup_threshold - 0.72).abs() < f64::EPSILON);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn lookup_overrides_defaults() {
        let lookup = lookup_from(&[
            ("PDFDECK_LANGUAGE", "Deutsch"),
            ("PDFDECK_CHUNK_WORD_BUDGET", "1500"),
            ("PDFDECK_TOPIC_SCAN", "yes"),
        ]);
        let config = PipelineConfig::from_lookup("", &lookup).unwrap();
        assert_eq!(config.language, Language::German);
        assert_eq!(config.chunk_word_budget, 1500);
        assert!(config.topic_scan);
        assert_eq!(config.ocr_dpi, 300);
    }

    #[test]
    fn profile_prefix_wins_over_plain_key() {
        let lookup = lookup_from(&[
            ("PDFDECK_OCR_DPI", "200"),
            ("PROD_PDFDECK_OCR_DPI", "400"),
        ]);
        assert_eq!(PipelineConfig::from_lookup("prod", &lookup).unwrap().ocr_dpi, 400);
        assert_eq!(PipelineConfig::from_lookup("", &lookup).unwrap().ocr_dpi, 200);
    }

    #[test]
    fn unparsable_value_is_an_error() {
        let lookup = lookup_from(&[("PDFDECK_OCR_DPI", "high")]);
        let err = PipelineConfig::from_lookup("", &lookup).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));

        let lookup = lookup_from(&[("PDFDECK_LANGUAGE", "Elvish")]);
        let err = PipelineConfig::from_lookup("", &lookup).unwrap_err();
        assert_eq!(err, ConfigError::UnsupportedLanguage("Elvish".into()));
    }

    #[test]
    fn validate_rejects_bad_thresholds() {
        for bad in [0.0, -0.5, 1.01, f64::NAN] {
            let config = PipelineConfig {
                dedup_threshold: bad,
                ..Default::default()
            };
            assert!(config.validate().is_err(), "threshold {bad} accepted");
        }
        let config = PipelineConfig {
            dedup_threshold: 1.0,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_budget_and_bad_dpi() {
        let zero_budget = PipelineConfig {
            chunk_word_budget: 0,
            ..Default::default()
        };
        assert!(zero_budget.validate().is_err());

        let low_dpi = PipelineConfig {
            ocr_dpi: 10,
            ..Default::default()
        };
        assert!(low_dpi.validate().is_err());

        let bad_lang = PipelineConfig {
            ocr_language: "../eng".into(),
            ..Default::default()
        };
        assert!(bad_lang.validate().is_err());
    }

    #[test]
    fn auto_ocr_language_follows_card_language() {
        let config = PipelineConfig {
            ocr_language: "auto".into(),
            language: Language::French,
            ..Default::default()
        };
        assert_eq!(config.resolved_ocr_language(), "fra+eng");

        let english = PipelineConfig {
            ocr_language: "auto".into(),
            ..Default::default()
        };
        assert_eq!(english.resolved_ocr_language(), "eng");
    }

    #[test]
    fn overrides_from_toml_layer_onto_config() {
        let overrides: PipelineOverrides = toml::from_str(
            r#"
            deck_name = "Biology"
            card_type = "cloze"
            language = "es"
            dedup_threshold = 0.8
            "#,
        )
        .unwrap();
        let mut config = PipelineConfig::default();
        overrides.apply(&mut config);
        assert_eq!(config.deck_name, "Biology");
        assert_eq!(config.card_type, CardType::Cloze);
        assert_eq!(config.language, Language::Spanish);
        assert_eq!(config.chunk_word_budget, 2000);
    }

    #[test]
    fn overrides_reject_unknown_keys() {
        let parsed: Result<PipelineOverrides, _> = toml::from_str("chunk_size = 10");
        assert!(parsed.is_err());
    }
}
