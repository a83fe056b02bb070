use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use pdfdeck_core::{LlmConfig, PipelineConfig, PipelineOverrides};

use crate::cli::CliArgs;

/// Optional TOML settings file.
///
/// ```toml
/// [pipeline]
/// deck_name = "Biology"
/// card_type = "both"
///
/// [llm]
/// provider = "ollama"
/// model = "llama3.2"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub pipeline: PipelineOverrides,
    pub llm: LlmOverrides,
}

/// LLM settings a file may override. API keys stay in the environment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LlmOverrides {
    pub provider: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub ollama_url: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl LlmOverrides {
    pub fn apply(self, config: &mut LlmConfig) {
        if let Some(v) = self.provider {
            config.provider = v;
        }
        if let Some(model) = self.model {
            match config.provider.as_str() {
                "ollama" => config.ollama.model = model,
                _ => config.openai_model = model,
            }
        }
        if let Some(v) = self.base_url {
            config.openai_base_url = Some(v);
        }
        if let Some(v) = self.ollama_url {
            config.ollama.url = v;
        }
        if let Some(v) = self.temperature {
            config.temperature = v;
        }
        if let Some(v) = self.max_tokens {
            config.max_tokens = v;
        }
    }
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        debug!(?path, "Loading config file");
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("failed to parse config: {}", path.display()))
    }
}

/// Layer defaults, environment, file, and flags, then validate.
pub fn resolve(args: &CliArgs) -> Result<(PipelineConfig, LlmConfig)> {
    let mut pipeline = PipelineConfig::from_env().context("invalid PDFDECK_* environment")?;
    let mut llm = LlmConfig::from_env();

    if let Some(path) = &args.config {
        let file = FileConfig::load(path)?;
        file.pipeline.apply(&mut pipeline);
        file.llm.apply(&mut llm);
    }

    args.pipeline_overrides().apply(&mut pipeline);
    LlmOverrides {
        provider: args.provider.clone(),
        model: args.model.clone(),
        ..Default::default()
    }
    .apply(&mut llm);

    pipeline.validate().context("invalid configuration")?;
    Ok((pipeline, llm))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use pdfdeck_core::CardType;

    #[test]
    fn file_config_parses_both_tables() {
        let file: FileConfig = toml::from_str(
            r#"
            [pipeline]
            deck_name = "Biology"
            card_type = "both"
            chunk_word_budget = 1500

            [llm]
            provider = "ollama"
            model = "mistral"
            "#,
        )
        .unwrap();
        assert_eq!(file.pipeline.deck_name.as_deref(), Some("Biology"));
        assert_eq!(file.pipeline.card_type, Some(CardType::Both));

        let mut llm = LlmConfig::default();
        file.llm.apply(&mut llm);
        assert_eq!(llm.provider, "ollama");
        assert_eq!(llm.ollama.model, "mistral");
        assert_eq!(llm.openai_model, "gpt-4o-mini");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(toml::from_str::<FileConfig>("[pipeline]\nchunk_size = 3").is_err());
        assert!(toml::from_str::<FileConfig>("[llm]\napi_key = \"sk\"").is_err());
    }

    #[test]
    fn flags_win_over_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pdfdeck.toml");
        std::fs::write(&path, "[pipeline]\ndeck_name = \"From File\"\nocr_dpi = 200\n").unwrap();

        let args = CliArgs::parse_from([
            "pdfdeck",
            "notes.pdf",
            "--config",
            path.to_str().unwrap(),
            "--deck-name",
            "From Flag",
        ]);
        let (pipeline, _) = resolve(&args).unwrap();
        assert_eq!(pipeline.deck_name, "From Flag");
        assert_eq!(pipeline.ocr_dpi, 200);
    }

    #[test]
    fn invalid_layered_config_fails() {
        let args = CliArgs::parse_from(["pdfdeck", "notes.pdf", "--chunk-word-budget", "0"]);
        assert!(resolve(&args).is_err());
    }
}
