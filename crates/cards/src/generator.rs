//! Card generation: one LLM call per chunk, parsed into [`GeneratedUnit`]s.

use std::ops::RangeInclusive;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tracing::{debug, info};

use pdfdeck_core::{AnswerFormat, CardType, Language, LlmConfig, PipelineConfig};
use pdfdeck_ingest::Chunk;
use pdfdeck_llm::{Completion, LlmProvider, Message};

use crate::error::GenerationError;
use crate::parse::parse_cards;
use crate::prompt::{card_system_prompt, card_user_message};
use crate::unit::GeneratedUnit;

/// Everything a generator needs to turn one chunk into cards.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub chunk_index: usize,
    pub text: String,
    pub first_page: usize,
    pub last_page: usize,
    pub target_language: Language,
    pub card_type: CardType,
    pub answer_format: AnswerFormat,
    /// When non-empty, only cards about these topics are requested.
    pub topics: Vec<String>,
}

impl GenerationRequest {
    pub fn for_chunk(chunk: &Chunk, config: &PipelineConfig, topics: &[String]) -> Self {
        Self {
            chunk_index: chunk.index,
            text: chunk.text.clone(),
            first_page: chunk.first_page,
            last_page: chunk.last_page,
            target_language: config.language,
            card_type: config.card_type,
            answer_format: config.answer_format,
            topics: topics.to_vec(),
        }
    }

    pub fn page_range(&self) -> RangeInclusive<usize> {
        self.first_page..=self.last_page
    }

    pub fn is_topic_restricted(&self) -> bool {
        !self.topics.is_empty()
    }
}

/// Turns one chunk into zero or more candidate cards.
#[async_trait]
pub trait CardGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<Vec<GeneratedUnit>, GenerationError>;
}

/// [`CardGenerator`] backed by any [`LlmProvider`].
pub struct LlmCardGenerator {
    provider: Arc<dyn LlmProvider>,
    completion: Completion,
}

impl LlmCardGenerator {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self {
            provider,
            completion: Completion::default(),
        }
    }

    /// Use the sampling settings from the LLM config.
    pub fn from_config(provider: Arc<dyn LlmProvider>, config: &LlmConfig) -> Self {
        Self {
            provider,
            completion: Completion {
                temperature: config.temperature,
                max_tokens: config.max_tokens,
                json: true,
            },
        }
    }
}

#[async_trait]
impl CardGenerator for LlmCardGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<Vec<GeneratedUnit>, GenerationError> {
        let start = Instant::now();
        let messages = vec![
            Message::system(card_system_prompt(
                request.card_type,
                request.answer_format,
                request.target_language,
            )),
            Message::user(card_user_message(request)),
        ];

        debug!(
            chunk = request.chunk_index,
            provider = self.provider.name(),
            topics = request.topics.len(),
            "Requesting cards"
        );
        let raw = self.provider.complete(messages, self.completion).await?;
        if raw.trim().is_empty() {
            return Err(GenerationError::Payload("empty completion".to_string()));
        }

        let units = parse_cards(&raw, request.is_topic_restricted());
        info!(
            chunk = request.chunk_index,
            first_page = request.first_page,
            last_page = request.last_page,
            units = units.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Chunk generated"
        );
        Ok(units)
    }
}
