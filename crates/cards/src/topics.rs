//! Topic scanning: sample every chunk, ask the model for the document's main
//! topics, and merge near-duplicate names across batches.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use pdfdeck_core::Language;
use pdfdeck_ingest::Chunk;
use pdfdeck_llm::{Completion, LlmProvider, Message};

use crate::parse::parse_topics;
use crate::prompt::{topic_system_prompt, topic_user_message};
use crate::quality::jaccard;

/// Leading words taken from each chunk.
pub const WORDS_PER_CHUNK_SAMPLE: usize = 350;
/// Upper bound on words sent in one scan call.
pub const MAX_WORDS_PER_BATCH: usize = 10_000;
/// Name similarity at or above which two topics are the same topic.
pub const TOPIC_DEDUP_THRESHOLD: f64 = 0.45;

const BATCH_SEPARATOR: &str = "\n\n---\n\n";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

pub struct TopicScanner {
    provider: Arc<dyn LlmProvider>,
    language: Language,
    completion: Completion,
}

impl TopicScanner {
    pub fn new(provider: Arc<dyn LlmProvider>, language: Language) -> Self {
        Self {
            provider,
            language,
            completion: Completion {
                temperature: 0.1,
                max_tokens: 1024,
                json: true,
            },
        }
    }

    /// Discover the document's main topics. A failed batch is logged and
    /// skipped, so the result may be empty.
    pub async fn scan(&self, chunks: &[Chunk]) -> Vec<Topic> {
        let batches = batch_samples(sample_chunks(chunks));
        let system = topic_system_prompt(self.language);
        let mut found = Vec::new();

        for (i, batch) in batches.iter().enumerate() {
            let messages = vec![Message::system(system.clone()), Message::user(topic_user_message(batch))];
            match self.provider.complete(messages, self.completion).await {
                Ok(raw) => found.extend(parse_topics(&raw)),
                Err(e) => warn!(batch = i, error = %e, "Topic scan batch failed"),
            }
        }

        let topics = dedup_topics(found);
        info!(
            batches = batches.len(),
            topics = topics.len(),
            provider = self.provider.name(),
            "Topic scan complete"
        );
        topics
    }
}

/// One labelled excerpt per chunk: `[p.3]` or `[pp.3–7]` then its leading words.
pub fn sample_chunks(chunks: &[Chunk]) -> Vec<String> {
    chunks
        .iter()
        .map(|chunk| {
            let label = if chunk.first_page == chunk.last_page {
                format!("p.{}", chunk.first_page + 1)
            } else {
                format!("pp.{}–{}", chunk.first_page + 1, chunk.last_page + 1)
            };
            let words: Vec<&str> = chunk.text.split_whitespace().take(WORDS_PER_CHUNK_SAMPLE).collect();
            format!("[{label}]\n{}", words.join(" "))
        })
        .collect()
}

/// Group samples greedily into batches of at most [`MAX_WORDS_PER_BATCH`]
/// words; a lone oversized sample still forms its own batch.
pub fn batch_samples(samples: Vec<String>) -> Vec<String> {
    let mut batches = Vec::new();
    let mut current: Vec<String> = Vec::new();
    let mut current_words = 0;

    for sample in samples {
        let words = sample.split_whitespace().count();
        if current_words + words > MAX_WORDS_PER_BATCH && !current.is_empty() {
            batches.push(current.join(BATCH_SEPARATOR));
            current.clear();
            current_words = 0;
        }
        current.push(sample);
        current_words += words;
    }
    if !current.is_empty() {
        batches.push(current.join(BATCH_SEPARATOR));
    }
    batches
}

/// Keep the first of any topics whose lowercase names overlap by
/// [`TOPIC_DEDUP_THRESHOLD`] or more.
pub fn dedup_topics(topics: Vec<Topic>) -> Vec<Topic> {
    let mut seen: Vec<HashSet<String>> = Vec::new();
    let mut unique = Vec::new();
    for topic in topics {
        let words: HashSet<String> = topic.name.to_lowercase().split_whitespace().map(str::to_string).collect();
        if seen.iter().any(|s| jaccard(&words, s) >= TOPIC_DEDUP_THRESHOLD) {
            continue;
        }
        seen.push(words);
        unique.push(topic);
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedProvider;
    use pdfdeck_llm::LlmError;

    fn chunk(index: usize, first_page: usize, last_page: usize, words: usize) -> Chunk {
        let text = (0..words).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ");
        Chunk {
            index,
            first_page,
            last_page,
            word_count: words,
            text,
        }
    }

    fn topic(name: &str) -> Topic {
        Topic {
            name: name.into(),
            description: String::new(),
        }
    }

    #[test]
    fn samples_are_labelled_and_truncated() {
        let samples = sample_chunks(&[chunk(0, 0, 0, 10), chunk(1, 1, 4, 500)]);
        assert!(samples[0].starts_with("[p.1]\nw0 w1"));
        assert!(samples[1].starts_with("[pp.2–5]\n"));
        assert_eq!(samples[1].split_whitespace().count(), WORDS_PER_CHUNK_SAMPLE + 1);
    }

    #[test]
    fn batches_respect_word_limit() {
        // 351 words per sample including the label; 28 fit in one batch.
        let chunks: Vec<Chunk> = (0..40).map(|i| chunk(i, i, i, 400)).collect();
        let batches = batch_samples(sample_chunks(&chunks));
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].matches(BATCH_SEPARATOR).count(), 27);
        assert!(batches.iter().all(|b| b.split_whitespace().count() <= MAX_WORDS_PER_BATCH + 40));
    }

    #[test]
    fn near_duplicate_topic_names_merge() {
        let topics = dedup_topics(vec![
            topic("Monetary Policy"),
            topic("monetary policy tools"),
            topic("Machine Learning"),
            topic("Cell Biology"),
        ]);
        let names: Vec<&str> = topics.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Monetary Policy", "Machine Learning", "Cell Biology"]);
    }

    #[tokio::test]
    async fn scan_merges_topics_across_batches_and_skips_failures() {
        let chunks: Vec<Chunk> = (0..60).map(|i| chunk(i, i, i, 400)).collect();
        let provider = Arc::new(ScriptedProvider::new(|messages| {
            let user = &messages[1].content;
            if user.contains("[p.1]") {
                Ok(r#"{"topics": [{"name": "Enzyme Kinetics", "description": "Rates"}]}"#.into())
            } else if user.contains("[p.29]") {
                Ok(r#"{"topics": [{"name": "enzyme kinetics"}, {"name": "Metabolism"}]}"#.into())
            } else {
                Err(LlmError::ParseError("boom".into()))
            }
        }));
        let scanner = TopicScanner::new(provider.clone(), Language::English);
        let topics = scanner.scan(&chunks).await;

        assert_eq!(provider.call_count(), 3);
        let names: Vec<&str> = topics.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Enzyme Kinetics", "Metabolism"]);

        let calls = provider.calls.lock().unwrap();
        assert_eq!(calls[0].1.max_tokens, 1024);
        assert!((calls[0].1.temperature - 0.1).abs() < f32::EPSILON);
    }
}
