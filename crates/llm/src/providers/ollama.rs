use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use crate::provider::{to_api_messages, Completion, LlmError, LlmProvider, Message};

pub struct OllamaProvider {
    client: reqwest::Client,
    url: String,
    model: String,
}

impl OllamaProvider {
    pub fn new(url: String, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.trim_end_matches('/').to_string(),
            model,
        }
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    async fn complete(&self, messages: Vec<Message>, settings: Completion) -> Result<String, LlmError> {
        let url = format!("{}/api/chat", self.url);

        let mut body = json!({
            "model": self.model,
            "messages": to_api_messages(&messages),
            "stream": false,
            "options": {
                "temperature": settings.temperature,
                "num_predict": settings.max_tokens,
            },
        });
        if settings.json {
            body["format"] = json!("json");
        }

        debug!(model = %self.model, "Ollama request to {}", url);

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status().as_u16();
        if status != 200 {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::ApiError { status, body });
        }

        let resp: serde_json::Value = response.json().await?;
        let content = resp["message"]["content"]
            .as_str()
            .ok_or_else(|| LlmError::ParseError("missing message.content".into()))?
            .trim()
            .to_string();

        Ok(content)
    }

    fn name(&self) -> &str {
        "ollama"
    }
}
