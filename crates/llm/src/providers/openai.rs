use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use crate::provider::{to_api_messages, Completion, LlmError, LlmProvider, Message};

/// OpenAI-compatible chat completions backend.
pub struct OpenAiProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAiProvider {
    pub fn new(api_key: String, model: String, base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn request_body(&self, messages: &[Message], settings: Completion) -> serde_json::Value {
        let mut body = json!({
            "model": self.model,
            "messages": to_api_messages(messages),
            "temperature": settings.temperature,
            "max_tokens": settings.max_tokens,
        });
        if settings.json {
            body["response_format"] = json!({ "type": "json_object" });
        }
        body
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    async fn complete(&self, messages: Vec<Message>, settings: Completion) -> Result<String, LlmError> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = self.request_body(&messages, settings);

        debug!(model = %self.model, "OpenAI request to {}", url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
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
        let content = resp["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| LlmError::ParseError("missing choices[0].message.content".into()))?
            .trim()
            .to_string();

        Ok(content)
    }

    fn name(&self) -> &str {
        "openai"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_mode_sets_response_format() {
        let provider = OpenAiProvider::new("k".into(), "gpt-4o-mini".into(), "https://api.openai.com/".into());
        let body = provider.request_body(&[Message::user("hi")], Completion::default());
        assert_eq!(body["response_format"]["type"], "json_object");
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(provider.base_url, "https://api.openai.com");

        let plain = provider.request_body(
            &[Message::user("hi")],
            Completion {
                json: false,
                ..Completion::default()
            },
        );
        assert!(plain.get("response_format").is_none());
    }
}
