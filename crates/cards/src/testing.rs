//! Fake LLM backend shared by the crate's tests.

use std::sync::Mutex;

use async_trait::async_trait;
use pdfdeck_llm::{Completion, LlmError, LlmProvider, Message};

type Reply = dyn Fn(&[Message]) -> Result<String, LlmError> + Send + Sync;

/// Answers every call through a closure over the request messages and
/// records what it was asked.
pub(crate) struct ScriptedProvider {
    reply: Box<Reply>,
    pub calls: Mutex<Vec<(Vec<Message>, Completion)>>,
}

impl ScriptedProvider {
    pub fn new(reply: impl Fn(&[Message]) -> Result<String, LlmError> + Send + Sync + 'static) -> Self {
        Self {
            reply: Box::new(reply),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn always(raw: &str) -> Self {
        let raw = raw.to_string();
        Self::new(move |_| Ok(raw.clone()))
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn user_messages(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter_map(|(messages, _)| messages.last().map(|m| m.content.clone()))
            .collect()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    async fn complete(&self, messages: Vec<Message>, settings: Completion) -> Result<String, LlmError> {
        let reply = (self.reply)(&messages);
        self.calls.lock().unwrap().push((messages, settings));
        reply
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
