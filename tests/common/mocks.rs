//! Mock LLM clients and factories shared across test files.

use parking_lot::Mutex;
use ragqa::llm::client::{LLMClient, LLMClientFactory, LLMResponse};
use ragqa::llm::coordinator::ConversationMessage;
use ragqa::types::{ApiCredential, AppError, Result, ToolCall, ToolDefinition};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Arc;

pub fn answer(content: &str) -> LLMResponse {
    LLMResponse {
        content: content.to_string(),
        tool_calls: vec![],
        finish_reason: "stop".to_string(),
        usage: None,
    }
}

pub fn tool_turn(id: &str, name: &str, arguments: Value) -> LLMResponse {
    LLMResponse {
        content: String::new(),
        tool_calls: vec![ToolCall {
            id: id.to_string(),
            name: name.to_string(),
            arguments,
        }],
        finish_reason: "tool_calls".to_string(),
        usage: None,
    }
}

/// Replays a fixed script of responses, then repeats the last one.
pub struct ScriptedLLMClient {
    script: Mutex<VecDeque<LLMResponse>>,
    last: LLMResponse,
    /// Every conversation the client was called with
    pub calls: Arc<Mutex<Vec<Vec<ConversationMessage>>>>,
}

impl ScriptedLLMClient {
    pub fn new(script: Vec<LLMResponse>) -> Self {
        let last = script.last().cloned().unwrap_or_else(|| answer(""));
        Self {
            script: Mutex::new(script.into()),
            last,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

#[async_trait]
impl LLMClient for ScriptedLLMClient {
    async fn generate_with_tools_and_history(
        &self,
        messages: &[ConversationMessage],
        _tools: &[ToolDefinition],
    ) -> Result<LLMResponse> {
        self.calls.lock().push(messages.to_vec());
        Ok(self
            .script
            .lock()
            .pop_front()
            .unwrap_or_else(|| self.last.clone()))
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

/// Hands every request a fresh [`ScriptedLLMClient`] over the same script and
/// records the credential it was created with.
#[derive(Clone)]
pub struct MockLLMFactory {
    script: Vec<LLMResponse>,
    fail_with: Option<String>,
    pub credentials: Arc<Mutex<Vec<String>>>,
}

impl MockLLMFactory {
    pub fn new(script: Vec<LLMResponse>) -> Self {
        Self {
            script,
            fail_with: None,
            credentials: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A factory whose clients are rejected by the provider.
    pub fn rejecting(message: &str) -> Self {
        Self {
            fail_with: Some(message.to_string()),
            ..Self::new(vec![])
        }
    }
}

impl LLMClientFactory for MockLLMFactory {
    fn create(&self, credential: &ApiCredential) -> Result<Box<dyn LLMClient>> {
        self.credentials.lock().push(credential.expose().to_string());
        if let Some(message) = &self.fail_with {
            return Err(AppError::Auth(message.clone()));
        }
        Ok(Box::new(ScriptedLLMClient::new(self.script.clone())))
    }
}
