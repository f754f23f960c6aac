//! OpenAI-compatible chat completions client.
//!
//! Built on `async-openai`. `llm.api_base` selects the endpoint, so any
//! compatible gateway can be targeted. Retries are switched off: a failed call
//! surfaces immediately with its [`AppError`] classification.

use crate::llm::client::{LLMClient, LLMClientFactory, LLMResponse, TokenUsage};
use crate::llm::coordinator::{ConversationMessage, MessageRole};
use crate::types::{ApiCredential, AppError, Result, ToolCall, ToolDefinition};
use crate::utils::toml_config::LlmConfig;
use async_openai::{
    Client,
    config::OpenAIConfig,
    error::{ApiError, OpenAIError},
    types::{
        ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessageArgs,
        ChatCompletionRequestAssistantMessageContent, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessage, ChatCompletionRequestToolMessageArgs,
        ChatCompletionRequestToolMessageContent, ChatCompletionRequestUserMessage,
        ChatCompletionTool, ChatCompletionToolChoiceOption, ChatCompletionToolType,
        CreateChatCompletionRequestArgs, FunctionCall, FunctionObject,
    },
};
use async_trait::async_trait;
use std::time::Duration;

pub struct OpenAIClient {
    client: Client<OpenAIConfig>,
    model: String,
    temperature: f32,
}

impl OpenAIClient {
    pub fn new(
        http: reqwest::Client,
        api_key: ApiCredential,
        api_base: impl Into<String>,
        model: impl Into<String>,
        temperature: f32,
    ) -> Self {
        Self {
            client: build_client(http, &api_key, &api_base.into()),
            model: model.into(),
            temperature,
        }
    }
}

#[async_trait]
impl LLMClient for OpenAIClient {
    async fn generate_with_tools_and_history(
        &self,
        messages: &[ConversationMessage],
        tools: &[ToolDefinition],
    ) -> Result<LLMResponse> {
        let messages = messages
            .iter()
            .map(to_request_message)
            .collect::<Result<Vec<_>>>()?;

        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(self.model.as_str())
            .temperature(self.temperature)
            .messages(messages);

        if !tools.is_empty() {
            let tools: Vec<ChatCompletionTool> = tools
                .iter()
                .map(|tool| ChatCompletionTool {
                    r#type: ChatCompletionToolType::Function,
                    function: FunctionObject {
                        name: tool.name.clone(),
                        description: Some(tool.description.clone()),
                        parameters: Some(tool.parameters.clone()),
                        strict: None,
                    },
                })
                .collect();
            args.tools(tools)
                .tool_choice(ChatCompletionToolChoiceOption::Auto);
        }

        let request = args.build().map_err(build_error)?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| map_openai_error("OpenAI API", e))?;

        let usage = response.usage.map(|u| TokenUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AppError::LLM("No response from OpenAI".to_string()))?;

        let finish_reason = choice
            .finish_reason
            .and_then(|reason| serde_json::to_value(reason).ok())
            .and_then(|value| value.as_str().map(str::to_string))
            .unwrap_or_else(|| "unknown".to_string());

        let tool_calls = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(parse_tool_call)
            .collect::<Result<Vec<_>>>()?;

        Ok(LLMResponse {
            content: choice.message.content.unwrap_or_default(),
            tool_calls,
            finish_reason,
            usage,
        })
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// A client for one credential and endpoint, sharing the given HTTP client.
pub(crate) fn build_client(
    http: reqwest::Client,
    api_key: &ApiCredential,
    api_base: &str,
) -> Client<OpenAIConfig> {
    let config = OpenAIConfig::new()
        .with_api_key(api_key.expose())
        .with_api_base(api_base.trim_end_matches('/'));

    let no_retry = backoff::ExponentialBackoffBuilder::new()
        .with_max_elapsed_time(Some(Duration::ZERO))
        .build();

    Client::with_config(config)
        .with_http_client(http)
        .with_backoff(no_retry)
}

/// Maps provider failures onto the error taxonomy.
pub(crate) fn map_openai_error(service: &str, err: OpenAIError) -> AppError {
    match err {
        OpenAIError::Reqwest(e) => {
            AppError::from_transport(&format!("{} request failed", service), e)
        }
        OpenAIError::ApiError(api) if is_rejected_key(&api) => {
            AppError::Auth(format!("{} rejected the API key: {}", service, api.message))
        }
        OpenAIError::ApiError(api) => AppError::LLM(format!("{} error: {}", service, api.message)),
        other => AppError::LLM(format!("{} error: {}", service, other)),
    }
}

fn is_rejected_key(err: &ApiError) -> bool {
    err.r#type.as_deref() == Some("authentication_error")
        || err.message.to_lowercase().contains("api key")
}

fn build_error(err: OpenAIError) -> AppError {
    AppError::Internal(format!("Failed to build OpenAI request: {}", err))
}

fn parse_tool_call(call: ChatCompletionMessageToolCall) -> Result<ToolCall> {
    let arguments = serde_json::from_str(&call.function.arguments).map_err(|e| {
        AppError::LLM(format!(
            "Model sent malformed arguments for tool '{}': {}",
            call.function.name, e
        ))
    })?;

    Ok(ToolCall {
        id: call.id,
        name: call.function.name,
        arguments,
    })
}

fn to_request_message(message: &ConversationMessage) -> Result<ChatCompletionRequestMessage> {
    let request = match message.role {
        MessageRole::System => ChatCompletionRequestMessage::System(
            ChatCompletionRequestSystemMessage::from(message.content.clone()),
        ),
        MessageRole::User => ChatCompletionRequestMessage::User(
            ChatCompletionRequestUserMessage::from(message.content.clone()),
        ),
        MessageRole::Assistant => {
            let mut args = ChatCompletionRequestAssistantMessageArgs::default();
            // Assistant turns that only request tools carry no content
            if !message.content.is_empty() || message.tool_calls.is_empty() {
                args.content(ChatCompletionRequestAssistantMessageContent::Text(
                    message.content.clone(),
                ));
            }
            if !message.tool_calls.is_empty() {
                let calls: Vec<ChatCompletionMessageToolCall> = message
                    .tool_calls
                    .iter()
                    .map(|call| ChatCompletionMessageToolCall {
                        id: call.id.clone(),
                        r#type: ChatCompletionToolType::Function,
                        function: FunctionCall {
                            name: call.name.clone(),
                            arguments: call.arguments.to_string(),
                        },
                    })
                    .collect();
                args.tool_calls(calls);
            }
            ChatCompletionRequestMessage::Assistant(args.build().map_err(build_error)?)
        }
        MessageRole::Tool => ChatCompletionRequestMessage::Tool(
            ChatCompletionRequestToolMessageArgs::default()
                .content(ChatCompletionRequestToolMessageContent::Text(
                    message.content.clone(),
                ))
                .tool_call_id(message.tool_call_id.clone().unwrap_or_default())
                .build()
                .map_err(build_error)?,
        ),
    };
    Ok(request)
}

/// Builds OpenAI clients for each request's credential
pub struct OpenAIClientFactory {
    http: reqwest::Client,
    config: LlmConfig,
}

impl OpenAIClientFactory {
    pub fn new(http: reqwest::Client, config: LlmConfig) -> Self {
        Self { http, config }
    }
}

impl LLMClientFactory for OpenAIClientFactory {
    fn create(&self, credential: &ApiCredential) -> Result<Box<dyn LLMClient>> {
        Ok(Box::new(OpenAIClient::new(
            self.http.clone(),
            credential.clone(),
            self.config.api_base.clone(),
            self.config.model.clone(),
            self.config.temperature,
        )))
    }
}
