//! LLM Provider Clients and Abstractions
//!
//! This module provides the interface between the assistant and the hosted
//! language model.
//!
//! # Architecture
//!
//! - [`LLMClient`] - The core trait every provider client implements
//! - [`LLMClientFactory`] - Builds a client for a request's credential
//! - [`coordinator::ToolCoordinator`] - The multi-turn tool calling loop
//!
//! # Example
//!
//! ```ignore
//! use ragqa::llm::{LLMClientFactory, coordinator::ConversationMessage, openai::OpenAIClientFactory};
//!
//! let factory = OpenAIClientFactory::new(reqwest::Client::new(), config.llm.clone());
//! let client = factory.create(&credential)?;
//!
//! let messages = [ConversationMessage::user("What is 2+2?")];
//! let response = client.generate_with_tools_and_history(&messages, &[]).await?;
//! ```

/// Core LLM client trait and response types.
pub mod client;
/// Multi-turn tool calling coordinator.
pub mod coordinator;
/// OpenAI-compatible chat completions client.
pub mod openai;

pub use client::{LLMClient, LLMClientFactory, LLMResponse, TokenUsage};
pub use coordinator::{CoordinatorResult, FinishReason, ToolCallingConfig, ToolCoordinator};
pub use openai::{OpenAIClient, OpenAIClientFactory};
