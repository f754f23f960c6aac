//! # ragqa - RAG-powered multi-tool Q&A assistant
//!
//! A question-answering server built around a tool-calling LLM agent. Each
//! query is answered by an agent that may consult three tools:
//!
//! - an encyclopedia lookup (Wikipedia)
//! - a calculator
//! - a search over one indexed documentation page (LangSmith by default)
//!
//! The finished answer is then attributed to a single tool label, and for
//! documentation answers the supporting chunks are shown alongside it.
//!
//! ## Usage
//!
//! ragqa runs as the `ragqa-server` binary, or can be embedded as a library:
//!
//! ```rust,ignore
//! use ragqa::{Assistant, ConfigManager};
//! use std::sync::Arc;
//!
//! let config_manager = Arc::new(ConfigManager::new("ragqa.toml")?);
//! let assistant = Assistant::from_config(config_manager)?;
//! let outcome = assistant.ask("What is LangSmith?", None).await?;
//! println!("{} ({})", outcome.attribution.answer, outcome.attribution.label);
//! ```
//!
//! ## Modules
//!
//! - [`agents`] - per-query pipeline and tool attribution
//! - [`api`] - HTML form and JSON endpoints
//! - [`cli`] - command-line interface
//! - [`llm`] - OpenAI-compatible client and the tool-calling loop
//! - [`rag`] - page loading, chunking, embeddings and the vector index
//! - [`tools`] - the agent's tools and their registry
//! - [`types`] - request/response types and errors
//! - [`utils`] - TOML configuration

#![warn(rustdoc::missing_crate_level_docs)]

/// Per-query pipeline and tool attribution.
pub mod agents;
/// HTTP handlers and routes.
pub mod api;
/// Command-line interface.
pub mod cli;
/// LLM client and tool-calling coordination.
pub mod llm;
/// Retrieval over the documentation page.
pub mod rag;
/// Agent tools.
pub mod tools;
/// Shared types and errors.
pub mod types;
/// Configuration.
pub mod utils;

pub use agents::{AskOutcome, Assistant, ToolLabel, ToolRouter};
pub use tools::registry::ToolRegistry;
pub use types::{AppError, Result};
pub use utils::toml_config::{ConfigManager, RagqaConfig};

use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// TOML configuration, reloaded when the file changes under `serve`
    pub config_manager: Arc<ConfigManager>,
    /// The question-answering pipeline
    pub assistant: Arc<Assistant>,
}
