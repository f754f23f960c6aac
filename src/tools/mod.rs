//! Tools the agent can call while answering.
//!
//! - [`calculator`](crate::tools::calculator) evaluates arithmetic expressions
//! - [`wikipedia`](crate::tools::wikipedia) summarises encyclopedia pages
//! - [`document_search`](crate::tools::document_search) searches the indexed documentation page
//! - [`registry`](crate::tools::registry) holds the tools offered to the model
//!
//! ```ignore
//! let mut registry = ToolRegistry::new();
//! registry.register(Arc::new(Calculator));
//! let result = registry.execute("Calculator", json!({"expression": "2 + 2 * 3"})).await?;
//! ```

/// Arithmetic expression evaluation.
pub mod calculator;
/// Retriever-backed search over the documentation page.
pub mod document_search;
/// Tool registration and dispatch.
pub mod registry;
/// Encyclopedia summaries via the MediaWiki API.
pub mod wikipedia;

pub use calculator::Calculator;
pub use document_search::DocumentSearchTool;
pub use registry::{Tool, ToolRegistry};
pub use wikipedia::WikipediaTool;
