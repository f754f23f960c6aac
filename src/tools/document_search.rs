use async_trait::async_trait;
use serde_json::{json, Value};

use crate::rag::retriever::Retriever;
use crate::tools::registry::Tool;
use crate::types::{AppError, Result};
use crate::utils::toml_config::DocumentSearchConfig;

/// Exposes the document [`Retriever`] to the model as a tool.
pub struct DocumentSearchTool {
    retriever: Retriever,
    name: String,
    description: String,
}

impl DocumentSearchTool {
    pub fn new(retriever: Retriever, config: &DocumentSearchConfig) -> Self {
        Self {
            retriever,
            name: config.name.clone(),
            description: config.description.clone(),
        }
    }
}

#[async_trait]
impl Tool for DocumentSearchTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "query to look up in retriever"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, args: Value) -> Result<Value> {
        let query = args
            .get("query")
            .and_then(|v| v.as_str())
            .ok_or_else(|| AppError::InvalidInput("Missing 'query' parameter".to_string()))?;

        let documents = self.retriever.retrieve(query).await?;
        tracing::debug!(hits = documents.len(), "Document search");

        let joined = documents
            .iter()
            .map(|doc| doc.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        Ok(Value::String(joined))
    }
}
