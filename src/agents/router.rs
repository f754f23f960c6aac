//! Tool attribution for completed answers.
//!
//! After the agent has produced its answer, the router decides which single
//! tool the answer is reported under ("Tool Used") and whether the retrieved
//! supporting documents are shown alongside it. The decision looks only at the
//! query text; the agent's own tool choices are reported separately.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Substrings that mark a query as arithmetic under [`RoutingPolicy::Keyword`].
const CALCULATOR_MARKERS: &[&str] = &["calculate", "+", "-", "/", "="];

/// The tool an answer is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum ToolLabel {
    /// Encyclopedia lookup (Wikipedia)
    #[serde(rename = "Wikipedia")]
    EncyclopediaLookup,
    /// Arithmetic expression evaluation
    #[serde(rename = "Calculator")]
    Calculator,
    /// Search over the indexed documentation page
    #[serde(rename = "Langsmith_search")]
    DocumentSearch,
}

impl ToolLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolLabel::EncyclopediaLookup => "Wikipedia",
            ToolLabel::Calculator => "Calculator",
            ToolLabel::DocumentSearch => "Langsmith_search",
        }
    }
}

impl std::fmt::Display for ToolLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How queries that do not mention the document keyword are classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoutingPolicy {
    /// Arithmetic markers select the calculator, anything else the encyclopedia.
    #[default]
    Keyword,
    /// Every non-document query is attributed to the calculator. Matches the
    /// labels produced by earlier releases, where the arithmetic check was
    /// always true and the encyclopedia label could never be reached.
    Legacy,
}

/// The router's verdict for one query/answer pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attribution {
    /// The agent output, trimmed for display
    pub answer: String,
    pub label: ToolLabel,
}

impl Attribution {
    /// Retrieved documents are displayed exactly for document-search answers.
    pub fn show_documents(&self) -> bool {
        self.label == ToolLabel::DocumentSearch
    }
}

/// Decides which tool label an answer is reported under.
#[derive(Debug, Clone)]
pub struct ToolRouter {
    policy: RoutingPolicy,
    document_keyword: String,
}

impl Default for ToolRouter {
    fn default() -> Self {
        Self::new(RoutingPolicy::default(), "langsmith")
    }
}

impl ToolRouter {
    pub fn new(policy: RoutingPolicy, document_keyword: impl Into<String>) -> Self {
        Self {
            policy,
            document_keyword: document_keyword.into().trim().to_lowercase(),
        }
    }

    pub fn from_config(config: &crate::utils::toml_config::RouterConfig) -> Self {
        Self::new(config.policy, config.document_keyword.as_str())
    }

    /// Classify the query. Predicates are checked in order; the first match wins.
    pub fn classify(&self, query: &str) -> ToolLabel {
        let query = query.to_lowercase();

        if query.contains(&self.document_keyword) {
            return ToolLabel::DocumentSearch;
        }

        match self.policy {
            RoutingPolicy::Legacy => ToolLabel::Calculator,
            RoutingPolicy::Keyword => {
                if CALCULATOR_MARKERS.iter().any(|m| query.contains(m)) {
                    ToolLabel::Calculator
                } else {
                    ToolLabel::EncyclopediaLookup
                }
            }
        }
    }

    /// Attribute a completed agent response to a tool.
    pub fn route(&self, query: &str, response_output: &str) -> Attribution {
        let label = self.classify(query);
        tracing::debug!(label = %label, policy = ?self.policy, "Attributed answer");

        Attribution {
            answer: response_output.trim().to_string(),
            label,
        }
    }
}
