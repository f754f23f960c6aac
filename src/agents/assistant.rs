//! The question-answering pipeline behind every endpoint.
//!
//! One call to [`Assistant::ask`] runs the whole chain for a single query:
//! resolve the credential, obtain the document index, assemble the tools, run
//! the tool-calling loop, attribute the answer and fetch the supporting
//! documents when the attribution asks for them.

use std::sync::Arc;
use std::time::{Duration, Instant};

use uuid::Uuid;

use crate::agents::router::{Attribution, ToolRouter};
use crate::llm::client::LLMClientFactory;
use crate::llm::coordinator::{FinishReason, ToolCallingConfig, ToolCoordinator};
use crate::llm::openai::OpenAIClientFactory;
use crate::rag::chunker::TextChunker;
use crate::rag::embeddings::{Embedder, OpenAIEmbeddings};
use crate::rag::loader::WebPageLoader;
use crate::rag::retriever::{IndexBuilder, Retriever};
use crate::rag::store::{IndexStore, VectorIndex};
use crate::tools::calculator::Calculator;
use crate::tools::document_search::DocumentSearchTool;
use crate::tools::registry::ToolRegistry;
use crate::tools::wikipedia::WikipediaTool;
use crate::types::{ApiCredential, AppError, AskResponse, Result, RetrievedDocument};
use crate::utils::toml_config::{ConfigManager, RagqaConfig};

/// Everything one answered query produced.
#[derive(Debug, Clone)]
pub struct AskOutcome {
    pub request_id: String,
    pub attribution: Attribution,
    /// Present only when the attribution shows documents
    pub documents: Option<Vec<RetrievedDocument>>,
    /// Tools the agent actually called, in call order
    pub tools_invoked: Vec<String>,
    pub iterations: usize,
    pub finish_reason: FinishReason,
    pub duration_ms: u64,
}

impl From<AskOutcome> for AskResponse {
    fn from(outcome: AskOutcome) -> Self {
        let show_documents = outcome.attribution.show_documents();
        AskResponse {
            request_id: outcome.request_id,
            answer: outcome.attribution.answer,
            tool_used: outcome.attribution.label,
            show_documents,
            documents: outcome.documents,
            tools_invoked: outcome.tools_invoked,
            iterations: outcome.iterations,
            finish_reason: outcome.finish_reason.to_string(),
            duration_ms: outcome.duration_ms,
        }
    }
}

pub struct Assistant {
    config_manager: Arc<ConfigManager>,
    llm_factory: Arc<dyn LLMClientFactory>,
    http: reqwest::Client,
    index_store: IndexStore,
}

impl Assistant {
    pub fn new(
        config_manager: Arc<ConfigManager>,
        llm_factory: Arc<dyn LLMClientFactory>,
        http: reqwest::Client,
    ) -> Self {
        let config = config_manager.config();
        let index_store = IndexStore::new(config.rag.index_policy, config.rag.cache_capacity);

        Self {
            config_manager,
            llm_factory,
            http,
            index_store,
        }
    }

    /// Wire the assistant to the OpenAI-compatible API named in the config.
    pub fn from_config(config_manager: Arc<ConfigManager>) -> Result<Self> {
        let config = config_manager.config();
        let http = build_http_client(config.llm.timeout_secs)?;
        let factory = OpenAIClientFactory::new(http.clone(), config.llm.clone());

        Ok(Self::new(config_manager, Arc::new(factory), http))
    }

    /// Answer one query.
    ///
    /// `credential` is the key supplied with the request; when absent the
    /// environment variable named by `llm.api_key_env` is used instead.
    #[tracing::instrument(skip_all, fields(request_id = tracing::field::Empty))]
    pub async fn ask(&self, query: &str, credential: Option<ApiCredential>) -> Result<AskOutcome> {
        let started = Instant::now();
        let request_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("request_id", request_id.as_str());

        if query.trim().is_empty() {
            return Err(AppError::InvalidInput("Query must not be empty".to_string()));
        }

        let config = self.config_manager.config();
        let credential = resolve_credential(credential, &config)?;

        let embedder: Arc<dyn Embedder> = Arc::new(OpenAIEmbeddings::new(
            self.http.clone(),
            credential.clone(),
            config.llm.api_base.as_str(),
            config.llm.embedding_model.as_str(),
            config.rag.embedding_batch_size,
        ));

        let index = self.document_index(&config, embedder.as_ref()).await?;
        let retriever = Retriever::new(index, Arc::clone(&embedder), config.rag.top_k);

        let registry = Arc::new(self.build_registry(&config, retriever.clone()));
        let client = self.llm_factory.create(&credential)?;
        let coordinator =
            ToolCoordinator::new(client, registry, ToolCallingConfig::from(&config.agent));

        let result = coordinator
            .execute(Some(config.agent.system_prompt.as_str()), query)
            .await?;

        let router = ToolRouter::from_config(&config.router);
        let attribution = router.route(query, &result.content);

        let documents = if attribution.show_documents() {
            Some(retriever.retrieve(query).await?)
        } else {
            None
        };

        let duration_ms = started.elapsed().as_millis() as u64;
        tracing::info!(
            tool_used = %attribution.label,
            iterations = result.iterations,
            finish_reason = %result.finish_reason,
            duration_ms,
            "Answered query"
        );

        Ok(AskOutcome {
            request_id,
            tools_invoked: result.tools_invoked(),
            attribution,
            documents,
            iterations: result.iterations,
            finish_reason: result.finish_reason,
            duration_ms,
        })
    }

    async fn document_index(
        &self,
        config: &RagqaConfig,
        embedder: &dyn Embedder,
    ) -> Result<Arc<VectorIndex>> {
        let chunker = TextChunker::new(config.rag.chunk_size, config.rag.chunk_overlap)?;
        let builder = IndexBuilder::new(
            WebPageLoader::new(self.http.clone()),
            chunker,
            config.rag.source_url.as_str(),
        );

        let key = format!("{}#{}", config.rag.source_url, embedder.model_name());
        self.index_store
            .get_or_build(&key, || builder.build(embedder))
            .await
    }

    fn build_registry(&self, config: &RagqaConfig, retriever: Retriever) -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(WikipediaTool::new(
            self.http.clone(),
            config.tools.wikipedia.clone(),
        )));
        registry.register(Arc::new(Calculator));
        registry.register(Arc::new(DocumentSearchTool::new(
            retriever,
            &config.tools.document_search,
        )));
        registry
    }
}

fn resolve_credential(
    credential: Option<ApiCredential>,
    config: &RagqaConfig,
) -> Result<ApiCredential> {
    credential
        .or_else(|| config.env_api_key().map(ApiCredential::new))
        .ok_or_else(|| {
            AppError::Auth(format!(
                "No API key supplied and {} is not set",
                config.llm.api_key_env
            ))
        })
}

/// Shared outbound HTTP client with the configured request timeout.
pub fn build_http_client(timeout_secs: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(concat!("ragqa-server/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))
}
