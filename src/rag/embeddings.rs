use async_openai::{Client, config::OpenAIConfig, types::CreateEmbeddingRequestArgs};
use async_trait::async_trait;

use crate::llm::openai::{build_client, map_openai_error};
use crate::types::{ApiCredential, AppError, Result};

/// Dense text embeddings for indexing and querying.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>>;

    fn model_name(&self) -> &str;
}

/// OpenAI-compatible `/embeddings` client
pub struct OpenAIEmbeddings {
    client: Client<OpenAIConfig>,
    model: String,
    batch_size: usize,
}

impl OpenAIEmbeddings {
    pub fn new(
        http: reqwest::Client,
        api_key: ApiCredential,
        api_base: impl Into<String>,
        model: impl Into<String>,
        batch_size: usize,
    ) -> Self {
        Self {
            client: build_client(http, &api_key, &api_base.into()),
            model: model.into(),
            batch_size: batch_size.max(1),
        }
    }

    async fn request(&self, input: &[String]) -> Result<Vec<Vec<f32>>> {
        let request = CreateEmbeddingRequestArgs::default()
            .model(self.model.as_str())
            .input(input.to_vec())
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build embeddings request: {}", e)))?;

        let mut response = self
            .client
            .embeddings()
            .create(request)
            .await
            .map_err(|e| map_openai_error("Embeddings API", e))?;

        if response.data.len() != input.len() {
            return Err(AppError::LLM(format!(
                "Embeddings API returned {} vectors for {} inputs",
                response.data.len(),
                input.len()
            )));
        }

        response.data.sort_by_key(|d| d.index);
        Ok(response.data.into_iter().map(|d| d.embedding).collect())
    }
}

#[async_trait]
impl Embedder for OpenAIEmbeddings {
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            vectors.extend(self.request(batch).await?);
        }
        Ok(vectors)
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        self.request(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::LLM("Embeddings API returned no vector".to_string()))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
