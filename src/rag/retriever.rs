use std::sync::Arc;

use crate::rag::chunker::TextChunker;
use crate::rag::embeddings::Embedder;
use crate::rag::loader::WebPageLoader;
use crate::rag::store::VectorIndex;
use crate::types::{Result, RetrievedDocument};

/// Loads the source page, splits it and embeds every chunk.
pub struct IndexBuilder {
    loader: WebPageLoader,
    chunker: TextChunker,
    source_url: String,
}

impl IndexBuilder {
    pub fn new(loader: WebPageLoader, chunker: TextChunker, source_url: impl Into<String>) -> Self {
        Self {
            loader,
            chunker,
            source_url: source_url.into(),
        }
    }

    #[tracing::instrument(skip(self, embedder), fields(source = %self.source_url))]
    pub async fn build(&self, embedder: &dyn Embedder) -> Result<VectorIndex> {
        let document = self.loader.load(&self.source_url).await?;
        let chunks = self.chunker.split_document(&document);

        if chunks.is_empty() {
            tracing::warn!("Source page produced no text; document index is empty");
            return Ok(VectorIndex::default());
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = embedder.embed_documents(&texts).await?;
        let index = VectorIndex::from_parts(chunks, embeddings)?;

        tracing::info!(chunks = index.len(), "Built document index");
        Ok(index)
    }
}

/// Top-k similarity search over a built index.
#[derive(Clone)]
pub struct Retriever {
    index: Arc<VectorIndex>,
    embedder: Arc<dyn Embedder>,
    top_k: usize,
}

impl Retriever {
    pub fn new(index: Arc<VectorIndex>, embedder: Arc<dyn Embedder>, top_k: usize) -> Self {
        Self {
            index,
            embedder,
            top_k,
        }
    }

    pub async fn retrieve(&self, query: &str) -> Result<Vec<RetrievedDocument>> {
        if self.index.is_empty() {
            return Ok(Vec::new());
        }
        let query_vector = self.embedder.embed_query(query).await?;
        Ok(self.index.search(&query_vector, self.top_k))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::chunker::Chunk;
    use crate::types::DocumentMetadata;
    use async_trait::async_trait;
    use chrono::Utc;

    /// Embeds text as letter counts of `a`, `b` and `c`.
    struct LetterEmbedder;

    #[async_trait]
    impl Embedder for LetterEmbedder {
        async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|t| letters(t)).collect())
        }

        async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
            Ok(letters(text))
        }

        fn model_name(&self) -> &str {
            "letters"
        }
    }

    fn letters(text: &str) -> Vec<f32> {
        ['a', 'b', 'c']
            .iter()
            .map(|l| text.chars().filter(|c| c == l).count() as f32)
            .collect()
    }

    fn chunk(content: &str, index: usize) -> Chunk {
        Chunk {
            content: content.to_string(),
            metadata: DocumentMetadata {
                source: "https://docs.example.com/".to_string(),
                title: String::new(),
                fetched_at: Utc::now(),
                chunk_index: index,
            },
        }
    }

    #[tokio::test]
    async fn test_retrieve_returns_closest_chunks() {
        let chunks = vec![chunk("aaaa", 0), chunk("bbbb", 1), chunk("cccc", 2)];
        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let vectors = LetterEmbedder.embed_documents(&texts).await.unwrap();
        let index = Arc::new(VectorIndex::from_parts(chunks, vectors).unwrap());

        let retriever = Retriever::new(index, Arc::new(LetterEmbedder), 1);
        let docs = retriever.retrieve("bb").await.unwrap();

        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].content, "bbbb");
    }

    #[tokio::test]
    async fn test_retrieve_from_empty_index() {
        let retriever = Retriever::new(Arc::new(VectorIndex::default()), Arc::new(LetterEmbedder), 4);
        assert!(retriever.retrieve("anything").await.unwrap().is_empty());
    }
}
