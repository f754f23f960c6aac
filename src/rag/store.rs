//! In-memory vector index and its lifecycle.
//!
//! The index holds every chunk of the source page with its embedding and
//! answers top-k cosine similarity queries by a linear scan, which is plenty
//! for a single documentation page.
//!
//! [`IndexStore`] decides whether a request gets a freshly built index or a
//! cached one, see [`IndexPolicy`].

use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::rag::chunker::Chunk;
use crate::types::{AppError, DocumentMetadata, Result, RetrievedDocument};

/// Cosine similarity of two vectors. Mismatched or zero vectors score 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

#[derive(Debug, Clone)]
struct IndexedChunk {
    id: String,
    content: String,
    metadata: DocumentMetadata,
    embedding: Vec<f32>,
}

#[derive(Debug, Clone, Default)]
pub struct VectorIndex {
    entries: Vec<IndexedChunk>,
}

impl VectorIndex {
    /// Pair chunks with their embeddings. Both must be the same length.
    pub fn from_parts(chunks: Vec<Chunk>, embeddings: Vec<Vec<f32>>) -> Result<Self> {
        if chunks.len() != embeddings.len() {
            return Err(AppError::Internal(format!(
                "{} chunks but {} embeddings",
                chunks.len(),
                embeddings.len()
            )));
        }

        let entries = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| IndexedChunk {
                id: Uuid::new_v4().to_string(),
                content: chunk.content,
                metadata: chunk.metadata,
                embedding,
            })
            .collect();

        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The `top_k` most similar chunks, best first.
    pub fn search(&self, query: &[f32], top_k: usize) -> Vec<RetrievedDocument> {
        let mut scored: Vec<(f32, &IndexedChunk)> = self
            .entries
            .iter()
            .map(|entry| (cosine_similarity(query, &entry.embedding), entry))
            .collect();

        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        scored.truncate(top_k);

        scored
            .into_iter()
            .map(|(score, entry)| RetrievedDocument {
                id: entry.id.clone(),
                content: entry.content.clone(),
                metadata: entry.metadata.clone(),
                score,
            })
            .collect()
    }
}

/// Whether the document index is rebuilt for every request or reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexPolicy {
    /// Fetch, chunk and embed the source page on every request.
    #[default]
    Rebuild,
    /// Keep built indices in an LRU cache keyed by source and embedding model.
    Cached,
}

/// Hands out indices according to the configured [`IndexPolicy`].
pub struct IndexStore {
    policy: IndexPolicy,
    cache: Mutex<LruCache<String, Arc<VectorIndex>>>,
}

impl IndexStore {
    pub fn new(policy: IndexPolicy, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            policy,
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn cached_len(&self) -> usize {
        self.cache.lock().len()
    }

    /// Return the index for `key`, running `build` when the policy or a cache
    /// miss requires it. Failed builds are never cached.
    pub async fn get_or_build<F, Fut>(&self, key: &str, build: F) -> Result<Arc<VectorIndex>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<VectorIndex>>,
    {
        if self.policy == IndexPolicy::Rebuild {
            return Ok(Arc::new(build().await?));
        }

        if let Some(index) = self.cache.lock().get(key).cloned() {
            tracing::debug!(key, "Document index cache hit");
            return Ok(index);
        }

        tracing::debug!(key, "Document index cache miss");
        let index = Arc::new(build().await?);
        self.cache.lock().put(key.to_string(), Arc::clone(&index));
        Ok(index)
    }

    pub fn clear(&self) {
        self.cache.lock().clear();
    }
}
