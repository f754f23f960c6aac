//! Retrieval over a single documentation page.
//!
//! The pipeline is load, chunk, embed and index:
//!
//! - [`loader::WebPageLoader`] fetches the page and strips it to visible text
//! - [`chunker::TextChunker`] splits the text into overlapping windows
//! - [`embeddings::OpenAIEmbeddings`] embeds each chunk
//! - [`store::VectorIndex`] answers cosine similarity queries
//!
//! [`retriever::IndexBuilder`] runs the pipeline and [`retriever::Retriever`]
//! queries the result. [`store::IndexStore`] decides whether each request
//! rebuilds the index or reuses a cached one.

pub mod chunker;
pub mod embeddings;
pub mod loader;
pub mod retriever;
pub mod store;

pub use chunker::{Chunk, TextChunker};
pub use embeddings::{Embedder, OpenAIEmbeddings};
pub use loader::WebPageLoader;
pub use retriever::{IndexBuilder, Retriever};
pub use store::{IndexPolicy, IndexStore, VectorIndex};
