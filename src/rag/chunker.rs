use text_splitter::{ChunkConfig, Characters, TextSplitter};

use crate::types::{AppError, DocumentMetadata, Result, SourceDocument};

/// A chunk of a source page, ready to be embedded.
#[derive(Debug, Clone)]
pub struct Chunk {
    pub content: String,
    pub metadata: DocumentMetadata,
}

/// Splits text into overlapping windows of at most `chunk_size` characters,
/// preferring paragraph, line, sentence and word boundaries in that order.
pub struct TextChunker {
    splitter: TextSplitter<Characters>,
}

impl TextChunker {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        let config = ChunkConfig::new(chunk_size)
            .with_overlap(chunk_overlap)
            .map_err(|e| AppError::Config(format!("Invalid chunking parameters: {}", e)))?;

        Ok(Self {
            splitter: TextSplitter::new(config),
        })
    }

    pub fn chunk(&self, text: &str) -> Vec<String> {
        self.splitter.chunks(text).map(str::to_string).collect()
    }

    /// Split a document, stamping each chunk with its position.
    pub fn split_document(&self, document: &SourceDocument) -> Vec<Chunk> {
        self.chunk(&document.content)
            .into_iter()
            .enumerate()
            .map(|(chunk_index, content)| Chunk {
                content,
                metadata: DocumentMetadata {
                    chunk_index,
                    ..document.metadata.clone()
                },
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DocumentMetadata;
    use chrono::Utc;

    fn numbered_words(count: usize) -> String {
        (0..count)
            .map(|i| format!("w{:04}", i))
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn test_chunks_respect_size() {
        let chunker = TextChunker::new(1000, 200).unwrap();
        let text = numbered_words(600);

        let chunks = chunker.chunk(&text);

        assert!(chunks.len() >= 3);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 1000);
        }
    }

    #[test]
    fn test_consecutive_chunks_overlap() {
        let chunker = TextChunker::new(100, 30).unwrap();
        let text = numbered_words(100);

        let chunks = chunker.chunk(&text);

        assert!(chunks.len() > 1);
        for pair in chunks.windows(2) {
            let first_word = pair[1].split_whitespace().next().unwrap();
            assert!(
                pair[0].contains(first_word),
                "expected '{}' to start inside the previous chunk",
                first_word
            );
        }
    }

    #[test]
    fn test_every_word_is_indexed() {
        let chunker = TextChunker::new(100, 20).unwrap();
        let text = numbered_words(80);

        let chunks = chunker.chunk(&text);

        for word in text.split_whitespace() {
            assert!(chunks.iter().any(|c| c.contains(word)), "missing {}", word);
        }
    }

    #[test]
    fn test_short_text_is_single_chunk() {
        let chunker = TextChunker::new(1000, 200).unwrap();
        assert_eq!(chunker.chunk("LangSmith is a platform."), vec!["LangSmith is a platform."]);
        assert!(chunker.chunk("").is_empty());
    }

    #[test]
    fn test_overlap_must_be_smaller_than_size() {
        assert!(matches!(TextChunker::new(100, 100), Err(AppError::Config(_))));
    }

    #[test]
    fn test_split_document_numbers_chunks() {
        let chunker = TextChunker::new(100, 10).unwrap();
        let document = SourceDocument {
            content: numbered_words(60),
            metadata: DocumentMetadata {
                source: "https://docs.example.com/".to_string(),
                title: "Docs".to_string(),
                fetched_at: Utc::now(),
                chunk_index: 0,
            },
        };

        let chunks = chunker.split_document(&document);

        assert!(chunks.len() > 1);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.metadata.chunk_index, i);
            assert_eq!(chunk.metadata.source, "https://docs.example.com/");
        }
    }
}
