//! MZP Vector - Embeddings and vector retrieval
//!
//! Provides the embedding clients, the persisted flat vector index,
//! and the retriever that turns a question into the top-k passages.

use async_trait::async_trait;
use mzp_core::{Result, RetrievedPassage, SearchBackend};
use std::sync::Arc;

pub mod chunk;
pub mod embedding;
pub mod index;

pub use chunk::TextSplitter;
pub use embedding::{
    create_embedding_client, EmbeddingClient, HuggingFaceEmbedding, OllamaEmbedding,
};
pub use index::{IndexEntry, VectorIndex, INDEX_FORMAT_VERSION};

/// Embeds the question and searches the loaded index
pub struct IndexRetriever {
    embedder: Arc<dyn EmbeddingClient>,
    index: Arc<VectorIndex>,
}

impl IndexRetriever {
    pub fn new(embedder: Arc<dyn EmbeddingClient>, index: Arc<VectorIndex>) -> Self {
        if embedder.model() != index.model() {
            tracing::warn!(
                embedder = embedder.model(),
                index = index.model(),
                "Embedding model differs from the model the index was built with"
            );
        }
        Self { embedder, index }
    }
}

#[async_trait]
impl SearchBackend for IndexRetriever {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<RetrievedPassage>> {
        let query_vector = self.embedder.embed(query).await?;
        let results = self.index.search(&query_vector, limit)?;
        tracing::debug!("Vector search returned {} passages", results.len());
        Ok(results)
    }

    fn name(&self) -> &str {
        "vector_index"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mzp_core::ChatbotError;

    /// Maps known words onto fixed axes
    struct KeywordEmbedding;

    #[async_trait]
    impl EmbeddingClient for KeywordEmbedding {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            let text = text.to_lowercase();
            Ok(vec![
                if text.contains("arrest") { 1.0 } else { 0.0 },
                if text.contains("bail") { 1.0 } else { 0.0 },
            ])
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            let mut out = Vec::new();
            for text in texts {
                out.push(self.embed(text).await?);
            }
            Ok(out)
        }

        fn dimension(&self) -> usize {
            2
        }

        fn model(&self) -> &str {
            "keyword"
        }
    }

    struct FailingEmbedding;

    #[async_trait]
    impl EmbeddingClient for FailingEmbedding {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Err(ChatbotError::Embedding("offline".to_string()))
        }

        async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Err(ChatbotError::Embedding("offline".to_string()))
        }

        fn dimension(&self) -> usize {
            2
        }

        fn model(&self) -> &str {
            "keyword"
        }
    }

    fn index() -> Arc<VectorIndex> {
        let mut index = VectorIndex::new("keyword", 2);
        index
            .insert(IndexEntry::new("You must be told the grounds of arrest.", vec![1.0, 0.0]))
            .unwrap();
        index
            .insert(IndexEntry::new("Bail is a right for bailable offences.", vec![0.0, 1.0]))
            .unwrap();
        Arc::new(index)
    }

    #[tokio::test]
    async fn test_retriever_returns_most_similar_first() {
        let retriever = IndexRetriever::new(Arc::new(KeywordEmbedding), index());
        let results = retriever.search("What happens after arrest?", 1).await.unwrap();

        assert_eq!(results.len(), 1);
        assert!(results[0].content.contains("grounds of arrest"));
        assert_eq!(retriever.name(), "vector_index");
    }

    #[tokio::test]
    async fn test_retriever_propagates_embedding_error() {
        let retriever = IndexRetriever::new(Arc::new(FailingEmbedding), index());
        let err = retriever.search("bail", 5).await.unwrap_err();
        assert!(matches!(err, ChatbotError::Embedding(_)));
    }
}
