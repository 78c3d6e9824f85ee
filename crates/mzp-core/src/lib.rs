//! MZP Core - Domain models, traits, and shared types
//!
//! This crate defines the core abstractions used throughout the assistant:
//! - Query, passage and answer models
//! - Common error types
//! - Shared traits for the retrieval and generation collaborators
//! - Configuration management

pub mod config;

pub use config::{
    AppConfig, ConfigError, EmbeddingConfig, EmbeddingProvider, LlmConfig, LlmProvider,
    RetrievalConfig, ServerConfig,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Errors raised at the collaborator boundaries of the pipeline
#[derive(Error, Debug)]
pub enum ChatbotError {
    #[error("Missing credential: {0}")]
    CredentialMissing(String),

    #[error("Vector index unavailable: {0}")]
    IndexUnavailable(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<ConfigError> for ChatbotError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::MissingRequired(key) => ChatbotError::CredentialMissing(key),
            other => ChatbotError::Config(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, ChatbotError>;

// ============================================================================
// Query and Answer Models
// ============================================================================

/// Canned refusal the template instructs the model to use for off-topic questions
pub const REFUSAL_MESSAGE: &str = "I'm sorry, but I can only provide information related to Mizoram Police and legal matters. Please contact Mizoram Police for further assistance.";

/// Substring that marks a generated answer as a refusal
pub const REFUSAL_MARKER: &str = "I'm sorry";

/// A citizen's question
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Query {
    pub question: String,
}

impl Query {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
        }
    }
}

/// A passage returned by the vector index for one query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedPassage {
    /// Passage text
    pub content: String,

    /// Cosine similarity to the query (higher is better)
    pub score: f32,

    /// Originating file or document name
    pub source: Option<String>,

    /// Chunk position within the source
    pub chunk_index: u32,
}

impl RetrievedPassage {
    /// Create a passage with no source information
    pub fn new(content: impl Into<String>, score: f32) -> Self {
        Self {
            content: content.into(),
            score,
            source: None,
            chunk_index: 0,
        }
    }

    /// Set source name
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// Final answer returned to the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub answer: String,
}

impl Answer {
    pub fn new(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
        }
    }

    /// The canned refusal
    pub fn refusal() -> Self {
        Self::new(REFUSAL_MESSAGE)
    }

    pub fn is_refusal(&self) -> bool {
        self.answer == REFUSAL_MESSAGE
    }
}

/// Output of the retrieval + generation pipeline
#[derive(Debug, Clone)]
pub struct RetrievalOutput {
    /// Raw generated text, untrimmed
    pub answer: String,

    /// Passages that were stuffed into the prompt
    pub source_documents: Vec<RetrievedPassage>,
}

// ============================================================================
// Traits
// ============================================================================

/// Trait for retrieval backends
#[async_trait::async_trait]
pub trait SearchBackend: Send + Sync {
    /// Return the `limit` passages most similar to the query text
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<RetrievedPassage>>;

    /// Get backend name for logging
    fn name(&self) -> &str;
}

/// Trait for text-generation providers
#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    /// Generate a completion for the prompt
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Model identifier, for logging
    fn model(&self) -> &str;
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refusal_contains_marker() {
        assert!(REFUSAL_MESSAGE.contains(REFUSAL_MARKER));
        assert!(Answer::refusal().is_refusal());
        assert!(!Answer::new("Call 112 in an emergency.").is_refusal());
    }

    #[test]
    fn test_missing_credential_maps_to_typed_error() {
        let err: ChatbotError = ConfigError::MissingRequired("HF_TOKEN".to_string()).into();
        assert!(matches!(err, ChatbotError::CredentialMissing(ref key) if key == "HF_TOKEN"));
    }

    #[test]
    fn test_passage_builder() {
        let passage = RetrievedPassage::new("Section 41 CrPC", 0.8).with_source("crpc.txt");
        assert_eq!(passage.source.as_deref(), Some("crpc.txt"));
        assert_eq!(passage.chunk_index, 0);
    }
}
