//! MZP RAG - Retrieval-Augmented Generation pipeline
//!
//! This crate implements the single-pass "stuff" pipeline:
//! - embed the question and retrieve the top-k passages
//! - concatenate them into the fixed prompt template
//! - send the prompt to the generation provider
//!
//! There is no reranking, deduplication or relevance threshold: the
//! top-k passages are used even when none of them are on topic.

use mzp_core::{AppConfig, Answer, LlmClient, Query, Result, RetrievalOutput, SearchBackend};
use mzp_vector::{create_embedding_client, EmbeddingClient, IndexRetriever, VectorIndex};
use std::sync::Arc;
use std::time::Instant;

pub mod llm;
pub mod policy;
pub mod prompt;

pub use llm::{create_llm_client, HuggingFaceClient, OllamaClient};
pub use policy::{apply_policy, finalize_answer};
pub use prompt::{build_context, PromptTemplate, ASSISTANT_PROMPT_TEMPLATE};

// ============================================================================
// Retrieval QA Pipeline
// ============================================================================

/// Combined retrieval and generation pipeline
pub struct RetrievalQa {
    /// Passage retriever
    retriever: Arc<dyn SearchBackend>,

    /// Generation provider
    llm_client: Arc<dyn LlmClient>,

    /// Prompt template
    prompt: PromptTemplate,

    /// Passages per prompt
    top_k: usize,
}

impl RetrievalQa {
    /// Create a new pipeline
    pub fn new(
        retriever: Arc<dyn SearchBackend>,
        llm_client: Arc<dyn LlmClient>,
        top_k: usize,
    ) -> Self {
        Self {
            retriever,
            llm_client,
            prompt: PromptTemplate::assistant(),
            top_k,
        }
    }

    /// Build the pipeline from configuration.
    ///
    /// Index problems are reported as `ChatbotError::IndexUnavailable` so the
    /// caller can tell them apart from provider setup failures.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let embedder: Arc<dyn EmbeddingClient> =
            Arc::from(create_embedding_client(&config.embedding, &config.llm)?);
        let index = Arc::new(VectorIndex::load(&config.retrieval.index_path)?);
        let retriever = IndexRetriever::new(embedder, index);

        let llm_client: Arc<dyn LlmClient> = Arc::from(create_llm_client(&config.llm)?);
        tracing::info!(model = llm_client.model(), "Generation provider ready");

        Ok(Self::new(
            Arc::new(retriever),
            llm_client,
            config.retrieval.top_k,
        ))
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Run retrieval and generation, returning the raw generated text
    pub async fn run(&self, query: &Query) -> Result<RetrievalOutput> {
        let start_time = Instant::now();
        tracing::info!("RAG query started");

        // 1. Retrieve
        let passages = self.retriever.search(&query.question, self.top_k).await?;
        tracing::debug!(
            backend = self.retriever.name(),
            "Retrieved {} passages",
            passages.len()
        );

        // 2. Assemble prompt
        let context = build_context(&passages);
        let prompt = self.prompt.render(&context, &query.question);

        // 3. Generate
        tracing::info!("Calling LLM with prompt length: {} chars", prompt.len());
        let answer = self.llm_client.generate(&prompt).await?;
        tracing::info!(
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "LLM response received: {} chars",
            answer.len()
        );

        Ok(RetrievalOutput {
            answer,
            source_documents: passages,
        })
    }

    /// Run the pipeline and apply trimming and the refusal policy
    pub async fn answer(&self, query: &Query) -> Result<Answer> {
        let output = self.run(query).await?;
        Ok(Answer::new(finalize_answer(&output.answer)))
    }
}

// ============================================================================
// Tests
// ============================================================================
