//! Embedding client for generating vector representations
//!
//! Supports the Hugging Face Inference feature-extraction API and Ollama.

use async_trait::async_trait;
use mzp_core::{ChatbotError, EmbeddingConfig, EmbeddingProvider, LlmConfig, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

// ============================================================================
// Embedding Trait
// ============================================================================

/// Trait for embedding generation
#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    /// Generate embedding for a single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for multiple texts (batch)
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Get embedding dimension
    fn dimension(&self) -> usize;

    /// Model identifier recorded in the index file
    fn model(&self) -> &str;
}

fn http_client(timeout_secs: u64) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| ChatbotError::Config(format!("Failed to build HTTP client: {e}")))
}

// ============================================================================
// Hugging Face Embedding Client
// ============================================================================

/// Hugging Face Inference API feature-extraction client
pub struct HuggingFaceEmbedding {
    client: Client,
    api_token: String,
    base_url: String,
    model: String,
    dimension: usize,
}

#[derive(Debug, Serialize)]
struct FeatureExtractionRequest<'a> {
    inputs: &'a [String],
    options: RequestOptions,
}

#[derive(Debug, Serialize)]
struct RequestOptions {
    wait_for_model: bool,
}

/// Sentence-transformer models return one pooled vector per input;
/// plain encoders return one vector per token.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FeatureExtractionResponse {
    Pooled(Vec<Vec<f32>>),
    PerToken(Vec<Vec<Vec<f32>>>),
}

impl FeatureExtractionResponse {
    fn into_embeddings(self) -> Vec<Vec<f32>> {
        match self {
            Self::Pooled(vectors) => vectors,
            Self::PerToken(batches) => batches.into_iter().map(|t| mean_pool(&t)).collect(),
        }
    }
}

fn mean_pool(tokens: &[Vec<f32>]) -> Vec<f32> {
    let Some(first) = tokens.first() else {
        return Vec::new();
    };

    let mut pooled = vec![0.0f32; first.len()];
    for token in tokens {
        for (acc, value) in pooled.iter_mut().zip(token) {
            *acc += value;
        }
    }

    let count = tokens.len() as f32;
    pooled.iter_mut().for_each(|v| *v /= count);
    pooled
}

impl HuggingFaceEmbedding {
    /// Create a new Hugging Face embedding client
    pub fn new(api_token: impl Into<String>, model: impl Into<String>) -> Self {
        let model = model.into();
        // MiniLM family unless told otherwise
        let dimension = match model.as_str() {
            "sentence-transformers/all-mpnet-base-v2" => 768,
            _ => 384,
        };

        Self {
            client: Client::new(),
            api_token: api_token.into(),
            base_url: "https://api-inference.huggingface.co".to_string(),
            model,
            dimension,
        }
    }

    /// Create from config
    pub fn from_config(embedding: &EmbeddingConfig, llm: &LlmConfig) -> Result<Self> {
        let api_token = llm
            .hf_token
            .as_ref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ChatbotError::CredentialMissing("HF_TOKEN".to_string()))?;

        let mut client = Self::new(api_token.clone(), embedding.model.clone())
            .with_base_url(llm.hf_api_url.clone());
        client.client = http_client(llm.timeout_secs)?;
        Ok(client)
    }

    /// Set custom base URL (for dedicated inference endpoints)
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl EmbeddingClient for HuggingFaceEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let results = self.embed_batch(&[text.to_string()]).await?;
        results
            .into_iter()
            .next()
            .ok_or_else(|| ChatbotError::Embedding("No embedding returned".to_string()))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = FeatureExtractionRequest {
            inputs: texts,
            options: RequestOptions {
                wait_for_model: true,
            },
        };

        let response = self
            .client
            .post(format!(
                "{}/pipeline/feature-extraction/{}",
                self.base_url, self.model
            ))
            .bearer_auth(&self.api_token)
            .json(&request)
            .send()
            .await
            .map_err(|e| ChatbotError::Embedding(format!("Embedding request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(ChatbotError::Embedding(format!(
                "Hugging Face embedding error ({status}): {error_text}"
            )));
        }

        let result: FeatureExtractionResponse = response.json().await.map_err(|e| {
            ChatbotError::Embedding(format!("Failed to parse embedding response: {e}"))
        })?;

        let embeddings = result.into_embeddings();
        if embeddings.len() != texts.len() {
            return Err(ChatbotError::Embedding(format!(
                "Expected {} embeddings, got {}",
                texts.len(),
                embeddings.len()
            )));
        }

        Ok(embeddings)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model(&self) -> &str {
        &self.model
    }
}

// ============================================================================
// Ollama Embedding Client
// ============================================================================

/// Ollama embedding API client
pub struct OllamaEmbedding {
    client: Client,
    base_url: String,
    model: String,
    dimension: usize,
}

#[derive(Debug, Serialize)]
struct OllamaEmbeddingRequest {
    model: String,
    prompt: String,
}

#[derive(Debug, Deserialize)]
struct OllamaEmbeddingResponse {
    embedding: Vec<f32>,
}

impl OllamaEmbedding {
    /// Create a new Ollama embedding client
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        let model = model.into();
        let dimension = if model.starts_with("all-minilm") { 384 } else { 768 };

        Self {
            client: Client::new(),
            base_url: base_url.into(),
            model,
            dimension,
        }
    }

    /// Create from config
    pub fn from_config(embedding: &EmbeddingConfig, llm: &LlmConfig) -> Result<Self> {
        let mut client = Self::new(llm.ollama_url.clone(), embedding.model.clone());
        client.client = http_client(llm.timeout_secs)?;
        Ok(client)
    }
}

#[async_trait]
impl EmbeddingClient for OllamaEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let request = OllamaEmbeddingRequest {
            model: self.model.clone(),
            prompt: text.to_string(),
        };

        let response = self
            .client
            .post(format!("{}/api/embeddings", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                ChatbotError::Embedding(format!("Ollama embedding request failed: {e}"))
            })?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ChatbotError::Embedding(format!(
                "Ollama embedding error: {error_text}"
            )));
        }

        let result: OllamaEmbeddingResponse = response.json().await.map_err(|e| {
            ChatbotError::Embedding(format!("Failed to parse embedding response: {e}"))
        })?;

        Ok(result.embedding)
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        // No native batch endpoint
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model(&self) -> &str {
        &self.model
    }
}

// ============================================================================
// Factory function
// ============================================================================

/// Create an embedding client from config
pub fn create_embedding_client(
    embedding: &EmbeddingConfig,
    llm: &LlmConfig,
) -> Result<Box<dyn EmbeddingClient>> {
    match embedding.provider {
        EmbeddingProvider::HuggingFace => {
            Ok(Box::new(HuggingFaceEmbedding::from_config(embedding, llm)?))
        }
        EmbeddingProvider::Ollama => Ok(Box::new(OllamaEmbedding::from_config(embedding, llm)?)),
    }
}

// ============================================================================
// Tests
// ============================================================================
