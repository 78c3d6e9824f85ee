//! LLM Client implementations
//!
//! Provides the Hugging Face Inference text-generation client and
//! an Ollama client for local development.

use async_trait::async_trait;
use mzp_core::{ChatbotError, LlmClient, LlmConfig, LlmProvider, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

fn http_client(timeout_secs: u64) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| ChatbotError::Config(format!("Failed to build HTTP client: {e}")))
}

// ============================================================================
// Hugging Face Client
// ============================================================================

/// Hugging Face Inference API text-generation client
pub struct HuggingFaceClient {
    client: Client,
    api_token: String,
    base_url: String,
    model: String,
    max_new_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct TextGenerationRequest<'a> {
    inputs: &'a str,
    parameters: GenerationParameters,
    options: RequestOptions,
}

#[derive(Debug, Serialize)]
struct GenerationParameters {
    max_new_tokens: u32,
    temperature: f32,
    return_full_text: bool,
}

#[derive(Debug, Serialize)]
struct RequestOptions {
    wait_for_model: bool,
}

#[derive(Debug, Deserialize)]
struct GeneratedText {
    generated_text: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TextGenerationResponse {
    Batch(Vec<GeneratedText>),
    Single(GeneratedText),
    Error { error: String },
}

impl HuggingFaceClient {
    /// Create a new Hugging Face client
    pub fn new(
        api_token: impl Into<String>,
        model: impl Into<String>,
        max_new_tokens: u32,
        temperature: f32,
    ) -> Self {
        Self {
            client: Client::new(),
            api_token: api_token.into(),
            base_url: "https://api-inference.huggingface.co".to_string(),
            model: model.into(),
            max_new_tokens,
            temperature,
        }
    }

    /// Create from config
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let api_token = config
            .hf_token
            .as_ref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ChatbotError::CredentialMissing("HF_TOKEN".to_string()))?;

        let mut client = Self::new(
            api_token.clone(),
            config.model.clone(),
            config.max_tokens,
            config.temperature,
        )
        .with_base_url(config.hf_api_url.clone());
        client.client = http_client(config.timeout_secs)?;
        Ok(client)
    }

    /// Set custom base URL (for dedicated inference endpoints)
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl LlmClient for HuggingFaceClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let request = TextGenerationRequest {
            inputs: prompt,
            parameters: GenerationParameters {
                max_new_tokens: self.max_new_tokens,
                temperature: self.temperature,
                return_full_text: false,
            },
            options: RequestOptions {
                wait_for_model: true,
            },
        };

        let response = self
            .client
            .post(format!("{}/models/{}", self.base_url, self.model))
            .bearer_auth(&self.api_token)
            .json(&request)
            .send()
            .await
            .map_err(|e| ChatbotError::Provider(format!("Request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(ChatbotError::Provider(format!(
                "Hugging Face error ({status}): {error_text}"
            )));
        }

        let result: TextGenerationResponse = response
            .json()
            .await
            .map_err(|e| ChatbotError::Provider(format!("Failed to parse response: {e}")))?;

        extract_generated_text(result)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

fn extract_generated_text(response: TextGenerationResponse) -> Result<String> {
    match response {
        TextGenerationResponse::Batch(items) => items
            .into_iter()
            .next()
            .map(|g| g.generated_text)
            .ok_or_else(|| ChatbotError::Provider("No response generated".to_string())),
        TextGenerationResponse::Single(g) => Ok(g.generated_text),
        TextGenerationResponse::Error { error } => {
            Err(ChatbotError::Provider(format!("Hugging Face error: {error}")))
        }
    }
}

// ============================================================================
// Ollama Client
// ============================================================================

/// Ollama API client
pub struct OllamaClient {
    client: Client,
    base_url: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct OllamaResponse {
    response: String,
    done: bool,
}

impl OllamaClient {
    /// Create a new Ollama client
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        let defaults = LlmConfig::default();
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            model: model.into(),
            temperature: defaults.temperature,
            max_tokens: defaults.max_tokens,
        }
    }

    /// Create from config
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let mut client = Self::new(config.ollama_url.clone(), config.model.clone());
        client.client = http_client(config.timeout_secs)?;
        client.temperature = config.temperature;
        client.max_tokens = config.max_tokens;
        Ok(client)
    }
}

#[async_trait]
impl LlmClient for OllamaClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let request = OllamaRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            stream: false,
            options: OllamaOptions {
                temperature: self.temperature,
                num_predict: self.max_tokens,
            },
        };

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| ChatbotError::Provider(format!("Ollama request failed: {e}")))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ChatbotError::Provider(format!("Ollama error: {error_text}")));
        }

        let result: OllamaResponse = response.json().await.map_err(|e| {
            ChatbotError::Provider(format!("Failed to parse Ollama response: {e}"))
        })?;

        Ok(result.response)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

// ============================================================================
// Factory function
// ============================================================================

/// Create an LLM client from config
pub fn create_llm_client(config: &LlmConfig) -> Result<Box<dyn LlmClient>> {
    match config.provider {
        LlmProvider::HuggingFace => Ok(Box::new(HuggingFaceClient::from_config(config)?)),
        LlmProvider::Ollama => Ok(Box::new(OllamaClient::from_config(config)?)),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_huggingface_client_creation() {
        let client = HuggingFaceClient::new("hf_test", "mistralai/Mistral-7B-Instruct-v0.3", 512, 0.2);
        assert_eq!(client.model(), "mistralai/Mistral-7B-Instruct-v0.3");
        assert_eq!(client.max_new_tokens, 512);
    }

    #[test]
    fn test_ollama_client_creation() {
        let client = OllamaClient::new("http://localhost:11434", "mistral");
        assert_eq!(client.model(), "mistral");
    }

    #[test]
    fn test_factory_requires_token() {
        let err = create_llm_client(&LlmConfig::default()).err().unwrap();
        assert!(matches!(err, ChatbotError::CredentialMissing(_)));
    }

    #[test]
    fn test_request_serialization() {
        let request = TextGenerationRequest {
            inputs: "prompt",
            parameters: GenerationParameters {
                max_new_tokens: 512,
                temperature: 0.2,
                return_full_text: false,
            },
            options: RequestOptions {
                wait_for_model: true,
            },
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["inputs"], "prompt");
        assert_eq!(json["parameters"]["max_new_tokens"], 512);
        assert_eq!(json["parameters"]["return_full_text"], false);
    }

    #[test]
    fn test_parse_batch_response() {
        let parsed: TextGenerationResponse =
            serde_json::from_str(r#"[{"generated_text": " You have the right to remain silent."}]"#)
                .unwrap();
        assert_eq!(
            extract_generated_text(parsed).unwrap(),
            " You have the right to remain silent."
        );
    }

    #[test]
    fn test_parse_single_response() {
        let parsed: TextGenerationResponse =
            serde_json::from_str(r#"{"generated_text": "ok"}"#).unwrap();
        assert_eq!(extract_generated_text(parsed).unwrap(), "ok");
    }

    #[test]
    fn test_parse_error_and_empty_batch() {
        let parsed: TextGenerationResponse =
            serde_json::from_str(r#"{"error": "Model is overloaded"}"#).unwrap();
        assert!(matches!(
            extract_generated_text(parsed),
            Err(ChatbotError::Provider(_))
        ));

        let parsed: TextGenerationResponse = serde_json::from_str("[]").unwrap();
        assert!(extract_generated_text(parsed).is_err());
    }
}
