//! Application state management

use mzp_core::{AppConfig, ChatbotError};
use mzp_rag::RetrievalQa;
use std::sync::Arc;
use std::time::Instant;

/// Application state shared across handlers.
///
/// Built once at startup and never mutated afterwards.
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,
    /// Server start time
    pub start_time: Instant,
    /// Retrieval QA pipeline; `None` when the vector index failed to load
    rag: Option<Arc<RetrievalQa>>,
}

impl AppState {
    /// Create state around an already constructed pipeline
    pub fn new(config: AppConfig, rag: Option<Arc<RetrievalQa>>) -> Self {
        Self {
            config,
            start_time: Instant::now(),
            rag,
        }
    }

    /// State for a service whose pipeline could not be built
    pub fn unavailable(config: AppConfig) -> Self {
        Self::new(config, None)
    }

    /// Wire the pipeline from configuration.
    ///
    /// A vector index that cannot be loaded degrades the service to
    /// "unavailable"; every other construction error is returned.
    pub fn initialize(config: AppConfig) -> Result<Self, ChatbotError> {
        match RetrievalQa::from_config(&config) {
            Ok(rag) => {
                tracing::info!(top_k = rag.top_k(), "Retrieval QA pipeline initialized");
                Ok(Self::new(config, Some(Arc::new(rag))))
            }
            Err(ChatbotError::IndexUnavailable(reason)) => {
                tracing::error!(
                    path = %config.retrieval.index_path.display(),
                    "Error loading vector index: {reason}"
                );
                Ok(Self::unavailable(config))
            }
            Err(e) => Err(e),
        }
    }

    /// Get the pipeline if initialized
    pub fn rag(&self) -> Option<Arc<RetrievalQa>> {
        self.rag.clone()
    }

    /// Check if the pipeline is initialized
    pub fn has_rag(&self) -> bool {
        self.rag.is_some()
    }

    /// Get uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
