//! MZP API Server
//!
//! REST API server for the Mizoram Police AI assistant.

use anyhow::Context;
use mzp_api::{create_router, state::AppState};
use mzp_core::config::{AppConfig, ConfigError, LoggingConfig};
use std::sync::Arc;

fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "mzp_api={level},mzp_rag={level},mzp_vector={level},tower_http=info",
            level = logging.level
        )
        .into()
    });

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if logging.json_format {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn check_config(config: &AppConfig) -> anyhow::Result<()> {
    match config.validate() {
        Ok(()) => Ok(()),
        Err(e @ ConfigError::MissingRequired(_)) => Err(e).context(
            "Missing Hugging Face API token. Please set HF_TOKEN in your environment variables.",
        ),
        Err(e) => Err(e).context("Invalid configuration"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before reading the environment
    dotenv::dotenv().ok();

    // Load configuration
    let config = AppConfig::from_env().context("Invalid configuration")?;

    // Initialize tracing
    init_tracing(&config.logging);

    check_config(&config)?;

    // Wire the pipeline; a missing index degrades instead of aborting
    let state = AppState::initialize(config).context("Failed to initialize the AI pipeline")?;
    if !state.has_rag() {
        tracing::warn!("Serving in degraded mode: every query will return 503");
    }

    let addr = state.config.server.bind_addr();
    let app = create_router(Arc::new(state));

    // Start server
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("MZP API Server starting on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", addr);
    tracing::info!("OpenAPI spec at http://{}/api-docs/openapi.json", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_token_message() {
        let err = check_config(&AppConfig::default()).unwrap_err();
        assert!(err.to_string().starts_with("Missing Hugging Face API token"));
    }

    #[test]
    fn test_other_validation_errors_keep_their_own_message() {
        let mut config = AppConfig::default();
        config.llm.hf_token = Some("hf_test".to_string());
        config.retrieval.top_k = 0;

        let err = check_config(&config).unwrap_err();
        assert_eq!(err.to_string(), "Invalid configuration");
        assert!(format!("{err:#}").contains("RETRIEVAL_TOP_K"));
        assert!(!format!("{err:#}").contains("HF_TOKEN"));
    }

    #[test]
    fn test_dotenv_values_reach_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "LLM_MAX_TOKENS=321\n").unwrap();

        dotenv::from_path(&path).unwrap();
        let config = AppConfig::from_env().unwrap();
        assert_eq!(config.llm.max_tokens, 321);
    }
}
