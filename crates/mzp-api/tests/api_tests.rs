//! API Integration Tests
//!
//! The router is driven in-process with stub retrieval and generation
//! collaborators, so no network access or index file is needed.

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use mzp_api::{
    create_router,
    error::{INTERNAL_DETAIL, UNAVAILABLE_DETAIL},
    state::AppState,
};
use mzp_core::{
    AppConfig, ChatbotError, LlmClient, Result, RetrievedPassage, SearchBackend, REFUSAL_MESSAGE,
};
use mzp_rag::RetrievalQa;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

// =============================================================================
// Test collaborators
// =============================================================================

struct FixedRetriever;

#[async_trait]
impl SearchBackend for FixedRetriever {
    async fn search(&self, _query: &str, limit: usize) -> Result<Vec<RetrievedPassage>> {
        let passages = vec![
            RetrievedPassage::new(
                "A person arrested must be informed of the grounds of arrest.",
                0.91,
            )
            .with_source("crpc_section_50.txt"),
            RetrievedPassage::new(
                "The arrested person has the right to meet an advocate during interrogation.",
                0.87,
            )
            .with_source("crpc_section_41d.txt"),
        ];
        Ok(passages.into_iter().take(limit).collect())
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

enum Reply {
    Text(&'static str),
    Fail,
}

struct ScriptedLlm(Reply);

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        match self.0 {
            Reply::Text(text) => Ok(text.to_string()),
            Reply::Fail => Err(ChatbotError::Provider(
                "connection reset by hf-inference-secret-host".to_string(),
            )),
        }
    }

    fn model(&self) -> &str {
        "scripted"
    }
}

fn app_with_reply(reply: Reply) -> Router {
    let qa = RetrievalQa::new(Arc::new(FixedRetriever), Arc::new(ScriptedLlm(reply)), 5);
    let state = AppState::new(AppConfig::default(), Some(Arc::new(qa)));
    create_router(Arc::new(state))
}

fn unavailable_app() -> Router {
    create_router(Arc::new(AppState::unavailable(AppConfig::default())))
}

/// Helper to create a test request
fn create_json_request(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json");

    match body {
        Some(json_body) => builder
            .body(Body::from(serde_json::to_string(&json_body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

fn query(question: &str) -> Request<Body> {
    create_json_request("POST", "/query", Some(json!({ "question": question })))
}

// =============================================================================
// Query API Tests
// =============================================================================

#[tokio::test]
async fn test_query_returns_generated_answer() {
    let app = app_with_reply(Reply::Text(
        "\n You must be told the grounds of your arrest and may meet an advocate. \n",
    ));

    let (status, json) = send(app, query("What are my rights if arrested?")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json,
        json!({ "answer": "You must be told the grounds of your arrest and may meet an advocate." })
    );
}

#[tokio::test]
async fn test_off_topic_question_returns_canned_refusal() {
    let app = app_with_reply(Reply::Text(
        "I'm sorry, I can't help with weather information.",
    ));

    let (status, json) = send(app, query("What's the weather today?")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["answer"], REFUSAL_MESSAGE);
}

#[tokio::test]
async fn test_empty_generation_returns_canned_refusal() {
    let app = app_with_reply(Reply::Text("   "));

    let (status, json) = send(app, query("What are my rights if arrested?")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["answer"], REFUSAL_MESSAGE);
}

#[tokio::test]
async fn test_provider_failure_is_opaque_500() {
    let app = app_with_reply(Reply::Fail);

    let (status, json) = send(app, query("How do I file an FIR?")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json, json!({ "detail": INTERNAL_DETAIL }));
    assert!(!json.to_string().contains("hf-inference-secret-host"));
}

#[tokio::test]
async fn test_uninitialized_pipeline_returns_503() {
    for question in ["What are my rights if arrested?", "", "What's the weather today?"] {
        let (status, json) = send(unavailable_app(), query(question)).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json["detail"], UNAVAILABLE_DETAIL);
    }
}

#[tokio::test]
async fn test_malformed_body_rejected() {
    let app = app_with_reply(Reply::Text("unused"));

    let (status, _) = send(
        app,
        create_json_request("POST", "/query", Some(json!({ "q": "missing field" }))),
    )
    .await;

    assert!(status.is_client_error());
}

// =============================================================================
// Health Check Tests
// =============================================================================

#[tokio::test]
async fn test_health_check() {
    let (status, json) = send(unavailable_app(), create_json_request("GET", "/health", None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn test_readiness_reflects_pipeline() {
    let (status, json) = send(
        app_with_reply(Reply::Text("ok")),
        create_json_request("GET", "/ready", None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["ready"], true);

    let (status, json) = send(unavailable_app(), create_json_request("GET", "/ready", None)).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["checks"]["pipeline_initialized"], false);
}

#[tokio::test]
async fn test_openapi_document_served() {
    let (status, json) = send(
        unavailable_app(),
        create_json_request("GET", "/api-docs/openapi.json", None),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(json["paths"]["/query"].is_object());
}
