//! Query handler

use crate::error::AppError;
use crate::state::AppState;
use axum::{extract::State, Json};
use mzp_core::Query;
use mzp_rag::finalize_answer;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

/// Query request body
#[derive(Debug, Deserialize, ToSchema)]
pub struct QueryRequest {
    /// Citizen's question
    #[schema(example = "What are my rights if arrested?")]
    pub question: String,
}

impl From<QueryRequest> for Query {
    fn from(req: QueryRequest) -> Self {
        Query::new(req.question)
    }
}

/// Query response body
#[derive(Debug, Serialize, ToSchema)]
pub struct QueryResponse {
    /// Generated answer or the canned refusal
    #[schema(example = "You must be informed of the grounds of your arrest...")]
    pub answer: String,
}

/// Ask the Mizoram Police AI assistant
#[utoipa::path(
    post,
    path = "/query",
    tag = "query",
    request_body = QueryRequest,
    responses(
        (status = 200, description = "Answer generated", body = QueryResponse),
        (status = 500, description = "Processing failed", body = crate::error::ApiError),
        (status = 503, description = "Pipeline not initialized", body = crate::error::ApiError)
    )
)]
pub async fn query_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, AppError> {
    let Some(rag) = state.rag() else {
        tracing::warn!("Query rejected: retrieval pipeline unavailable");
        return Err(AppError::ServiceUnavailable);
    };

    let output = rag.run(&req.into()).await?;

    tracing::debug!(
        sources = ?output
            .source_documents
            .iter()
            .map(|p| p.source.as_deref().unwrap_or("-"))
            .collect::<Vec<_>>(),
        "Answer grounded on {} passages",
        output.source_documents.len()
    );

    let answer = finalize_answer(&output.answer);
    Ok(Json(QueryResponse { answer }))
}
