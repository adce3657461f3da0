//! Text-generation endpoints proxied to the upstream provider.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::conversations::ConversationRecord;
use crate::error::ApiError;
use crate::llm::DEFAULT_MODEL;
use crate::state::SharedState;

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub prompt: String,
    #[serde(default = "default_model")]
    pub model: String,
}

#[derive(Serialize)]
pub struct GenerateResponse {
    pub response: String,
}

#[derive(Debug, Deserialize)]
pub struct TextRequest {
    pub text: String,
    #[serde(default = "default_model")]
    pub model: String,
}

#[derive(Serialize)]
pub struct SummarizeResponse {
    pub summary: String,
}

#[derive(Debug, Deserialize)]
pub struct CodeRequest {
    pub code: String,
    #[serde(default = "default_model")]
    pub model: String,
}

#[derive(Serialize)]
pub struct CompletionResponse {
    pub completion: String,
}

/// POST /generate - generate text and record the exchange.
pub async fn generate_text(
    State(state): State<SharedState>,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, ApiError> {
    let response = state.llm.generate(&request.prompt, &request.model).await?;

    let record = ConversationRecord::new(&request.prompt, &response, &request.model);
    if let Err(e) = state.conversations.append(record).await {
        // The generation succeeded; losing the log entry is a server fault
        // worth surfacing loudly but not worth failing the request for.
        warn!("failed to persist conversation record: {}", e);
    }

    Ok(Json(GenerateResponse { response }))
}

/// POST /summarize - summarize a text.
pub async fn summarize_text(
    State(state): State<SharedState>,
    Json(request): Json<TextRequest>,
) -> Result<Json<SummarizeResponse>, ApiError> {
    let summary = state.llm.summarize(&request.text, &request.model).await?;
    Ok(Json(SummarizeResponse { summary }))
}

/// POST /code-complete - complete a code fragment.
pub async fn code_complete(
    State(state): State<SharedState>,
    Json(request): Json<CodeRequest>,
) -> Result<Json<CompletionResponse>, ApiError> {
    let completion = state.llm.code_complete(&request.code, &request.model).await?;
    Ok(Json(CompletionResponse { completion }))
}
