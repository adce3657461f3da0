//! Conversation history endpoint.

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use crate::conversations::ConversationRecord;
use crate::state::SharedState;

const DEFAULT_LIMIT: usize = 50;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub limit: Option<usize>,
}

/// GET /conversations - most recent stored exchanges, newest first.
pub async fn list_conversations(
    State(state): State<SharedState>,
    Query(params): Query<ListParams>,
) -> Json<Vec<ConversationRecord>> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT);
    Json(state.conversations.recent(limit).await)
}
