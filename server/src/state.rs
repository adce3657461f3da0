//! Application state.
//!
//! Every dependency is constructed once at startup and owned here behind an
//! `Arc`; there is no process-wide mutable model or client. The predictor is
//! `None` when no usable checkpoint was found at startup, in which case
//! prediction requests fail fast while the rest of the service stays live.

use std::sync::Arc;
use std::time::Instant;

use visionpipe::backend::DefaultBackend;
use visionpipe::inference::Predictor;

use crate::conversations::ConversationLog;
use crate::llm::LlmClient;

/// Shared application state.
pub struct AppState {
    /// Loaded model, immutable for the lifetime of the process
    pub predictor: Option<Predictor<DefaultBackend>>,
    /// Text-generation proxy client
    pub llm: LlmClient,
    /// Persisted conversation log
    pub conversations: ConversationLog,
    /// Server start time
    pub started_at: Instant,
}

impl AppState {
    pub fn new(
        predictor: Option<Predictor<DefaultBackend>>,
        llm: LlmClient,
        conversations: ConversationLog,
    ) -> Self {
        Self {
            predictor,
            llm,
            conversations,
            started_at: Instant::now(),
        }
    }

    /// Uptime in seconds.
    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

pub type SharedState = Arc<AppState>;
