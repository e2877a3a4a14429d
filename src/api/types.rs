//! API request and response types

use serde::{Deserialize, Serialize};

/// Request to send a chat message
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// Session key
    pub user_id: String,
    pub message: String,
}

/// Response for chat action
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
}

/// Readiness of each subsystem, fixed at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    /// A language model is configured for the model-backed calls
    pub nlu_module: bool,
    /// The full moderation gate can run: beyond the keyword screen it needs
    /// a model for the moderation and contradiction checks
    pub guardrails: bool,
    /// The session store opened
    pub session_store: bool,
}

impl HealthReport {
    /// Derive every subsystem from the two things that can fail at startup
    pub fn from_readiness(nlu_ready: bool, store_ready: bool) -> Self {
        Self {
            nlu_module: nlu_ready,
            guardrails: nlu_ready,
            session_store: store_ready,
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.nlu_module && self.guardrails && self.session_store
    }
}

/// Response for the health check
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<HealthReport>,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
