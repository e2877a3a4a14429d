//! HTTP request handlers

use super::types::{ChatRequest, ChatResponse, ErrorResponse, HealthResponse};
use super::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::trace::TraceLayer;

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(health_check))
        .route("/chat", post(chat))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ============================================================
// Health
// ============================================================

async fn health_check(State(state): State<AppState>) -> Response {
    if state.health.is_healthy() {
        Json(HealthResponse {
            status: "ok",
            detail: None,
        })
        .into_response()
    } else {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(HealthResponse {
                status: "unavailable",
                detail: Some(state.health),
            }),
        )
            .into_response()
    }
}

// ============================================================
// Chat
// ============================================================

async fn chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    if req.user_id.trim().is_empty() {
        return Err(AppError::BadRequest("user_id must not be empty".to_string()));
    }
    let user_id = req.user_id.as_str();

    let response = state
        .runtime
        .handle_turn(user_id, &req.message)
        .await
        .map_err(|e| {
            tracing::error!(session_id = %user_id, error = %e, "Chat turn failed");
            AppError::Internal
        })?;

    Ok(Json(ChatResponse { response }))
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
    /// Details are logged, never returned
    Internal,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal chatbot error".to_string(),
            ),
        };

        (status, Json(ErrorResponse::new(message))).into_response()
    }
}
