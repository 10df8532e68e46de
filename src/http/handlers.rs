use super::state::AppState;
use crate::prompt;
use crate::vendor::{TokenRequest, Upstream};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use tracing::{error, info};

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct EndResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct PromptResponse {
    pub instruction: String,
}

const OVERLOADED_MESSAGE: &str = "API is overloaded, please wait a bit";

/// Relay an upstream reply with its original status and body
fn relay(upstream: Upstream) -> Response {
    let status = StatusCode::from_u16(upstream.status).unwrap_or(StatusCode::BAD_GATEWAY);
    (status, Json(upstream.body)).into_response()
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /token
/// Mint an ephemeral vendor session, gated by the admission counter
pub async fn mint_token(State(state): State<AppState>, Json(req): Json<TokenRequest>) -> Response {
    if state.gate.is_full() {
        info!("Admission gate full; rejecting token request");
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(ErrorResponse {
                error: OVERLOADED_MESSAGE.to_string(),
            }),
        )
            .into_response();
    }

    match state.vendor.create_session(&req).await {
        Ok(upstream) => {
            if upstream.is_success() {
                // Count the slot only once the vendor accepted the session
                state.gate.register();
            } else {
                error!("Vendor rejected session create: status {}", upstream.status);
            }
            relay(upstream)
        }
        Err(e) => {
            error!("Vendor session create failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// POST /end
/// Release an admission slot. Always succeeds; over-release floors at zero.
pub async fn end_session(State(state): State<AppState>) -> impl IntoResponse {
    state.gate.release();
    (StatusCode::OK, Json(EndResponse { status: "ok" }))
}

/// GET /prompt
/// Generate one conversation instruction from a random topic
pub async fn generate_prompt(State(state): State<AppState>) -> Response {
    let topic = prompt::pick_topic();
    info!("Generating instruction for topic: {}", topic);

    match state
        .vendor
        .chat_completion(&prompt::chat_request(topic))
        .await
    {
        Ok(upstream) if upstream.is_success() => {
            let instruction = prompt::extract_instruction(&upstream.body);
            (StatusCode::OK, Json(PromptResponse { instruction })).into_response()
        }
        Ok(upstream) => {
            error!("Vendor rejected completion: status {}", upstream.status);
            relay(upstream)
        }
        Err(e) => {
            error!("Prompt generation failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
