//! HTTP API for the token gateway:
//! - POST /token - mint an ephemeral vendor session (admission-gated)
//! - POST /end - release an admission slot
//! - GET /prompt - generate a conversation instruction
//! - GET /health - health check

mod handlers;
mod routes;
mod state;

pub use handlers::{EndResponse, ErrorResponse, PromptResponse};
pub use routes::create_router;
pub use state::AppState;
