//! Web server module for the autocard relay.
//!
//! Two routes:
//! - `GET /` answers a plain text health check
//! - `POST /autocard-webhook/:column_id` verifies an issues webhook and adds
//!   the opened issue to that project column
//!
//! Anything else gets axum's default 404.

pub mod handlers;
pub mod signature;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

pub use handlers::{autocard_webhook, health, AppState, TextResponse};
pub use signature::{
    sign_payload, signature_from_headers, verify_signature, Algorithm, SignatureError,
    SIGNATURE_256_HEADER, SIGNATURE_HEADER,
};

/// Build the relay router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/autocard-webhook/:column_id", post(autocard_webhook))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
