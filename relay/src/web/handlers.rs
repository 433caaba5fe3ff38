//! Endpoint handlers.
//!
//! The webhook handler runs one request through:
//! 1. Signature verification over the raw body
//! 2. The `opened` action filter, then strict decoding of `issue`
//! 3. Card creation with retry
//!
//! Every response is plain text.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
};
use tracing::{debug, error, info, warn};

use crate::github::{CardError, GithubClient, IssuesEvent};
use crate::web::signature::{signature_from_headers, verify_signature, SignatureError};
use crate::Config;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub github: GithubClient,
}

impl AppState {
    /// Build state with a GitHub client derived from `config`.
    pub fn new(config: Config) -> Result<Self, CardError> {
        let github = GithubClient::new(&config)?;
        Ok(Self::with_client(config, github))
    }

    pub fn with_client(config: Config, github: GithubClient) -> Self {
        Self {
            config: Arc::new(config),
            github,
        }
    }
}

/// Plain text response.
pub type TextResponse = (StatusCode, String);

// =============================================================================
// Health Check
// =============================================================================

/// Health check endpoint.
pub async fn health() -> &'static str {
    "autocard\n"
}

// =============================================================================
// Autocard Webhook
// =============================================================================

/// Issue webhook endpoint, `POST /autocard-webhook/:column_id`.
pub async fn autocard_webhook(
    State(state): State<AppState>,
    Path(column): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> TextResponse {
    let signature = signature_from_headers(&headers);
    if state.config.debug {
        debug!(signature = ?signature, body_length = body.len(), "webhook_signature");
    }

    if let Err(e) = signature.and_then(|sig| verify_signature(&state.config.secret, &body, sig)) {
        warn!(column = %column, reason = %e, "webhook_signature_invalid");
        let message = match e {
            SignatureError::Mismatch => "Invalid signature.\n".to_string(),
            other => format!("Error validating signature: {}\n", other),
        };
        return (StatusCode::FORBIDDEN, message);
    }

    let event = match IssuesEvent::from_slice(&body) {
        Ok(event) => event,
        Err(e) => {
            warn!(column = %column, error = %e, "webhook_body_invalid");
            return (
                StatusCode::BAD_REQUEST,
                format!("Invalid JSON body: {}\n", e),
            );
        }
    };

    if !event.is_opened() {
        let action = event.action_label();
        info!(action = %action, "webhook_action_ignored");
        return (
            StatusCode::OK,
            format!("Nothing to do for action={}\n", action),
        );
    }

    let issue = match event.issue() {
        Ok(Some(issue)) => issue,
        Ok(None) => {
            info!(repository = event.repository_name(), "webhook_issue_missing");
            return (
                StatusCode::OK,
                "No \"issue\" parameter; nothing to do.\n".to_string(),
            );
        }
        Err(e) => {
            warn!(repository = event.repository_name(), error = %e, "webhook_issue_invalid");
            return (
                StatusCode::BAD_REQUEST,
                format!("Invalid \"issue\" parameter: {}\n", e),
            );
        }
    };

    let column_id: u64 = match column.trim().parse() {
        Ok(id) => id,
        Err(_) => {
            warn!(column = %column, "webhook_column_invalid");
            return (
                StatusCode::BAD_REQUEST,
                format!("Invalid column ID: {}\n", column),
            );
        }
    };

    if state.config.debug {
        debug!(column_id = column_id, body = %String::from_utf8_lossy(&body), "webhook_event");
    }

    info!(
        issue_number = issue.number,
        issue_id = issue.id,
        repository = event.repository_name(),
        column_id = column_id,
        "webhook_issue_opened"
    );

    match state.github.add_issue_to_column(column_id, issue.id).await {
        Ok(card) => {
            info!(
                issue_id = issue.id,
                column_id = column_id,
                "webhook_card_added"
            );
            let card = card
                .id
                .map(|id| format!(" as card {}", id))
                .unwrap_or_default();
            (
                StatusCode::OK,
                format!(
                    "OK. Added issue {} to column {}{}.\n",
                    issue.number, column_id, card
                ),
            )
        }
        Err(e) => {
            error!(
                issue_number = issue.number,
                issue_id = issue.id,
                column_id = column_id,
                error = %e,
                "webhook_card_failed"
            );
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!(
                    "Error sending issue {} to column {}\n",
                    issue.number, column_id
                ),
            )
        }
    }
}
