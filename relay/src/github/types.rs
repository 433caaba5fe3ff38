//! GitHub payload types.
//!
//! This module defines:
//! - the subset of the `issues` webhook event the relay reads
//! - the project card request body and the card returned by the API

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Action value that triggers card creation.
pub const OPENED_ACTION: &str = "opened";

/// Content type for cards that point at an issue.
pub const ISSUE_CONTENT_TYPE: &str = "Issue";

// =============================================================================
// Inbound Webhook Types
// =============================================================================

/// An `issues` webhook event.
///
/// Fields stay as raw JSON so that unrelated lifecycle events (and pings)
/// are acknowledged whatever their shape. Only an opened event's `issue` is
/// decoded strictly, through [`IssuesEvent::issue`].
#[derive(Debug, Clone, Default)]
pub struct IssuesEvent {
    action: Option<Value>,
    issue: Option<Value>,
    repository: Option<Value>,
}

impl IssuesEvent {
    /// Decode a webhook body. Fails only when the body is not JSON.
    pub fn from_slice(body: &[u8]) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_slice(body)?;
        Ok(Self::from_value(value))
    }

    /// Pick the event fields out of a JSON value. Non-objects carry none.
    pub fn from_value(value: Value) -> Self {
        let Value::Object(mut fields) = value else {
            return Self::default();
        };
        let mut take = |key: &str| fields.remove(key).filter(|v| !v.is_null());

        Self {
            action: take("action"),
            issue: take("issue"),
            repository: take("repository"),
        }
    }

    /// Whether this event asks for a new card.
    pub fn is_opened(&self) -> bool {
        self.action.as_ref().and_then(Value::as_str) == Some(OPENED_ACTION)
    }

    /// Action label for log and response text.
    pub fn action_label(&self) -> String {
        match &self.action {
            None => "undefined".to_string(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }

    /// The issue, if present. Errors when it is present but malformed.
    pub fn issue(&self) -> Result<Option<Issue>, serde_json::Error> {
        self.issue.as_ref().map(|v| Issue::deserialize(v)).transpose()
    }

    /// Repository `owner/name`, if the event carried one.
    pub fn repository_name(&self) -> &str {
        self.repository
            .as_ref()
            .and_then(|r| r.get("full_name"))
            .and_then(Value::as_str)
            .unwrap_or("unknown")
    }
}

/// Issue fields used to build a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Issue {
    /// Repository-scoped issue number (`#42`)
    pub number: u64,
    /// Global issue ID, used as the card's `content_id`
    pub id: u64,
}

// =============================================================================
// Project Card Types
// =============================================================================

/// Body for `POST /projects/columns/{column_id}/cards`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewProjectCard {
    pub content_type: &'static str,
    pub content_id: u64,
}

impl NewProjectCard {
    /// Card linking to the issue with the given global ID.
    pub fn for_issue(issue_id: u64) -> Self {
        Self {
            content_type: ISSUE_CONTENT_TYPE,
            content_id: issue_id,
        }
    }
}

/// Card returned by the API. Only logged, so every field is lenient.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectCard {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub url: Option<String>,
}
