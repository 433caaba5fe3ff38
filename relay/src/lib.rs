//! Autocard - GitHub issue webhook to project card relay.
//!
//! The `autocard` binary receives `issues` webhooks, verifies their HMAC
//! signature, and adds each newly opened issue to the project column named
//! in the webhook URL.
//!
//! ## Request Flow
//!
//! ```text
//! POST /autocard-webhook/:column_id → signature → opened issue? → POST /projects/columns/:column_id/cards
//! ```

pub mod config;
pub mod github;
pub mod web;

// Re-export commonly used types
pub use config::{Config, ConfigError};
pub use github::{CardError, GithubClient, IssuesEvent, RetryPolicy};
pub use web::{router, AppState};
