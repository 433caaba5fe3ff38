//! GitHub API module.
//!
//! This module provides:
//! - Webhook event and project card types
//! - A REST client that creates project cards with bounded retry

pub mod client;
pub mod types;

pub use client::{CardError, GithubClient, RetryPolicy, ACCEPT, USER_AGENT};
pub use types::{Issue, IssuesEvent, NewProjectCard, ProjectCard};
