//! GitHub REST client for project card creation.
//!
//! The client holds one pooled `reqwest::Client` shared by every request
//! handler. Card creation is retried with a fixed delay on any failure.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{header, Client};
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

use super::types::{NewProjectCard, ProjectCard};
use crate::Config;

/// User agent sent on every API call.
pub const USER_AGENT: &str = concat!("autocard-relay/", env!("CARGO_PKG_VERSION"));

/// REST v3 media type plus the projects preview.
pub const ACCEPT: &str =
    "application/vnd.github.v3+json, application/vnd.github.inertia-preview+json";

/// Total attempts per card, including the first.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Pause between attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(1000);

/// Errors from card creation.
#[derive(Debug, Error)]
pub enum CardError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API responded {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid API base URL {0}")]
    BaseUrl(String),

    #[error("gave up after {attempts} attempts: {last}")]
    Exhausted {
        attempts: u32,
        #[source]
        last: Box<CardError>,
    },
}

/// Fixed-delay retry bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay: DEFAULT_RETRY_DELAY,
        }
    }
}

/// Authenticated GitHub API client.
#[derive(Clone)]
pub struct GithubClient {
    inner: Arc<GithubClientInner>,
    retry: RetryPolicy,
}

struct GithubClientInner {
    http: Client,
    base_url: Url,
    authorization: String,
}

impl GithubClient {
    /// Build a client from the relay configuration.
    pub fn new(config: &Config) -> Result<Self, CardError> {
        let base_url = config
            .api_base_url()
            .ok_or_else(|| CardError::BaseUrl(config.api_host.clone()))?;

        let http = Client::builder().user_agent(USER_AGENT).build()?;

        Ok(Self {
            inner: Arc::new(GithubClientInner {
                http,
                base_url,
                authorization: format!("token {}", config.token),
            }),
            retry: RetryPolicy::default(),
        })
    }

    /// Replace the retry policy. At least one attempt is always made.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = RetryPolicy {
            max_attempts: retry.max_attempts.max(1),
            delay: retry.delay,
        };
        self
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// URL of the card collection for a column.
    pub fn cards_url(&self, column_id: u64) -> Result<Url, CardError> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| CardError::BaseUrl(self.inner.base_url.to_string()))?
            .pop_if_empty()
            .extend(["projects", "columns", column_id.to_string().as_str(), "cards"]);
        Ok(url)
    }

    /// Add the issue with global ID `issue_id` to a project column.
    ///
    /// Every failure is retried until the policy's attempts run out. The
    /// returned error carries the attempt count and the last failure.
    pub async fn add_issue_to_column(
        &self,
        column_id: u64,
        issue_id: u64,
    ) -> Result<ProjectCard, CardError> {
        let url = self.cards_url(column_id)?;
        let body = NewProjectCard::for_issue(issue_id);
        let retry = self.retry;

        let mut attempt = 0;
        loop {
            attempt += 1;
            debug!(url = %url, attempt = attempt, content_id = issue_id, "card_request_sending");

            let last = match self.create_card(&url, &body).await {
                Ok(card) => {
                    info!(
                        column_id = column_id,
                        issue_id = issue_id,
                        card_id = ?card.id,
                        card_url = ?card.url,
                        attempt = attempt,
                        "card_created"
                    );
                    return Ok(card);
                }
                Err(e) => e,
            };

            if attempt >= retry.max_attempts {
                return Err(CardError::Exhausted {
                    attempts: attempt,
                    last: Box::new(last),
                });
            }

            warn!(
                column_id = column_id,
                issue_id = issue_id,
                attempt = attempt,
                max_attempts = retry.max_attempts,
                delay_ms = retry.delay.as_millis() as u64,
                error = %last,
                "card_request_retrying"
            );
            tokio::time::sleep(retry.delay).await;
        }
    }

    /// One card creation attempt.
    async fn create_card(&self, url: &Url, body: &NewProjectCard) -> Result<ProjectCard, CardError> {
        let resp = self
            .inner
            .http
            .post(url.clone())
            .header(header::AUTHORIZATION, &self.inner.authorization)
            .header(header::ACCEPT, ACCEPT)
            .json(body)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            return Err(CardError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        Ok(serde_json::from_str(&text).unwrap_or_else(|e| {
            warn!(error = %e, body_length = text.len(), "card_response_unparsed");
            ProjectCard::default()
        }))
    }
}
