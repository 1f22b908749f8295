//! External source client
//!
//! Fetches the full batch of posts over HTTP. 5xx responses are retried
//! under a bounded exponential backoff; everything else fails on the spot.

mod retry;

pub use retry::{BackoffPolicy, RetryError, retry_with_backoff};

use async_trait::async_trait;
use std::time::Duration;

use crate::data::Post;
use crate::error::{AppError, FetchError};

/// Something that can produce the current batch of posts
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PostSource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<Post>, FetchError>;
}

/// HTTP client for the external posts endpoint
pub struct HttpPostSource {
    client: reqwest::Client,
    url: String,
    policy: BackoffPolicy,
}

impl HttpPostSource {
    /// Create new source client
    ///
    /// # Arguments
    /// * `client` - Shared HTTP client
    /// * `url` - Endpoint returning a JSON array of posts
    /// * `policy` - Backoff applied to 5xx responses
    pub fn new(client: reqwest::Client, url: impl Into<String>, policy: BackoffPolicy) -> Self {
        Self {
            client,
            url: url.into(),
            policy,
        }
    }

    /// Build an HTTP client suited to the source endpoint
    pub fn build_client(request_timeout: Duration) -> Result<reqwest::Client, AppError> {
        reqwest::Client::builder()
            .user_agent(concat!("PostSync/", env!("CARGO_PKG_VERSION")))
            .timeout(request_timeout)
            .build()
            .map_err(|e| AppError::Internal(e.into()))
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// One request/response cycle, classified
    async fn fetch_once(&self) -> Result<Vec<Post>, FetchError> {
        use crate::metrics::FETCH_ATTEMPTS_TOTAL;

        let response = self.client.get(&self.url).send().await.map_err(|e| {
            FETCH_ATTEMPTS_TOTAL.with_label_values(&["transport"]).inc();
            FetchError::Transport(e)
        })?;

        let status = response.status();
        if status.is_client_error() {
            FETCH_ATTEMPTS_TOTAL.with_label_values(&["client_error"]).inc();
            return Err(FetchError::ClientStatus {
                status: status.as_u16(),
            });
        }
        if status.is_server_error() {
            FETCH_ATTEMPTS_TOTAL.with_label_values(&["server_error"]).inc();
            return Err(FetchError::ServerStatus {
                status: status.as_u16(),
            });
        }
        if !status.is_success() {
            FETCH_ATTEMPTS_TOTAL.with_label_values(&["unexpected_status"]).inc();
            return Err(FetchError::UnexpectedStatus {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|e| {
            FETCH_ATTEMPTS_TOTAL.with_label_values(&["body"]).inc();
            FetchError::Body(e)
        })?;

        let posts: Vec<Post> = serde_json::from_slice(&body).map_err(|e| {
            FETCH_ATTEMPTS_TOTAL.with_label_values(&["decode"]).inc();
            FetchError::Decode(e)
        })?;

        FETCH_ATTEMPTS_TOTAL.with_label_values(&["success"]).inc();
        Ok(posts)
    }
}

#[async_trait]
impl PostSource for HttpPostSource {
    async fn fetch(&self) -> Result<Vec<Post>, FetchError> {
        let result = retry_with_backoff(
            "fetch_posts",
            &self.policy,
            FetchError::is_transient,
            || self.fetch_once(),
        )
        .await;

        match result {
            Ok(posts) => {
                tracing::info!(url = %self.url, count = posts.len(), "Fetched posts from source");
                Ok(posts)
            }
            Err(RetryError::Permanent { error, .. }) => Err(error),
            Err(RetryError::Exhausted {
                last,
                attempts,
                elapsed,
            }) => Err(FetchError::Exhausted {
                attempts,
                elapsed,
                last: Box::new(last),
            }),
        }
    }
}
