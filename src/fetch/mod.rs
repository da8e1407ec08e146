//! Feed fetchers: acquire one [`Snapshot`] per feed over HTTP.
//!
//! Each fetcher retries every request a fixed number of times with a fixed
//! delay and a per-request timeout. Once the attempts are used up, the
//! last error is returned and the cycle aborts.

pub mod nsoh;
pub mod thames;

use std::future::Future;
use std::time::Duration;

use reqwest::header::ACCEPT;
use serde::de::DeserializeOwned;

use crate::domain::{FeedSource, Snapshot};
use crate::error::TrackerError;

pub use nsoh::NsohFetcher;
pub use thames::ThamesFetcher;

/// Source of feed snapshots.
///
/// Implementations must return a snapshot whose `source` and `timestamp`
/// are populated even when the feed has no records.
pub trait FeedFetcher {
    /// Feed this fetcher reads.
    fn source(&self) -> FeedSource;

    /// Captures the feed's current state.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::Transport`] or
    /// [`TrackerError::MalformedPayload`] once the retry budget is spent.
    fn fetch(&self) -> impl Future<Output = Result<Snapshot, TrackerError>> + Send;
}

/// Fixed-count, fixed-delay retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first; `0` is treated as `1`.
    pub max_attempts: u32,
    /// Pause between consecutive attempts.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(5),
        }
    }
}

/// Runs `operation` until it succeeds or the policy's attempts run out.
///
/// The closure receives the 1-based attempt number.
///
/// # Errors
///
/// Returns the error of the final attempt.
pub async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    feed: FeedSource,
    mut operation: F,
) -> Result<T, TrackerError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, TrackerError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < max_attempts => {
                tracing::warn!(%feed, attempt, max_attempts, error = %err, "feed request failed, retrying");
                tokio::time::sleep(policy.delay).await;
                attempt += 1;
            }
            Err(err) => {
                tracing::error!(%feed, attempts = attempt, error = %err, "feed request failed");
                return Err(err);
            }
        }
    }
}

/// Builds the HTTP client shared by the fetchers.
///
/// # Errors
///
/// Returns [`TrackerError::Config`] if the TLS backend cannot be
/// initialised.
pub fn build_http_client(timeout: Duration) -> Result<reqwest::Client, TrackerError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("nsoh-rollback-tracker/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| TrackerError::Config(format!("failed to build http client: {e}")))
}

/// Issues one GET and decodes the JSON body.
///
/// Network failures and non-success statuses are transport errors; a body
/// that does not decode as `T` is a malformed payload.
async fn get_json<T: DeserializeOwned>(
    request: reqwest::RequestBuilder,
    feed: FeedSource,
) -> Result<T, TrackerError> {
    let transport = |message: String| TrackerError::Transport { feed, message };

    let response = request
        .header(ACCEPT, "application/json")
        .send()
        .await
        .map_err(|e| transport(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(transport(format!("HTTP {status} from {}", response.url())));
    }

    let body = response.bytes().await.map_err(|e| transport(e.to_string()))?;
    serde_json::from_slice(&body).map_err(|e| TrackerError::MalformedPayload {
        feed,
        message: e.to_string(),
    })
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    fn instant_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            delay: Duration::ZERO,
        }
    }

    fn failure(n: u32) -> TrackerError {
        TrackerError::Transport {
            feed: FeedSource::Nsoh,
            message: format!("attempt {n}"),
        }
    }

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let result = with_retry(&instant_policy(3), FeedSource::Nsoh, |attempt| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt < 3 {
                    Err(failure(attempt))
                } else {
                    Ok(attempt)
                }
            }
        })
        .await;
        assert!(matches!(result, Ok(3)));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn surfaces_last_error_when_exhausted() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = with_retry(&instant_policy(2), FeedSource::Nsoh, |attempt| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move { Err(failure(attempt)) }
        })
        .await;
        let Err(err) = result else {
            panic!("expected failure");
        };
        assert!(err.to_string().contains("attempt 2"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn zero_attempts_still_tries_once() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = with_retry(&instant_policy(0), FeedSource::Thames, |attempt| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move { Err(failure(attempt)) }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
