//! Retry with exponential backoff for HTTP backends

use reqwest::StatusCode;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// A failed request attempt
#[derive(Debug, Clone)]
pub struct RequestFailure {
    pub message: String,
    /// Whether another attempt may succeed
    pub retryable: bool,
}

impl RequestFailure {
    pub fn transport(context: &str, err: &reqwest::Error) -> Self {
        Self {
            message: format!("{}: {}", context, err),
            retryable: err.is_timeout() || err.is_connect() || err.is_request(),
        }
    }

    pub fn status(context: &str, status: StatusCode, body: &str) -> Self {
        Self {
            message: format!("{}: HTTP {} - {}", context, status, body),
            retryable: status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error(),
        }
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            retryable: false,
        }
    }
}

/// How many times and how fast to retry
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            base_delay: Duration::from_millis(500),
        }
    }

    fn backoff(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.pow(attempt.min(5))
    }

    /// Run `operation` until it succeeds, fails permanently, or retries run out
    pub async fn run<F, Fut, T>(&self, operation: F) -> std::result::Result<T, RequestFailure>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = std::result::Result<T, RequestFailure>>,
    {
        let mut attempt = 0u32;
        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) if e.retryable && attempt < self.max_retries => {
                    let delay = self.backoff(attempt);
                    tracing::warn!(
                        "Request failed (attempt {}/{}), retrying in {:?}: {}",
                        attempt + 1,
                        self.max_retries + 1,
                        delay,
                        e.message
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
