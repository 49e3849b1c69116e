//! Bounded retry with exponential backoff for provider HTTP calls
//!
//! Only transient failures are retried: transport errors, 429 and 5xx.
//! Anything else (bad request, auth, unknown model, unparseable body)
//! fails on the first attempt.

use reqwest::StatusCode;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

use crate::error::{Error, Result};

/// First backoff delay; doubled after every failed attempt
pub const RETRY_BASE_DELAY: Duration = Duration::from_secs(1);

/// A failed attempt, tagged with whether trying again could help
#[derive(Debug)]
pub struct RequestFailure {
    error: Error,
    transient: bool,
}

impl RequestFailure {
    /// Failure worth retrying (connection refused, timeout, ...)
    pub fn transient(error: Error) -> Self {
        Self {
            error,
            transient: true,
        }
    }

    /// Failure that will not go away on retry
    pub fn permanent(error: Error) -> Self {
        Self {
            error,
            transient: false,
        }
    }

    /// Failure for a non-success HTTP status
    pub fn status(status: StatusCode, error: Error) -> Self {
        Self {
            error,
            transient: is_transient_status(status),
        }
    }
}

impl From<Error> for RequestFailure {
    fn from(error: Error) -> Self {
        Self::permanent(error)
    }
}

/// 429 and server errors are retried; other statuses are not
pub fn is_transient_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// Retry `operation` up to `max_retries` extra times while it fails
/// transiently, doubling the delay (starting at `base_delay`) between
/// attempts. Returns the last error.
pub async fn retry_request<F, Fut, T>(
    label: &str,
    max_retries: u32,
    base_delay: Duration,
    operation: F,
) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = std::result::Result<T, RequestFailure>>,
{
    let mut attempt = 0u32;

    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(failure) if failure.transient && attempt < max_retries => {
                let delay = base_delay * 2u32.pow(attempt);
                tracing::warn!(
                    "{} failed (attempt {}/{}): {}; retrying in {:?}",
                    label,
                    attempt + 1,
                    max_retries + 1,
                    failure.error,
                    delay
                );
                sleep(delay).await;
                attempt += 1;
            }
            Err(failure) => return Err(failure.error),
        }
    }
}
