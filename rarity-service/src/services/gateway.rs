use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::error::GatewayError;
use crate::services::source::{HttpSource, RawResponse};

/// 422 from iNaturalist means the requested user does not exist.
pub const STATUS_UNPROCESSABLE: u16 = 422;
pub const STATUS_TOO_MANY_REQUESTS: u16 = 429;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    /// Seconds; the delay before retry `i` is `backoff_factor * 2^i`.
    pub backoff_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            backoff_factor: 0.3,
        }
    }
}

impl RetryPolicy {
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let millis = self.backoff_factor * 1000.0 * 2f64.powi(attempt as i32);
        Duration::from_millis(millis.round() as u64)
    }
}

/// GET `url`, retrying transient failures with exponential backoff.
///
/// A 422 response is handed back to the caller untouched. Every other non-success status,
/// including 429, and every transport error is retried until the budget is spent, at which
/// point the last error is returned.
pub async fn fetch_with_retries(
    source: &(dyn HttpSource + Send + Sync),
    url: &str,
    params: &[(String, String)],
    policy: &RetryPolicy,
) -> Result<RawResponse, GatewayError> {
    let attempts = policy.max_retries.max(1);
    let mut attempt = 0;

    loop {
        let failure = match source.get(url, params).await {
            Ok(response) if response.is_success() || response.status == STATUS_UNPROCESSABLE => {
                if attempt > 0 {
                    debug!(url, attempt, "Request succeeded after retry");
                }
                return Ok(response);
            }
            Ok(response) => {
                if response.status == STATUS_TOO_MANY_REQUESTS {
                    warn!(url, attempt, "Rate limited by upstream");
                }
                GatewayError::Status {
                    status: response.status,
                    url: url.to_string(),
                }
            }
            Err(e) => e,
        };

        if attempt + 1 >= attempts {
            warn!(url, attempts, error = %failure, "Request failed after all retries");
            return Err(failure);
        }

        let delay = policy.delay_for(attempt);
        debug!(
            url,
            attempt,
            delay_ms = delay.as_millis() as u64,
            error = %failure,
            "Retrying request"
        );
        sleep(delay).await;
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::source::testing::ScriptedSource;

    const URL: &str = "https://api.test/v1/thing";

    fn assert_close(actual: Duration, expected: Duration) {
        assert!(
            actual >= expected && actual < expected + Duration::from_millis(2),
            "expected ~{:?}, got {:?}",
            expected,
            actual
        );
    }

    fn policy() -> RetryPolicy {
        RetryPolicy {
            max_retries: 5,
            backoff_factor: 0.3,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn two_transient_failures_then_success() {
        let source = ScriptedSource::new();
        source
            .push(URL, Err(GatewayError::Transport("connection reset".into())))
            .push(URL, Ok(RawResponse::new(503, "")))
            .push(URL, Ok(RawResponse::new(200, "{}")));

        let response = fetch_with_retries(&source, URL, &[], &policy()).await.unwrap();
        assert_eq!(response.status, 200);

        let calls = source.calls();
        assert_eq!(calls.len(), 3);
        assert_close(calls[1].at - calls[0].at, Duration::from_millis(300));
        assert_close(calls[2].at - calls[1].at, Duration::from_millis(600));
    }

    #[tokio::test(start_paused = true)]
    async fn unprocessable_is_returned_without_retry() {
        let source = ScriptedSource::new();
        source.always(URL, Ok(RawResponse::new(422, "{}")));

        let response = fetch_with_retries(&source, URL, &[], &policy()).await.unwrap();
        assert_eq!(response.status, 422);
        assert_eq!(source.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limits_share_the_retry_budget() {
        let source = ScriptedSource::new();
        source.always(URL, Ok(RawResponse::new(429, "")));

        let err = fetch_with_retries(&source, URL, &[], &policy()).await.unwrap_err();
        assert_eq!(
            err,
            GatewayError::Status {
                status: 429,
                url: URL.to_string()
            }
        );
        assert_eq!(source.calls().len(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn final_attempt_error_propagates() {
        let source = ScriptedSource::new();
        source.always(URL, Err(GatewayError::Transport("dns failure".into())));
        let policy = RetryPolicy {
            max_retries: 3,
            backoff_factor: 0.1,
        };

        let err = fetch_with_retries(&source, URL, &[], &policy).await.unwrap_err();
        assert_eq!(err, GatewayError::Transport("dns failure".into()));
        let calls = source.calls();
        assert_eq!(calls.len(), 3);
        // no sleep after the last attempt
        assert_close(calls[2].at - calls[0].at, Duration::from_millis(300));
    }

    #[test]
    fn delays_double() {
        let policy = policy();
        assert_eq!(policy.delay_for(0), Duration::from_millis(300));
        assert_eq!(policy.delay_for(1), Duration::from_millis(600));
        assert_eq!(policy.delay_for(2), Duration::from_millis(1200));
    }
}
