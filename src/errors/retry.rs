use std::time::Duration;
use std::future::Future;

use super::classification::ErrorClassification;
use super::types::ReportError;
use tracing::{warn, debug};

const MAX_DELAY: Duration = Duration::from_secs(30);

impl ErrorClassification {
    /// Calculate the retry delay for this error classification based on the
    /// current attempt number (0-indexed) and the configured base delay.
    ///
    /// - rate_limit: base * 5 * (attempt + 1), capped at 30s
    /// - Default: exponential backoff base * 2^attempt + random jitter (0-base), capped at 30s
    pub fn retry_delay(&self, attempt: u32, base: Duration) -> Duration {
        let base_secs = base.as_secs_f64();
        let secs = match self.cause {
            "rate_limit" => base_secs * 5.0 * (attempt as f64 + 1.0),
            _ => {
                let backoff = base_secs * 2.0_f64.powi(attempt as i32);
                let jitter = rand::random::<f64>() * base_secs;
                backoff + jitter
            }
        };
        Duration::from_secs_f64(secs.min(MAX_DELAY.as_secs_f64()))
    }
}

/// Retry configuration for billing fetches.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

/// Execute an async operation with retry logic.
///
/// Retries only if the error is classified as retryable and the attempt
/// bound has not been reached.
pub async fn with_retry<F, Fut, T>(
    operation_name: &str,
    config: &RetryConfig,
    mut factory: F,
) -> Result<T, ReportError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ReportError>>,
{
    let max_attempts = config.max_attempts.max(1);

    for attempt in 0..max_attempts {
        match factory().await {
            Ok(result) => {
                if attempt > 0 {
                    debug!(operation = operation_name, attempt = attempt + 1, "Succeeded after retry");
                }
                return Ok(result);
            }
            Err(e) => {
                let classification = e.classify();

                if !classification.retryable {
                    warn!(
                        operation = operation_name,
                        cause = classification.cause,
                        error = %e,
                        "Non-retryable error, failing immediately"
                    );
                    return Err(e);
                }
                if attempt + 1 >= max_attempts {
                    warn!(
                        operation = operation_name,
                        attempt = attempt + 1,
                        max = max_attempts,
                        error = %e,
                        "Max attempts exhausted"
                    );
                    return Err(e);
                }

                let delay = classification.retry_delay(attempt, config.base_delay);
                warn!(
                    operation = operation_name,
                    attempt = attempt + 1,
                    max = max_attempts,
                    cause = classification.cause,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Retrying after error"
                );

                tokio::time::sleep(delay).await;
            }
        }
    }

    Err(ReportError::Internal("Retry loop exited unexpectedly".into()))
}
