use crate::error::ApiError;
use backoff::{ExponentialBackoff, backoff::Backoff};
use std::future::Future;
use std::time::Duration;

/// Retry configuration for idempotent API reads
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts, the first one included
    pub max_retries: u32,
    /// Initial retry delay
    pub initial_delay: Duration,
    /// Maximum retry delay
    pub max_delay: Duration,
    /// Multiplier for exponential backoff
    pub multiplier: f64,
    /// Whether to retry on client errors (4xx)
    pub retry_client_errors: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(10),
            multiplier: 2.0,
            retry_client_errors: false,
        }
    }
}

impl RetryConfig {
    /// No retries at all: the first failure is returned
    pub fn none() -> Self {
        Self {
            max_retries: 1,
            ..Self::default()
        }
    }

    /// Create a config for quick retry (shorter delays, fewer attempts)
    pub fn quick() -> Self {
        Self {
            max_retries: 2,
            initial_delay: Duration::from_millis(50),
            max_delay: Duration::from_secs(2),
            multiplier: 1.5,
            retry_client_errors: false,
        }
    }
}

/// Retry executor with exponential backoff
pub struct RetryExecutor {
    config: RetryConfig,
}

impl RetryExecutor {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Execute an async operation with retry logic
    pub async fn execute<F, Fut, T>(&self, operation: F) -> Result<T, ApiError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let mut backoff = ExponentialBackoff {
            initial_interval: self.config.initial_delay,
            max_interval: self.config.max_delay,
            multiplier: self.config.multiplier,
            max_elapsed_time: None,
            ..Default::default()
        };
        backoff.reset();

        let mut attempt = 0;

        loop {
            attempt += 1;

            match operation().await {
                Ok(result) => return Ok(result),
                Err(error) => {
                    if !self.should_retry(&error, attempt) {
                        return Err(error);
                    }

                    match backoff.next_backoff() {
                        Some(delay) => {
                            log::debug!(
                                "Retrying after {:?} (attempt {}): {}",
                                delay,
                                attempt,
                                error
                            );
                            tokio::time::sleep(delay).await;
                        }
                        None => {
                            log::warn!(
                                "Max retry attempts reached ({}), giving up",
                                self.config.max_retries
                            );
                            return Err(error);
                        }
                    }
                }
            }
        }
    }

    /// Determine if an error should trigger a retry
    fn should_retry(&self, error: &ApiError, attempt: u32) -> bool {
        if attempt >= self.config.max_retries {
            return false;
        }

        match error {
            // Server errors, timeouts and unreachable hosts
            ApiError::Http {
                status: 500..=599, ..
            } => true,
            ApiError::Http { status: 0, .. } => true,
            ApiError::Timeout { .. } => true,

            ApiError::Http {
                status: 400..=499, ..
            } => self.config.retry_client_errors,

            ApiError::Unauthorized { .. } => false,
            ApiError::Http { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_retry_success_immediate() {
        let executor = RetryExecutor::new(RetryConfig::default());

        let result = tokio_test::block_on(executor.execute(|| async { Ok::<i32, ApiError>(42) }));

        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_retry_recovers_from_server_error() {
        let executor = RetryExecutor::new(RetryConfig::quick());
        let calls = Arc::new(AtomicU32::new(0));

        let result = executor
            .execute(|| {
                let calls = Arc::clone(&calls);
                async move {
                    if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                        Err(ApiError::Http {
                            status: 503,
                            endpoint: "/api/databases".to_string(),
                            message: "unavailable".to_string(),
                        })
                    } else {
                        Ok("listed")
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), "listed");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_retry_gives_up_on_client_error() {
        let executor = RetryExecutor::new(RetryConfig::default());
        let calls = Arc::new(AtomicU32::new(0));

        let result: Result<(), ApiError> = executor
            .execute(|| {
                let calls = Arc::clone(&calls);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(ApiError::Http {
                        status: 404,
                        endpoint: "/api/databases/x".to_string(),
                        message: "Database connection not found".to_string(),
                    })
                }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retry_none_makes_single_attempt() {
        let executor = RetryExecutor::new(RetryConfig::none());
        let calls = Arc::new(AtomicU32::new(0));

        let result: Result<(), ApiError> = executor
            .execute(|| {
                let calls = Arc::clone(&calls);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(ApiError::Timeout {
                        timeout_secs: 1,
                        endpoint: "/api/databases".to_string(),
                    })
                }
            })
            .await;

        assert!(matches!(result, Err(ApiError::Timeout { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_retry_config_presets() {
        let default = RetryConfig::default();
        assert_eq!(default.max_retries, 3);
        assert_eq!(default.initial_delay, Duration::from_millis(100));

        let quick = RetryConfig::quick();
        assert_eq!(quick.max_retries, 2);
        assert_eq!(quick.initial_delay, Duration::from_millis(50));

        assert_eq!(RetryConfig::none().max_retries, 1);
    }
}
