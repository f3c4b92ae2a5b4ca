// Re-export route modules
pub mod messages;
pub mod wsroute;

use std::future::Future;
use std::time::Duration;

use resilience::{with_retry, with_timeout, RetryConfig, TimeoutError};

use crate::config::Config;
use crate::error::AppError;

/// Run a store operation with the bounded timeout and bounded retry policy
/// the HTTP layer applies to storage unavailability. Permanent errors pass
/// through on the first attempt; transient ones are retried a small fixed
/// number of times and then surfaced as 503.
pub(crate) async fn store_call<T, F, Fut>(config: &Config, mut op: F) -> Result<T, AppError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
{
    let deadline = Duration::from_millis(config.store_timeout_ms);
    let retry = RetryConfig {
        max_retries: 2,
        initial_backoff: Duration::from_millis(50),
        max_backoff: Duration::from_secs(1),
        backoff_multiplier: 2.0,
        jitter: true,
    };

    with_retry(retry, AppError::is_retryable, || {
        let fut = op();
        async move {
            match with_timeout(deadline, fut).await {
                Ok(result) => result,
                Err(TimeoutError::Elapsed(d)) => Err(AppError::StorageUnavailable(format!(
                    "store call exceeded {d:?}"
                ))),
            }
        }
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn test_config() -> Config {
        Config {
            database_url: "postgres://localhost/test".into(),
            port: 3000,
            jwt_secret: "secret".into(),
            cors_origin: None,
            store_timeout_ms: 50,
            db_pool_size: 4,
        }
    }

    #[tokio::test]
    async fn test_store_call_passes_through_success() {
        let config = test_config();
        let result = store_call(&config, || async { Ok::<_, AppError>(7) }).await;
        assert_eq!(result.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_store_call_does_not_retry_permanent_errors() {
        let config = test_config();
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = calls.clone();

        let result: Result<(), _> = store_call(&config, move || {
            calls_clone.fetch_add(1, Ordering::SeqCst);
            async { Err(AppError::InvalidType("video".into())) }
        })
        .await;

        assert!(matches!(result, Err(AppError::InvalidType(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_store_call_retries_transient_errors() {
        let config = test_config();
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = calls.clone();

        let result = store_call(&config, move || {
            let n = calls_clone.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Err(AppError::StorageUnavailable("pool timeout".into()))
                } else {
                    Ok(42)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_store_call_times_out_as_unavailable() {
        let config = test_config();

        let result: Result<(), _> = store_call(&config, || async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;

        assert!(matches!(result, Err(AppError::StorageUnavailable(_))));
    }
}
