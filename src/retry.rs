//! Bounded retry with configurable backoff
//!
//! Part fetches retry transient failures a fixed number of times with a
//! fixed pause in between (the defaults of [`RetryConfig`]). The multiplier
//! and jitter knobs exist for hosts that prefer exponential backoff.
//!
//! # Example
//!
//! ```no_run
//! use media_dl::retry::{IsRetryable, download_with_retry};
//! use media_dl::config::RetryConfig;
//!
//! #[derive(Debug)]
//! enum MyError {
//!     Transient,
//!     Permanent,
//! }
//!
//! impl std::fmt::Display for MyError {
//!     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
//!         write!(f, "{:?}", self)
//!     }
//! }
//!
//! impl IsRetryable for MyError {
//!     fn is_retryable(&self) -> bool {
//!         matches!(self, MyError::Transient)
//!     }
//! }
//!
//! # async fn example() -> Result<(), MyError> {
//! let config = RetryConfig::default();
//! let result = download_with_retry(&config, |_attempt| async {
//!     Ok::<_, MyError>(())
//! }).await?;
//! # Ok(())
//! # }
//! ```

use crate::config::RetryConfig;
use crate::error::Error;
use rand::Rng;
use std::future::Future;
use std::time::Duration;

/// Trait for errors that can be classified as retryable or not
///
/// Transient failures (timeouts, connection resets, server-side 5xx) return `true`.
/// Permanent failures (bad config, missing streams, 404) return `false`.
pub trait IsRetryable {
    /// Returns true if the error is transient and the operation should be retried
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for Error {
    fn is_retryable(&self) -> bool {
        match self {
            // Any transport-level failure while talking to the media host
            Error::Network(_) => true,
            Error::Http { status, .. } => *status >= 500 || *status == 408 || *status == 429,
            Error::Io(e) => !matches!(
                e.kind(),
                std::io::ErrorKind::PermissionDenied | std::io::ErrorKind::InvalidInput
            ),
            Error::Config { .. }
            | Error::DownloadPathBlank
            | Error::DownloadPathNotDir(_)
            | Error::NoStreams { .. }
            | Error::StreamMissing { .. }
            | Error::TaskNotFound(_)
            | Error::AlreadyRunning(_)
            | Error::PartPanicked { .. }
            | Error::Serialization(_)
            | Error::Caption(_)
            | Error::Merge(_)
            | Error::ExternalTool(_)
            | Error::NotSupported(_)
            | Error::Extractor(_)
            | Error::ShuttingDown => false,
        }
    }
}

/// Execute an async operation, retrying retryable failures
///
/// `operation` receives the zero-based attempt number. At most
/// `config.max_attempts` attempts are made (a value of 0 still makes one);
/// after the last one the final error is returned unchanged.
pub async fn download_with_retry<F, Fut, T, E>(config: &RetryConfig, mut operation: F) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: IsRetryable + std::fmt::Display,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 0;
    let mut delay = config.delay;

    loop {
        match operation(attempt).await {
            Ok(result) => {
                if attempt > 0 {
                    tracing::info!(attempts = attempt + 1, "Operation succeeded after retry");
                }
                return Ok(result);
            }
            Err(e) if e.is_retryable() && attempt + 1 < max_attempts => {
                attempt += 1;

                tracing::warn!(
                    error = %e,
                    attempt = attempt,
                    max_attempts = max_attempts,
                    delay_ms = delay.as_millis(),
                    "Operation failed, retrying"
                );

                let wait = if config.jitter { add_jitter(delay) } else { delay };
                tokio::time::sleep(wait).await;

                let next_delay =
                    Duration::from_secs_f64(delay.as_secs_f64() * config.backoff_multiplier);
                delay = next_delay.min(config.max_delay);
            }
            Err(e) => {
                if e.is_retryable() {
                    tracing::error!(
                        error = %e,
                        attempts = attempt + 1,
                        "Operation failed after all retry attempts exhausted"
                    );
                } else {
                    tracing::error!(error = %e, "Operation failed with non-retryable error");
                }
                return Err(e);
            }
        }
    }
}

/// Add random jitter to a delay to prevent thundering herd
///
/// The result lies between `delay` and `2 * delay`.
fn add_jitter(delay: Duration) -> Duration {
    let mut rng = rand::thread_rng();
    let jitter_factor: f64 = rng.gen_range(0.0..=1.0);
    Duration::from_secs_f64(delay.as_secs_f64() * (1.0 + jitter_factor))
}
