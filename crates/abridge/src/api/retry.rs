//! Transport retry for generation calls.
//!
//! Transient failures (429, 5xx gateway errors, timeouts, connection resets)
//! are retried with exponential backoff; permanent ones (400, 401, 403, 404,
//! 422, missing key) never are. This sits below the [`Generator`] boundary.
//! The summarization pipeline itself never retries a failed call, and the
//! default policy performs no retries at all.
//!
//! [`Generator`]: crate::api::Generator

use crate::GenerationError;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Multipliers applied to successive delays, cycling. Deterministic so
/// tests and logs are reproducible.
const JITTER: [f64; 4] = [0.75, 0.90, 0.60, 0.85];

/// Backoff policy.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Extra attempts after the first failure. `0` disables retry.
    pub max_retries: u32,
    pub base_delay: Duration,
    pub delay_cap: Duration,
    /// Growth factor between consecutive delays.
    pub factor: f64,
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::from_millis(500),
            delay_cap: Duration::from_secs(8),
            factor: 2.0,
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// Default backoff with `retries` extra attempts.
    pub fn with_retries(retries: u32) -> Self {
        Self {
            max_retries: retries,
            ..Self::default()
        }
    }

    /// Sleep before retry number `retry` (0-based).
    pub fn delay_for_attempt(&self, retry: u32) -> Duration {
        let exp = i32::try_from(retry).unwrap_or(i32::MAX);
        let secs = (self.base_delay.as_secs_f64() * self.factor.powi(exp))
            .min(self.delay_cap.as_secs_f64());
        let scale = if self.jitter {
            JITTER[retry as usize % JITTER.len()]
        } else {
            1.0
        };
        Duration::from_secs_f64(secs * scale)
    }

    pub fn should_retry(&self, retry: u32, error: &GenerationError) -> bool {
        retry < self.max_retries && error.is_transient() && !error.is_permanent()
    }
}

/// Run `call` until it succeeds, fails permanently, or retries run out.
pub async fn retry_call<T, F, Fut>(config: &RetryConfig, mut call: F) -> Result<T, GenerationError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, GenerationError>>,
{
    let mut retry = 0;
    loop {
        let err = match call().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };
        if !config.should_retry(retry, &err) {
            return Err(err);
        }
        let delay = config.delay_for_attempt(retry);
        retry += 1;
        warn!(
            "Generation failed ({err}); retry {retry}/{} in {delay:?}",
            config.max_retries
        );
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast(retries: u32) -> RetryConfig {
        RetryConfig {
            base_delay: Duration::from_millis(1),
            ..RetryConfig::with_retries(retries)
        }
    }

    #[test]
    fn off_by_default() {
        assert!(!RetryConfig::default().should_retry(0, &GenerationError::Timeout));
    }

    #[test]
    fn delays_grow_then_cap() {
        let config = RetryConfig {
            jitter: false,
            delay_cap: Duration::from_secs(3),
            ..RetryConfig::with_retries(8)
        };
        assert_eq!(config.delay_for_attempt(0), Duration::from_millis(500));
        assert_eq!(config.delay_for_attempt(1), Duration::from_secs(1));
        assert_eq!(config.delay_for_attempt(2), Duration::from_secs(2));
        assert_eq!(config.delay_for_attempt(6), Duration::from_secs(3));
    }

    #[test]
    fn jitter_only_shortens() {
        let jittered = RetryConfig::with_retries(4);
        let steady = RetryConfig {
            jitter: false,
            ..jittered.clone()
        };
        for retry in 0..4 {
            assert!(jittered.delay_for_attempt(retry) < steady.delay_for_attempt(retry));
        }
    }

    #[test]
    fn classification_drives_retry() {
        let config = RetryConfig::with_retries(3);
        let rate_limited = GenerationError::Http {
            status: 429,
            body: String::new(),
        };
        let unauthorized = GenerationError::Http {
            status: 401,
            body: String::new(),
        };
        assert!(config.should_retry(0, &rate_limited));
        assert!(!config.should_retry(3, &rate_limited));
        assert!(!config.should_retry(0, &unauthorized));
        assert!(!config.should_retry(0, &GenerationError::Empty));
    }

    #[tokio::test]
    async fn recovers_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let out = retry_call(&fast(3), || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(GenerationError::Transport("connection reset".into()))
                } else {
                    Ok(n)
                }
            }
        })
        .await;
        assert_eq!(out.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn stops_when_retries_run_out() {
        let calls = AtomicU32::new(0);
        let out: Result<(), _> = retry_call(&fast(1), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(GenerationError::Timeout) }
        })
        .await;
        assert!(matches!(out, Err(GenerationError::Timeout)));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn permanent_failure_is_not_retried() {
        let calls = AtomicU32::new(0);
        let out: Result<(), _> = retry_call(&fast(5), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                Err(GenerationError::Http {
                    status: 400,
                    body: "bad request".into(),
                })
            }
        })
        .await;
        assert!(out.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
