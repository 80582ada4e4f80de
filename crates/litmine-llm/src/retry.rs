//! Bounded retry with exponential backoff for provider calls.

use crate::llm::{CompletionRequest, CompletionResponse, LLMError, LLMProvider};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub backoff_multiplier: f64,
    /// Add up to 25% random jitter to each delay.
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff_ms: 500,
            max_backoff_ms: 8_000,
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// Single attempt, no waiting.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }
}

/// The last error once retries are exhausted or a permanent error was hit.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{error} (after {attempts} attempt(s))")]
pub struct RetryError {
    pub attempts: u32,
    #[source]
    pub error: LLMError,
}

/// Run `operation` until it succeeds, fails permanently, or retries run out.
///
/// Transient errors (see [`LLMError::is_transient`]) are retried after an
/// exponential delay; rate limits wait at least as long as the server asked.
pub async fn with_retry<F, Fut, T>(config: &RetryConfig, operation: F) -> Result<T, RetryError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, LLMError>>,
{
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(val) => return Ok(val),
            Err(e) => {
                if !e.is_transient() || attempt >= config.max_retries {
                    return Err(RetryError {
                        attempts: attempt + 1,
                        error: e,
                    });
                }

                let backoff_ms = compute_backoff(config, attempt, &e);
                tracing::warn!(
                    attempt = attempt + 1,
                    max = config.max_retries,
                    backoff_ms = backoff_ms,
                    error = %e,
                    "Retrying after transient error"
                );
                tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                attempt += 1;
            }
        }
    }
}

/// One completion call with a per-attempt timeout and retries.
pub async fn complete_with_retry(
    provider: &dyn LLMProvider,
    request: &CompletionRequest,
    config: &RetryConfig,
) -> Result<CompletionResponse, RetryError> {
    with_retry(config, move || async move {
        match tokio::time::timeout(request.timeout, provider.complete(request.clone())).await {
            Ok(result) => result,
            Err(_) => Err(LLMError::Timeout {
                after_ms: request.timeout.as_millis() as u64,
            }),
        }
    })
    .await
}

fn compute_backoff(config: &RetryConfig, attempt: u32, err: &LLMError) -> u64 {
    let computed = compute_exponential_backoff(config, attempt);
    if let LLMError::RateLimited { retry_after_ms } = err {
        return (*retry_after_ms).max(computed);
    }
    computed
}

fn compute_exponential_backoff(config: &RetryConfig, attempt: u32) -> u64 {
    let base = config.initial_backoff_ms as f64 * config.backoff_multiplier.powi(attempt as i32);
    let capped = base.min(config.max_backoff_ms as f64) as u64;
    if config.jitter {
        let jitter = (capped as f64 * 0.25 * rand::thread_rng().gen::<f64>()) as u64;
        capped + jitter
    } else {
        capped
    }
}
