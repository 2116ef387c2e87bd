//! # Retrying Executor
//!
//! Runs one remote operation under a per-attempt timeout with bounded
//! exponential backoff. The classifier decides whether a failure is worth
//! another attempt.
//!
//! Backoff for the failed attempt `n` (1-indexed) is `base_delay * 2^(n-1)`,
//! so waits go 1×, 2×, 4× base. A rate-limit answer whose `Retry-After` is
//! longer than the backoff waits `Retry-After` instead.

use crate::config::read_var;
use async_trait::async_trait;
use grid_core::{classify, Failure, GridError, GridResult};
use serde_json::json;
use std::env;
use std::fmt::Display;
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

pub const DEFAULT_RETRIES: u32 = 3;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(30_000);
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(1_000);

pub const RETRIES_VAR: &str = "GRID_RETRIES";
pub const TIMEOUT_VAR: &str = "GRID_TIMEOUT_MS";
pub const RETRY_DELAY_VAR: &str = "GRID_RETRY_DELAY_MS";

/// Largest backoff exponent; keeps the shift in range
const MAX_BACKOFF_EXPONENT: u32 = 16;

/// Attempt budget and timing for remote calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts (values below 1 behave as 1)
    pub retries: u32,
    /// Per-attempt timeout
    pub timeout: Duration,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: DEFAULT_RETRIES,
            timeout: DEFAULT_TIMEOUT,
            base_delay: DEFAULT_BASE_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Load overrides from `GRID_RETRIES`, `GRID_TIMEOUT_MS` and
    /// `GRID_RETRY_DELAY_MS`.
    pub fn from_env() -> GridResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> GridResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let retries = parse_var::<u32, _>(&lookup, RETRIES_VAR)?.unwrap_or(defaults.retries);
        let timeout = parse_var::<u64, _>(&lookup, TIMEOUT_VAR)?
            .map(Duration::from_millis)
            .unwrap_or(defaults.timeout);
        let base_delay = parse_var::<u64, _>(&lookup, RETRY_DELAY_VAR)?
            .map(Duration::from_millis)
            .unwrap_or(defaults.base_delay);

        if timeout.is_zero() {
            return Err(GridError::config(format!(
                "{} must be greater than zero",
                TIMEOUT_VAR
            )));
        }

        Ok(Self {
            retries,
            timeout,
            base_delay,
        })
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    pub fn attempts(&self) -> u32 {
        self.retries.max(1)
    }

    /// Wait after failed attempt `attempt` (1-indexed)
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(MAX_BACKOFF_EXPONENT);
        self.base_delay.saturating_mul(1u32 << exponent)
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> GridResult<Option<T>>
where
    T: FromStr,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    read_var(lookup, key)
        .map(|raw| {
            raw.parse::<T>().map_err(|e| {
                GridError::config(format!("{} has invalid value {:?}: {}", key, raw, e))
            })
        })
        .transpose()
}

/// Backoff sleep seam
#[async_trait]
pub trait Delay: Send + Sync {
    async fn delay(&self, duration: Duration);
}

/// Sleeps on the tokio clock
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioDelay;

#[async_trait]
impl Delay for TokioDelay {
    async fn delay(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Timeout + retry wrapper around a single remote operation
#[derive(Clone)]
pub struct Executor {
    policy: RetryPolicy,
    delay: Arc<dyn Delay>,
}

impl Executor {
    pub fn new(policy: RetryPolicy, delay: Arc<dyn Delay>) -> Self {
        Self { policy, delay }
    }

    /// Executor sleeping on the tokio clock
    pub fn with_policy(policy: RetryPolicy) -> Self {
        Self::new(policy, Arc::new(TokioDelay))
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run `operation` until it succeeds, fails with a non-retryable error,
    /// or the attempt budget is spent.
    ///
    /// Every error returned is classified. A timed-out attempt is dropped
    /// before the next one starts.
    pub async fn execute<T, F, Fut>(&self, operation: &str, mut op: F) -> GridResult<T>
    where
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = Result<T, Failure>> + Send,
        T: Send,
    {
        let attempts = self.policy.attempts();
        let mut attempt = 1;

        loop {
            let error = match tokio::time::timeout(self.policy.timeout, op()).await {
                Ok(Ok(value)) => {
                    if attempt > 1 {
                        info!(operation, attempt, "Grid call succeeded after retry");
                    }
                    return Ok(value);
                }
                Ok(Err(failure)) => classify(failure),
                Err(_) => self.timeout_error(operation),
            };

            if !error.is_retryable() {
                debug!(
                    operation,
                    attempt,
                    code = error.code(),
                    "Grid call failed with non-retryable error"
                );
                return Err(error);
            }

            if attempt >= attempts {
                error!(
                    operation,
                    attempts,
                    code = error.code(),
                    "Grid call failed after all attempts: {}",
                    error
                );
                return Err(error);
            }

            let wait = self.wait_after(attempt, &error);
            warn!(
                operation,
                attempt,
                wait_ms = wait.as_millis() as u64,
                code = error.code(),
                "Grid call failed, retrying: {}",
                error
            );
            self.delay.delay(wait).await;
            attempt += 1;
        }
    }

    fn wait_after(&self, attempt: u32, error: &GridError) -> Duration {
        let backoff = self.policy.backoff_for(attempt);
        match error.retry_after() {
            Some(retry_after) => backoff.max(retry_after),
            None => backoff,
        }
    }

    fn timeout_error(&self, operation: &str) -> GridError {
        let timeout_ms = self.policy.timeout.as_millis() as u64;
        GridError::timeout(format!("{} timed out after {}ms", operation, timeout_ms))
            .with_details(json!({
                "operation": operation,
                "timeoutMs": timeout_ms,
            }))
    }
}

impl std::fmt::Debug for Executor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executor")
            .field("policy", &self.policy)
            .finish()
    }
}
