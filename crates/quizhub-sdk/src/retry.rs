//! Retry, backoff and re-authentication for one logical call
//!
//! A logical call runs as a small state machine:
//!
//! ```text
//! Attempting(n) --2xx--------------------------------> Succeeded
//! Attempting(1) --401/403--> AwaitingRefresh --ok----> Attempting(2)
//!                                             --none--> Failed (session already torn down)
//! Attempting(n) --429/503, n < max--> Backoff(d) ----> Attempting(n+1)
//! Attempting(n) --anything else----------------------> Failed (error unchanged)
//! ```
//!
//! Calls are independent of each other apart from the shared
//! [`RefreshCoordinator`].

use crate::auth::RefreshCoordinator;
use crate::error::{ApiError, HttpError, Result};
use crate::executor::{RequestExecutor, RequestOptions};
use chrono::{DateTime, Utc};
use rand::Rng;
use reqwest::header::RETRY_AFTER;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

/// Backoff and attempt budget for rate-limited / unavailable responses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts per logical call, including the first
    pub max_attempts: u32,
    /// Multiplied by `2^attempt`
    #[serde(with = "millis")]
    pub base_delay: Duration,
    /// Cap on the exponential part of the delay
    #[serde(with = "millis")]
    pub max_delay: Duration,
    /// Upper bound (exclusive) of the random jitter added to computed delays
    #[serde(with = "millis")]
    pub max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(30),
            max_jitter: Duration::from_millis(250),
        }
    }
}

impl RetryPolicy {
    /// `min(max_delay, base_delay * 2^attempt)`, without jitter
    pub fn exponential_delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    /// Delay before the attempt following `attempt`.
    ///
    /// A server-provided `Retry-After` wins; otherwise exponential backoff
    /// plus jitter.
    pub fn delay_for(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        match retry_after {
            Some(delay) => delay,
            None => self.exponential_delay(attempt) + self.jitter(),
        }
    }

    fn jitter(&self) -> Duration {
        let bound = self.max_jitter.as_millis() as u64;
        if bound == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::thread_rng().gen_range(0..bound))
    }
}

/// Parse a `Retry-After` header value.
///
/// Accepts delta-seconds or an HTTP-date. Fractional seconds truncate to
/// whole seconds. Values that come out as zero or in the past count as
/// absent, as do unparseable ones.
pub fn parse_retry_after(value: &str, now: DateTime<Utc>) -> Option<Duration> {
    let value = value.trim();
    if let Ok(seconds) = value.parse::<i64>() {
        return (seconds > 0).then(|| Duration::from_secs(seconds as u64));
    }
    if let Ok(seconds) = value.parse::<f64>() {
        return (seconds.is_finite() && seconds >= 1.0)
            .then(|| Duration::from_secs(seconds.trunc() as u64));
    }

    let date = DateTime::parse_from_rfc2822(value).ok()?;
    (date.with_timezone(&Utc) - now)
        .to_std()
        .ok()
        .filter(|d| !d.is_zero())
}

fn retry_after(error: &HttpError) -> Option<Duration> {
    let value = error.headers.get(RETRY_AFTER)?.to_str().ok()?;
    parse_retry_after(value, Utc::now())
}

/// Where a logical call currently stands
#[derive(Debug)]
enum CallState {
    Attempting(u32),
    AwaitingRefresh {
        error: HttpError,
        stale_token: Option<String>,
    },
    Backoff {
        attempt: u32,
        delay: Duration,
    },
}

/// Runs logical calls against the executor with the retry policy applied
#[derive(Clone)]
pub struct RetryOrchestrator {
    executor: RequestExecutor,
    refresher: RefreshCoordinator,
    policy: RetryPolicy,
}

impl std::fmt::Debug for RetryOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryOrchestrator")
            .field("executor", &self.executor)
            .field("refresher", &self.refresher)
            .field("policy", &self.policy)
            .finish()
    }
}

impl RetryOrchestrator {
    pub fn new(executor: RequestExecutor, refresher: RefreshCoordinator, policy: RetryPolicy) -> Self {
        Self {
            executor,
            refresher,
            policy,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run one logical call to completion
    pub async fn run(&self, path: &str, options: RequestOptions) -> Result<Value> {
        let mut options = options;
        let mut state = CallState::Attempting(1);

        loop {
            state = match state {
                CallState::Attempting(attempt) => {
                    let stale_token = self.executor.outgoing_token(&options);
                    match self.executor.execute(path, &options).await {
                        Ok(value) => {
                            if attempt > 1 {
                                debug!("{} succeeded on attempt {}", path, attempt);
                            }
                            return Ok(value);
                        }
                        Err(ApiError::Http(error)) => {
                            self.next_state(path, attempt, error, stale_token)?
                        }
                        Err(other) => return Err(other),
                    }
                }
                CallState::AwaitingRefresh { error, stale_token } => {
                    match self.refresher.refresh(stale_token.as_deref()).await {
                        Some(token) => {
                            debug!("Retrying {} with renewed access token", path);
                            options.set_bearer(&token)?;
                            CallState::Attempting(2)
                        }
                        None => return Err(ApiError::Http(error)),
                    }
                }
                CallState::Backoff { attempt, delay } => {
                    tokio::time::sleep(delay).await;
                    CallState::Attempting(attempt + 1)
                }
            };
        }
    }

    /// Transition out of `Attempting(attempt)` after an HTTP error
    fn next_state(
        &self,
        path: &str,
        attempt: u32,
        error: HttpError,
        stale_token: Option<String>,
    ) -> Result<CallState> {
        if error.is_auth_failure() && attempt == 1 {
            debug!(
                "{} returned {}; attempting token refresh",
                path,
                error.status.as_u16()
            );
            return Ok(CallState::AwaitingRefresh { error, stale_token });
        }

        if error.is_retryable() && attempt < self.policy.max_attempts {
            let delay = self.policy.delay_for(attempt, retry_after(&error));
            info!(
                "{} returned {} (attempt {}/{}); retrying in {}ms",
                path,
                error.status.as_u16(),
                attempt,
                self.policy.max_attempts,
                delay.as_millis()
            );
            return Ok(CallState::Backoff { attempt, delay });
        }

        Err(ApiError::Http(error))
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}
