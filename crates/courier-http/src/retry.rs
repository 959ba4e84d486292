//! Retry strategies and the attempt loop.
//!
//! A strategy expands into a finite [`Delays`] sequence of
//! `max_attempts - 1` waits. The attempt loop consumes one wait per failed
//! attempt and then makes one last attempt whose outcome is returned as is,
//! so callers always see the real terminal error.

use crate::error::HttpError;
use crate::request::PreparedRequest;
use crate::transport::{RawResponse, Transport};
use courier_common_config::{RetryKind, RetrySettings};
use courier_common_log::spans;
use std::iter::FusedIterator;
use std::time::Duration;
use tracing::{debug, warn, Span};

/// Attempts made by [`RetryStrategy::default`].
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
/// Delay used by [`RetryStrategy::default`].
pub const DEFAULT_DELAY: Duration = Duration::from_secs(2);

/// Multiplier applied to the base delay before the `retry`-th retry (1-indexed).
///
/// Growth is linear in the retry index: `base, 2*base, 3*base, ...`.
const fn exponential_multiplier(retry: u32) -> u32 {
    retry
}

/// How long to wait between attempts, and how many attempts to make.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RetryStrategy {
    /// Same delay between every attempt.
    Constant { max_attempts: u32, delay: Duration },
    /// Delay grows with the retry index.
    Exponential { max_attempts: u32, base_delay: Duration },
}

impl Default for RetryStrategy {
    fn default() -> Self {
        RetryStrategy::Exponential {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_DELAY,
        }
    }
}

impl RetryStrategy {
    /// A single attempt, no waiting.
    pub fn none() -> Self {
        RetryStrategy::Constant {
            max_attempts: 1,
            delay: Duration::ZERO,
        }
    }

    pub fn constant(max_attempts: u32, delay: Duration) -> Self {
        RetryStrategy::Constant { max_attempts, delay }
    }

    pub fn exponential(max_attempts: u32, base_delay: Duration) -> Self {
        RetryStrategy::Exponential {
            max_attempts,
            base_delay,
        }
    }

    /// Total attempts, including the first.
    pub fn max_attempts(&self) -> u32 {
        match self {
            RetryStrategy::Constant { max_attempts, .. }
            | RetryStrategy::Exponential { max_attempts, .. } => *max_attempts,
        }
    }

    /// Constant delay, or the exponential base delay.
    pub fn delay(&self) -> Duration {
        match self {
            RetryStrategy::Constant { delay, .. } => *delay,
            RetryStrategy::Exponential { base_delay, .. } => *base_delay,
        }
    }

    /// At least one attempt is required.
    pub fn validate(&self) -> Result<(), HttpError> {
        if self.max_attempts() == 0 {
            return Err(HttpError::InvalidRetryConfiguration {
                message: "max_attempts must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Fresh delay sequence for one call.
    pub fn delays(&self) -> Delays {
        Delays {
            strategy: *self,
            next_retry: 1,
        }
    }

    fn delay_before(&self, retry: u32) -> Duration {
        match self {
            RetryStrategy::Constant { delay, .. } => *delay,
            RetryStrategy::Exponential { base_delay, .. } => {
                base_delay.saturating_mul(exponential_multiplier(retry))
            }
        }
    }
}

impl From<&RetrySettings> for RetryStrategy {
    fn from(settings: &RetrySettings) -> Self {
        match settings.strategy {
            RetryKind::Constant => RetryStrategy::constant(settings.max_attempts, settings.delay()),
            RetryKind::Exponential => {
                RetryStrategy::exponential(settings.max_attempts, settings.delay())
            }
        }
    }
}

/// Lazy sequence of waits between attempts.
#[derive(Debug, Clone)]
pub struct Delays {
    strategy: RetryStrategy,
    next_retry: u32,
}

impl Iterator for Delays {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        if self.next_retry >= self.strategy.max_attempts() {
            return None;
        }
        let delay = self.strategy.delay_before(self.next_retry);
        self.next_retry += 1;
        Some(delay)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self
            .strategy
            .max_attempts()
            .saturating_sub(self.next_retry) as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Delays {}

impl FusedIterator for Delays {}

/// Run `request` through `transport`, retrying transport failures per `strategy`.
///
/// Attempts are strictly sequential. Waits use the async timer, so only the
/// calling task is suspended.
pub async fn execute_with_retry(
    transport: &dyn Transport,
    request: &PreparedRequest,
    strategy: &RetryStrategy,
) -> Result<RawResponse, HttpError> {
    strategy.validate()?;

    let mut attempt = 0u32;
    for delay in strategy.delays() {
        attempt += 1;
        match transport.execute(request).await {
            Ok(response) => {
                debug!(attempt, status = ?response.meta.status, "response received");
                spans::record_outcome(&Span::current(), response.meta.status, attempt);
                return Ok(response);
            }
            Err(error) => {
                warn!(
                    attempt,
                    max_attempts = strategy.max_attempts(),
                    delay_ms = delay.as_millis() as u64,
                    error = %error,
                    "attempt failed, retrying"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }

    attempt += 1;
    let result = transport.execute(request).await;
    match &result {
        Ok(response) => {
            debug!(attempt, status = ?response.meta.status, "response received");
            spans::record_outcome(&Span::current(), response.meta.status, attempt);
        }
        Err(error) => {
            debug!(attempt, error = %error, "final attempt failed");
            spans::record_outcome(&Span::current(), None, attempt);
        }
    }
    result.map_err(HttpError::from)
}
