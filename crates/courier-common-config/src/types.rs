//! Configuration types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Content type used for request bodies when the caller sets none.
pub const DEFAULT_CONTENT_TYPE: &str = "application/json";

/// Root configuration for an HTTP client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientSettings {
    /// Absolute URL every request path is resolved against.
    pub base_url: Option<String>,
    /// Content type attached to bodies that carry no `Content-Type` header.
    pub default_content_type: String,
    /// Transport (connection pool) configuration.
    pub transport: TransportSettings,
    /// Default retry strategy for calls that do not pick their own.
    pub retry: RetrySettings,
    /// Status codes accepted by default; `None` accepts exactly 200.
    pub accept_status: Option<Vec<u16>>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: None,
            default_content_type: DEFAULT_CONTENT_TYPE.to_string(),
            transport: TransportSettings::default(),
            retry: RetrySettings::default(),
            accept_status: None,
        }
    }
}

/// Connection-level settings shared by every call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportSettings {
    /// Connection timeout (ms).
    pub connect_timeout_ms: u64,
    /// Whole-request timeout applied by the connection pool (ms).
    pub request_timeout_ms: u64,
    /// Timeout handed to the transport for each individual attempt (ms).
    pub attempt_timeout_ms: Option<u64>,
    /// User agent string.
    pub user_agent: String,
    /// Maximum idle connections per host.
    pub pool_max_idle_per_host: usize,
    /// Enable gzip decompression.
    pub gzip: bool,
    /// Headers sent with every request unless the request overrides them.
    pub default_headers: BTreeMap<String, String>,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            connect_timeout_ms: 10_000,
            request_timeout_ms: 30_000,
            attempt_timeout_ms: None,
            user_agent: format!("courier/{}", env!("CARGO_PKG_VERSION")),
            pool_max_idle_per_host: 10,
            gzip: true,
            default_headers: BTreeMap::new(),
        }
    }
}

impl TransportSettings {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn attempt_timeout(&self) -> Option<Duration> {
        self.attempt_timeout_ms.map(Duration::from_millis)
    }
}

/// Retry strategy kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryKind {
    /// Same delay between every attempt.
    Constant,
    /// Delay grows with the attempt index.
    #[default]
    Exponential,
}

/// Retry settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub strategy: RetryKind,
    /// Total attempts, including the first one. Must be at least 1.
    pub max_attempts: u32,
    /// Constant delay, or base delay for the exponential strategy (ms).
    pub delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            strategy: RetryKind::Exponential,
            max_attempts: 1,
            delay_ms: 2_000,
        }
    }
}

impl RetrySettings {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}
