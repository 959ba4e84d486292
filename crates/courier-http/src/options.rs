//! Per-call options.

use crate::request::{Headers, Query};
use crate::retry::RetryStrategy;
use crate::validate::StatusRule;
use std::time::Duration;

/// Options for one call. Unset fields fall back to the configuration.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub query: Query,
    pub headers: Headers,
    pub retry: Option<RetryStrategy>,
    pub rules: Option<Vec<StatusRule>>,
    pub timeout: Option<Duration>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a `key=value` query item.
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), Some(value.into())));
        self
    }

    /// Append a query item without a value.
    pub fn query_key(mut self, key: impl Into<String>) -> Self {
        self.query.push((key.into(), None));
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn retry(mut self, retry: RetryStrategy) -> Self {
        self.retry = Some(retry);
        self
    }

    /// Add one status rule, replacing the configured defaults.
    pub fn rule(mut self, rule: impl Into<StatusRule>) -> Self {
        self.rules.get_or_insert_with(Vec::new).push(rule.into());
        self
    }

    /// Replace the configured status rules.
    pub fn rules(mut self, rules: Vec<StatusRule>) -> Self {
        self.rules = Some(rules);
        self
    }

    /// Timeout for each attempt.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}
