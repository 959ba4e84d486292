//! Client configuration shared by every call.

use crate::codec::{Codec, JsonCodec};
use crate::error::HttpError;
use crate::retry::RetryStrategy;
use crate::transport::{HttpConfig, ReqwestTransport, Transport};
use crate::validate::StatusRule;
use courier_common_config::{ClientSettings, TransportSettings, DEFAULT_CONTENT_TYPE};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Immutable configuration a [`Proxy`](crate::Proxy) is built from.
#[derive(Clone)]
pub struct Configuration<C: Codec = JsonCodec> {
    base_url: String,
    transport: Arc<dyn Transport>,
    codec: C,
    default_content_type: String,
    retry: RetryStrategy,
    rules: Vec<StatusRule>,
    attempt_timeout: Option<Duration>,
}

impl Configuration<JsonCodec> {
    /// JSON configuration over `transport`, single attempt, accepting 200.
    pub fn new(base_url: impl Into<String>, transport: Arc<dyn Transport>) -> Self {
        Self {
            base_url: base_url.into(),
            transport,
            codec: JsonCodec,
            default_content_type: DEFAULT_CONTENT_TYPE.to_string(),
            retry: RetryStrategy::none(),
            rules: vec![StatusRule::default()],
            attempt_timeout: None,
        }
    }

    /// Build a reqwest-backed JSON configuration from loaded settings.
    pub fn from_settings(settings: &ClientSettings) -> Result<Self, HttpError> {
        let base_url = settings
            .base_url
            .clone()
            .ok_or_else(|| HttpError::InvalidConfiguration {
                message: "base_url is not set".to_string(),
            })?;

        let transport = ReqwestTransport::with_config(http_config(&settings.transport)?)?;

        let mut config = Self::new(base_url, Arc::new(transport))
            .with_default_content_type(settings.default_content_type.clone())
            .with_retry(RetryStrategy::from(&settings.retry))
            .with_attempt_timeout(settings.transport.attempt_timeout());

        if let Some(codes) = &settings.accept_status {
            config.rules = codes.iter().copied().map(StatusRule::from).collect();
        }
        Ok(config)
    }
}

impl<C: Codec> Configuration<C> {
    /// Swap the codec, keeping everything else.
    pub fn with_codec<D: Codec>(self, codec: D) -> Configuration<D> {
        Configuration {
            base_url: self.base_url,
            transport: self.transport,
            default_content_type: codec.content_type().to_string(),
            codec,
            retry: self.retry,
            rules: self.rules,
            attempt_timeout: self.attempt_timeout,
        }
    }

    pub fn with_default_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.default_content_type = content_type.into();
        self
    }

    /// Retry strategy for calls that do not pick their own.
    pub fn with_retry(mut self, retry: RetryStrategy) -> Self {
        self.retry = retry;
        self
    }

    /// Status rules for calls that do not pick their own.
    pub fn with_rules(mut self, rules: Vec<StatusRule>) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_attempt_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.attempt_timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    pub fn default_content_type(&self) -> &str {
        &self.default_content_type
    }

    pub fn retry(&self) -> &RetryStrategy {
        &self.retry
    }

    pub fn rules(&self) -> &[StatusRule] {
        &self.rules
    }

    pub fn attempt_timeout(&self) -> Option<Duration> {
        self.attempt_timeout
    }
}

impl<C: Codec> fmt::Debug for Configuration<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Configuration")
            .field("base_url", &self.base_url)
            .field("default_content_type", &self.default_content_type)
            .field("retry", &self.retry)
            .field("rules", &self.rules)
            .field("attempt_timeout", &self.attempt_timeout)
            .finish_non_exhaustive()
    }
}

/// Convert transport settings into the reqwest client configuration.
pub fn http_config(settings: &TransportSettings) -> Result<HttpConfig, HttpError> {
    let mut default_headers = HeaderMap::with_capacity(settings.default_headers.len());
    for (name, value) in &settings.default_headers {
        let invalid = || HttpError::InvalidHeader { name: name.clone() };
        let header = HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid())?;
        let value = HeaderValue::from_str(value).map_err(|_| invalid())?;
        default_headers.insert(header, value);
    }

    Ok(HttpConfig {
        connect_timeout: settings.connect_timeout(),
        request_timeout: settings.request_timeout(),
        user_agent: settings.user_agent.clone(),
        pool_max_idle_per_host: settings.pool_max_idle_per_host,
        gzip: settings.gzip,
        default_headers,
    })
}
