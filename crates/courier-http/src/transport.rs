//! Transport: performs a single request attempt.

use crate::request::PreparedRequest;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::{Client, ClientBuilder};
use std::sync::OnceLock;
use std::time::Duration;

/// Transport-level failures. These are the only failures the retry loop retries.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    #[error("request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connection(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportError::Timeout
        } else {
            TransportError::Request(e)
        }
    }
}

/// Metadata of a received response.
#[derive(Debug, Clone, Default)]
pub struct ResponseMeta {
    /// Numeric status, `None` when the transport does not speak HTTP.
    pub status: Option<u16>,
    pub headers: HeaderMap,
    /// Final URL after redirects.
    pub url: Option<String>,
}

impl ResponseMeta {
    pub fn with_status(status: u16) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// Header value as a string, if present and printable.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Body and metadata of one successful exchange.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub body: Bytes,
    pub meta: ResponseMeta,
}

/// Executes one attempt of a prepared request.
///
/// Implementations must be safe to share between concurrent calls and must
/// not alter the request; the same request is replayed on every retry.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: &PreparedRequest) -> Result<RawResponse, TransportError>;

    /// Headers the transport adds to every request on its own.
    fn default_headers(&self) -> &HeaderMap {
        static EMPTY: OnceLock<HeaderMap> = OnceLock::new();
        EMPTY.get_or_init(HeaderMap::new)
    }
}

/// Connection pool configuration.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// Request timeout.
    pub request_timeout: Duration,
    /// User agent string.
    pub user_agent: String,
    /// Maximum idle connections per host.
    pub pool_max_idle_per_host: usize,
    /// Enable gzip decompression.
    pub gzip: bool,
    /// Headers sent with every request.
    pub default_headers: HeaderMap,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            user_agent: format!("courier/{}", env!("CARGO_PKG_VERSION")),
            pool_max_idle_per_host: 10,
            gzip: true,
            default_headers: HeaderMap::new(),
        }
    }
}

/// Build a configured reqwest client.
pub fn build_client(config: HttpConfig) -> Result<Client, TransportError> {
    ClientBuilder::new()
        .connect_timeout(config.connect_timeout)
        .timeout(config.request_timeout)
        .user_agent(&config.user_agent)
        .pool_max_idle_per_host(config.pool_max_idle_per_host)
        .gzip(config.gzip)
        .default_headers(config.default_headers)
        .build()
        .map_err(TransportError::ClientBuild)
}

/// [`Transport`] backed by a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    inner: Client,
    default_headers: HeaderMap,
}

impl ReqwestTransport {
    /// Create a transport with default config.
    pub fn new() -> Result<Self, TransportError> {
        Self::with_config(HttpConfig::default())
    }

    /// Create a transport with custom config.
    pub fn with_config(config: HttpConfig) -> Result<Self, TransportError> {
        let default_headers = config.default_headers.clone();
        Ok(Self {
            inner: build_client(config)?,
            default_headers,
        })
    }

    /// Wrap an existing client. Its default headers are not visible here.
    pub fn from_client(inner: Client) -> Self {
        Self {
            inner,
            default_headers: HeaderMap::new(),
        }
    }

    /// Get the inner reqwest client.
    pub fn inner(&self) -> &Client {
        &self.inner
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: &PreparedRequest) -> Result<RawResponse, TransportError> {
        let mut builder = self
            .inner
            .request(request.method().into(), request.url())
            .headers(request.headers().clone());

        if let Some(body) = request.body() {
            builder = builder.body(body.clone());
        }
        if let Some(timeout) = request.timeout() {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await?;
        let meta = ResponseMeta {
            status: Some(response.status().as_u16()),
            headers: response.headers().clone(),
            url: Some(response.url().to_string()),
        };
        let body = response.bytes().await?;

        Ok(RawResponse { body, meta })
    }

    fn default_headers(&self) -> &HeaderMap {
        &self.default_headers
    }
}
