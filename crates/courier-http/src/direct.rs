//! Calls against absolute URLs, returning raw bodies.

use crate::error::HttpError;
use crate::method::HttpMethod;
use crate::options::RequestOptions;
use crate::request::RequestBuilder;
use crate::retry::{execute_with_retry, RetryStrategy};
use crate::transport::{RawResponse, Transport};
use crate::validate::validate_status;
use bytes::Bytes;
use courier_common_log::spans;
use std::sync::Arc;

/// Proxy-less client: no base URL and no codec.
///
/// Retries follow `options.retry` (a single attempt when unset). Status
/// rules are checked only when `options.rules` is set.
#[derive(Clone)]
pub struct Direct {
    transport: Arc<dyn Transport>,
}

impl Direct {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    pub async fn get(
        &self,
        url: &str,
        body: Option<Bytes>,
        options: RequestOptions,
    ) -> Result<RawResponse, HttpError> {
        self.call(HttpMethod::Get, url, body, options).await
    }

    pub async fn post(
        &self,
        url: &str,
        body: Option<Bytes>,
        options: RequestOptions,
    ) -> Result<RawResponse, HttpError> {
        self.call(HttpMethod::Post, url, body, options).await
    }

    pub async fn put(
        &self,
        url: &str,
        body: Option<Bytes>,
        options: RequestOptions,
    ) -> Result<RawResponse, HttpError> {
        self.call(HttpMethod::Put, url, body, options).await
    }

    pub async fn delete(
        &self,
        url: &str,
        body: Option<Bytes>,
        options: RequestOptions,
    ) -> Result<RawResponse, HttpError> {
        self.call(HttpMethod::Delete, url, body, options).await
    }

    async fn call(
        &self,
        method: HttpMethod,
        url: &str,
        body: Option<Bytes>,
        options: RequestOptions,
    ) -> Result<RawResponse, HttpError> {
        let mut builder = RequestBuilder::new(method, url)
            .query(&options.query)
            .headers(&options.headers)
            .timeout(options.timeout)
            .transport_headers(self.transport.default_headers());
        if let Some(body) = body {
            builder = builder.body(body);
        }
        let request = builder.build()?;
        let strategy = options.retry.unwrap_or_else(RetryStrategy::none);

        let span = spans::request_span(method.as_str(), request.url());
        let raw = spans::instrument_future(
            execute_with_retry(self.transport.as_ref(), &request, &strategy),
            span,
        )
        .await?;

        if let Some(rules) = &options.rules {
            validate_status(&raw.meta, Some(&raw.body), rules)?;
        }
        Ok(raw)
    }
}

impl std::fmt::Debug for Direct {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Direct").finish_non_exhaustive()
    }
}
