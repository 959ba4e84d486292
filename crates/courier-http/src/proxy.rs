//! Client facade: build, send with retry, validate, decode.

use crate::codec::{Codec, JsonCodec};
use crate::config::Configuration;
use crate::error::{BoxError, HttpError};
use crate::method::HttpMethod;
use crate::options::RequestOptions;
use crate::request::{PreparedRequest, RequestBuilder};
use crate::response::Response;
use crate::retry::{execute_with_retry, RetryStrategy};
use crate::validate::{validate_status, StatusRule};
use bytes::Bytes;
use courier_common_log::spans;
use serde::{de::DeserializeOwned, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Typed HTTP client over a shared, immutable [`Configuration`].
///
/// Cloning is cheap and clones share the configuration, so one proxy can
/// serve any number of concurrent calls.
pub struct Proxy<C: Codec = JsonCodec> {
    config: Arc<Configuration<C>>,
}

impl<C: Codec> Clone for Proxy<C> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
        }
    }
}

impl<C: Codec> fmt::Debug for Proxy<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Proxy").field("config", &self.config).finish()
    }
}

impl<C: Codec> Proxy<C> {
    pub fn new(config: Configuration<C>) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &Configuration<C> {
        &self.config
    }

    /// Build a request against the configured base URL.
    pub fn prepare(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<Bytes>,
        options: &RequestOptions,
    ) -> Result<PreparedRequest, HttpError> {
        let mut builder = RequestBuilder::new(method, path)
            .base_url(self.config.base_url())
            .query(&options.query)
            .headers(&options.headers)
            .timeout(options.timeout.or(self.config.attempt_timeout()))
            .default_content_type(self.config.default_content_type())
            .transport_headers(self.config.transport().default_headers());
        if let Some(body) = body {
            builder = builder.body(body);
        }
        builder.build()
    }

    /// Send a prepared request, retrying transport failures per `strategy`,
    /// then validate against `rules` and decode the body.
    ///
    /// Status and decode failures are never retried.
    pub async fn send<T>(
        &self,
        request: PreparedRequest,
        strategy: &RetryStrategy,
        rules: &[StatusRule],
    ) -> Result<Response<T>, HttpError>
    where
        T: DeserializeOwned,
    {
        let codec = self.config.codec();
        self.dispatch(request, strategy, rules, |bytes| codec.decode(bytes))
            .await
    }

    async fn dispatch<T, F>(
        &self,
        request: PreparedRequest,
        strategy: &RetryStrategy,
        rules: &[StatusRule],
        decode: F,
    ) -> Result<Response<T>, HttpError>
    where
        F: FnOnce(&[u8]) -> Result<T, BoxError>,
    {
        let span = spans::request_span(request.method().as_str(), request.url());
        let timer = spans::Timer::start("http.request");
        let result = spans::instrument_future(
            self.exchange(request, strategy, rules, decode),
            span.clone(),
        )
        .await;

        span.in_scope(|| {
            timer.finish();
            if let Err(error) = &result {
                spans::record_error(error);
            }
        });
        result
    }

    async fn exchange<T, F>(
        &self,
        request: PreparedRequest,
        strategy: &RetryStrategy,
        rules: &[StatusRule],
        decode: F,
    ) -> Result<Response<T>, HttpError>
    where
        F: FnOnce(&[u8]) -> Result<T, BoxError>,
    {
        let transport = self.config.transport().as_ref();
        let raw = execute_with_retry(transport, &request, strategy).await?;

        if let Err(error) = validate_status(&raw.meta, Some(&raw.body), rules) {
            debug!(status = ?raw.meta.status, error = %error, "response rejected");
            return Err(error);
        }

        let value = decode(&raw.body).map_err(HttpError::Decode)?;
        Ok(Response::new(value, raw.body, raw.meta, request))
    }

    /// Build and send a request whose body, if any, is already encoded.
    pub async fn request<T>(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<Bytes>,
        options: RequestOptions,
    ) -> Result<Response<T>, HttpError>
    where
        T: DeserializeOwned,
    {
        let request = self.prepare(method, path, body, &options)?;
        let strategy = options.retry.unwrap_or(*self.config.retry());
        let rules = options.rules.as_deref().unwrap_or(self.config.rules());
        self.send(request, &strategy, rules).await
    }

    pub async fn get<T>(&self, path: &str, options: RequestOptions) -> Result<Response<T>, HttpError>
    where
        T: DeserializeOwned,
    {
        self.request(HttpMethod::Get, path, None, options).await
    }

    pub async fn delete<T>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<Response<T>, HttpError>
    where
        T: DeserializeOwned,
    {
        self.request(HttpMethod::Delete, path, None, options).await
    }

    /// HEAD request. The empty body is not decoded.
    pub async fn head(&self, path: &str, options: RequestOptions) -> Result<Response<()>, HttpError> {
        let request = self.prepare(HttpMethod::Head, path, None, &options)?;
        let strategy = options.retry.unwrap_or(*self.config.retry());
        let rules = options.rules.as_deref().unwrap_or(self.config.rules());
        self.dispatch(request, &strategy, rules, |_| Ok(())).await
    }

    pub async fn post<B, T>(
        &self,
        path: &str,
        body: &B,
        options: RequestOptions,
    ) -> Result<Response<T>, HttpError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.with_body(HttpMethod::Post, path, body, options).await
    }

    pub async fn put<B, T>(
        &self,
        path: &str,
        body: &B,
        options: RequestOptions,
    ) -> Result<Response<T>, HttpError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.with_body(HttpMethod::Put, path, body, options).await
    }

    pub async fn patch<B, T>(
        &self,
        path: &str,
        body: &B,
        options: RequestOptions,
    ) -> Result<Response<T>, HttpError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.with_body(HttpMethod::Patch, path, body, options).await
    }

    // Encoding happens before the request is built, so an encode failure
    // never reaches the transport.
    async fn with_body<B, T>(
        &self,
        method: HttpMethod,
        path: &str,
        body: &B,
        options: RequestOptions,
    ) -> Result<Response<T>, HttpError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let bytes = self.config.codec().encode(body).map_err(HttpError::Encode)?;
        self.request(method, path, Some(bytes), options).await
    }
}
