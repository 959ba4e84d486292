//! Request preparation: URL resolution, query encoding, headers and body.
//!
//! Everything here is pure. A [`PreparedRequest`] is immutable once built and
//! can be handed to the transport any number of times; its body is a
//! reference-counted [`Bytes`] so every retry resends the same payload.

use crate::error::HttpError;
use crate::method::HttpMethod;
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use std::collections::HashMap;
use std::time::Duration;
use url::{form_urlencoded, Url};

/// Common HTTP header values.
pub mod headers {
    pub const CONTENT_TYPE_JSON: &str = "application/json";
}

/// Ordered query items. Keys may repeat; a `None` value encodes as a bare key.
pub type Query = Vec<(String, Option<String>)>;

/// Caller-supplied header fields.
pub type Headers = HashMap<String, String>;

/// A fully resolved request, independent of any transport.
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    base: Option<String>,
    url: String,
    method: HttpMethod,
    headers: HeaderMap,
    body: Option<Bytes>,
    timeout: Option<Duration>,
}

impl PreparedRequest {
    /// Base location the path was resolved against, if any.
    pub fn base(&self) -> Option<&str> {
        self.base.as_deref()
    }

    /// Absolute URL including the query string.
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Timeout the transport applies to each attempt.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Header value as a string, if present and printable.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Builds a [`PreparedRequest`].
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    base: Option<String>,
    path: String,
    method: HttpMethod,
    query: Query,
    headers: Vec<(String, String)>,
    body: Option<Bytes>,
    timeout: Option<Duration>,
    default_content_type: String,
    transport_headers: HeaderMap,
}

impl RequestBuilder {
    /// Start a request for `path`. Without a base URL the path must be absolute.
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            base: None,
            path: path.into(),
            method,
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
            timeout: None,
            default_content_type: headers::CONTENT_TYPE_JSON.to_string(),
            transport_headers: HeaderMap::new(),
        }
    }

    /// Set the base URL the path is resolved against.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base = Some(url.into());
        self
    }

    /// Append one query item.
    pub fn query_pair(mut self, key: impl Into<String>, value: Option<impl Into<String>>) -> Self {
        self.query.push((key.into(), value.map(Into::into)));
        self
    }

    /// Append query items, keeping their order.
    pub fn query(mut self, query: &[(String, Option<String>)]) -> Self {
        self.query.extend_from_slice(query);
        self
    }

    /// Add a header. Later values for the same name win.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Add every header in `headers`.
    pub fn headers(mut self, headers: &Headers) -> Self {
        self.headers
            .extend(headers.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    /// Add bearer token authorization.
    pub fn bearer_auth(self, token: impl AsRef<str>) -> Self {
        let value = format!("Bearer {}", token.as_ref());
        self.header(AUTHORIZATION.as_str(), value)
    }

    /// Set an already encoded body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Content type attached to a body when no `Content-Type` is set anywhere.
    pub fn default_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.default_content_type = content_type.into();
        self
    }

    /// Headers the transport adds to every request. Only consulted to decide
    /// whether a default `Content-Type` is needed.
    pub fn transport_headers(mut self, headers: &HeaderMap) -> Self {
        self.transport_headers = headers.clone();
        self
    }

    /// Resolve the URL and assemble the request.
    pub fn build(self) -> Result<PreparedRequest, HttpError> {
        let url = match &self.base {
            Some(base) => build_url(base, &self.path)?,
            None => parse_url(&self.path)?.into(),
        };
        let url = append_query(&url, &self.query)?;

        let mut header_map = HeaderMap::with_capacity(self.headers.len() + 1);
        for (name, value) in &self.headers {
            let invalid = || HttpError::InvalidHeader { name: name.clone() };
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid())?;
            let value = HeaderValue::from_str(value).map_err(|_| invalid())?;
            header_map.insert(name, value);
        }

        if self.body.is_some()
            && !header_map.contains_key(CONTENT_TYPE)
            && !self.transport_headers.contains_key(CONTENT_TYPE)
        {
            let value = HeaderValue::from_str(&self.default_content_type).map_err(|_| {
                HttpError::InvalidHeader {
                    name: CONTENT_TYPE.to_string(),
                }
            })?;
            header_map.insert(CONTENT_TYPE, value);
        }

        Ok(PreparedRequest {
            base: self.base,
            url,
            method: self.method,
            headers: header_map,
            body: self.body,
            timeout: self.timeout,
        })
    }
}

/// Build a request against `base` with the JSON default content type.
pub fn build_request(
    base: &str,
    path: &str,
    method: HttpMethod,
    query: &[(String, Option<String>)],
    headers: &Headers,
    body: Option<Bytes>,
) -> Result<PreparedRequest, HttpError> {
    let mut builder = RequestBuilder::new(method, path)
        .base_url(base)
        .query(query)
        .headers(headers);
    if let Some(body) = body {
        builder = builder.body(body);
    }
    builder.build()
}

fn parse_url(url: &str) -> Result<Url, HttpError> {
    Url::parse(url).map_err(|source| HttpError::InvalidUrl {
        url: url.to_string(),
        source,
    })
}

/// Resolve `path` against `base` using standard relative-reference rules.
///
/// An empty path leaves the base text as given, so no `/` is added.
pub fn build_url(base: &str, path: &str) -> Result<String, HttpError> {
    if path.is_empty() {
        parse_url(base)?;
        return Ok(base.to_string());
    }
    let base = parse_url(base)?;
    let url = base.join(path).map_err(|source| HttpError::InvalidUrl {
        url: path.to_string(),
        source,
    })?;
    Ok(url.into())
}

/// Append `query` to `url`, after any query it already carries.
///
/// The URL text is otherwise left as given, so `http://localhost:3000`
/// becomes `http://localhost:3000?user=Name` rather than gaining a `/`.
pub fn append_query(url: &str, query: &[(String, Option<String>)]) -> Result<String, HttpError> {
    parse_url(url)?;
    if query.is_empty() {
        return Ok(url.to_string());
    }

    let mut encoded = form_urlencoded::Serializer::new(String::new());
    for (key, value) in query {
        match value {
            Some(value) => encoded.append_pair(key, value),
            None => encoded.append_key_only(key),
        };
    }
    let encoded = encoded.finish();

    let (head, fragment) = match url.split_once('#') {
        Some((head, fragment)) => (head, Some(fragment)),
        None => (url, None),
    };
    let separator = match head.find('?') {
        None => "?",
        Some(_) if head.ends_with('?') || head.ends_with('&') => "",
        Some(_) => "&",
    };

    let mut out = format!("{head}{separator}{encoded}");
    if let Some(fragment) = fragment {
        out.push('#');
        out.push_str(fragment);
    }
    Ok(out)
}
