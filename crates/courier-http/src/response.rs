//! Typed response envelope.

use crate::request::PreparedRequest;
use crate::transport::ResponseMeta;
use bytes::Bytes;

/// A decoded response together with what produced it.
#[derive(Debug, Clone)]
pub struct Response<T> {
    /// Decoded body.
    pub value: T,
    /// Raw body bytes.
    pub data: Bytes,
    /// Status and headers.
    pub meta: ResponseMeta,
    /// The request that was sent.
    pub request: PreparedRequest,
}

impl<T> Response<T> {
    pub(crate) fn new(value: T, data: Bytes, meta: ResponseMeta, request: PreparedRequest) -> Self {
        Self {
            value,
            data,
            meta,
            request,
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        self.meta.status
    }

    /// Raw body as text, lossily decoded.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.data).into_owned()
    }

    /// Take the decoded value.
    pub fn into_value(self) -> T {
        self.value
    }

    /// Transform the decoded value, keeping the rest.
    pub fn map<U, F>(self, f: F) -> Response<U>
    where
        F: FnOnce(T) -> U,
    {
        Response {
            value: f(self.value),
            data: self.data,
            meta: self.meta,
            request: self.request,
        }
    }
}
