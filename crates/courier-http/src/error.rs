//! Error taxonomy for the HTTP client.
//!
//! Callers usually need to tell three situations apart: no response at all
//! ([`HttpError::Transport`]), a response that failed validation
//! ([`HttpError::Status`] or [`HttpError::Rejected`]), and a response that
//! could not be decoded ([`HttpError::Decode`]).

use crate::transport::{ResponseMeta, TransportError};
use bytes::Bytes;

/// Boxed error used for codec failures and caller-supplied rejections.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// HTTP client errors.
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    #[error("invalid URL {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("invalid header {name:?}")]
    InvalidHeader { name: String },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error("invalid retry configuration: {message}")]
    InvalidRetryConfiguration { message: String },

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("unexpected status {}", code.map(|c| c.to_string()).unwrap_or_else(|| "<none>".to_string()))]
    Status {
        code: Option<u16>,
        meta: ResponseMeta,
        body: Option<Bytes>,
    },

    #[error("response rejected: {0}")]
    Rejected(#[source] BoxError),

    #[error("failed to encode request body: {0}")]
    Encode(#[source] BoxError),

    #[error("failed to decode response body: {0}")]
    Decode(#[source] BoxError),
}

impl HttpError {
    /// No response was obtained.
    pub fn is_transport(&self) -> bool {
        matches!(self, HttpError::Transport(_))
    }

    /// A response arrived but a status rule rejected it.
    pub fn is_status(&self) -> bool {
        matches!(self, HttpError::Status { .. } | HttpError::Rejected(_))
    }

    /// A response arrived but its body could not be decoded.
    pub fn is_decode(&self) -> bool {
        matches!(self, HttpError::Decode(_))
    }

    /// Status code of the rejected response, if this is a [`HttpError::Status`].
    pub fn status_code(&self) -> Option<u16> {
        match self {
            HttpError::Status { code, .. } => *code,
            _ => None,
        }
    }

    /// The caller's own error, when a check rule produced one of type `E`.
    pub fn rejection<E>(&self) -> Option<&E>
    where
        E: std::error::Error + 'static,
    {
        match self {
            HttpError::Rejected(inner) => inner.downcast_ref::<E>(),
            _ => None,
        }
    }
}
