//! Typed HTTP client for courier.
//!
//! A [`Proxy`] resolves paths against a base URL, sends the request through a
//! shared [`Transport`] under a [`RetryStrategy`], checks the response with
//! [`StatusRule`]s and decodes the body with a [`Codec`].

pub mod codec;
pub mod config;
pub mod direct;
pub mod error;
pub mod method;
pub mod options;
pub mod proxy;
pub mod request;
pub mod response;
pub mod retry;
pub mod transport;
pub mod validate;

pub use codec::{Codec, JsonCodec};
pub use config::{http_config, Configuration};
pub use direct::Direct;
pub use error::{BoxError, HttpError};
pub use method::HttpMethod;
pub use options::RequestOptions;
pub use proxy::Proxy;
pub use request::{append_query, build_request, build_url, headers, PreparedRequest, RequestBuilder};
pub use response::Response;
pub use retry::{execute_with_retry, Delays, RetryStrategy};
pub use transport::{
    build_client, HttpConfig, RawResponse, ReqwestTransport, ResponseMeta, Transport, TransportError,
};
pub use validate::{validate_status, StatusRule};
