//! Body encoding and decoding.

use crate::error::BoxError;
use crate::request::headers;
use bytes::Bytes;
use serde::{de::DeserializeOwned, Serialize};

/// Turns typed values into request bodies and response bodies into typed values.
pub trait Codec: Send + Sync {
    /// Content type advertised for bodies this codec produces.
    fn content_type(&self) -> &str;

    /// Encode a value into body bytes.
    fn encode<T>(&self, value: &T) -> Result<Bytes, BoxError>
    where
        T: Serialize + ?Sized;

    /// Decode body bytes into a value.
    fn decode<T>(&self, bytes: &[u8]) -> Result<T, BoxError>
    where
        T: DeserializeOwned;
}

/// JSON codec backed by `serde_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn content_type(&self) -> &str {
        headers::CONTENT_TYPE_JSON
    }

    fn encode<T>(&self, value: &T) -> Result<Bytes, BoxError>
    where
        T: Serialize + ?Sized,
    {
        Ok(Bytes::from(serde_json::to_vec(value)?))
    }

    fn decode<T>(&self, bytes: &[u8]) -> Result<T, BoxError>
    where
        T: DeserializeOwned,
    {
        Ok(serde_json::from_slice(bytes)?)
    }
}
