//! Status validation rules.
//!
//! Rules run in order and stop at the first failure. `Exact`, `Range` and
//! `Predicate` reject a response that carries no numeric status; `Check`
//! receives `None` and decides for itself.

use crate::error::{BoxError, HttpError};
use crate::transport::ResponseMeta;
use bytes::Bytes;
use std::fmt;
use std::ops::Range;
use std::sync::Arc;

/// Predicate over a status code.
pub type StatusPredicate = Arc<dyn Fn(u16) -> bool + Send + Sync>;

/// Check over the whole response. Returning `Some` rejects it with that error.
pub type StatusCheck =
    Arc<dyn Fn(Option<u16>, &ResponseMeta, Option<&[u8]>) -> Option<BoxError> + Send + Sync>;

/// One rule a response status must satisfy.
#[derive(Clone)]
pub enum StatusRule {
    /// Status equals the code.
    Exact(u16),
    /// Status lies in `low..high`.
    Range(u16, u16),
    /// Status satisfies the predicate.
    Predicate(StatusPredicate),
    /// Arbitrary check that may supply its own error.
    Check(StatusCheck),
}

impl StatusRule {
    /// Any 2xx status.
    pub fn success() -> Self {
        StatusRule::Range(200, 300)
    }

    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(u16) -> bool + Send + Sync + 'static,
    {
        StatusRule::Predicate(Arc::new(f))
    }

    pub fn check<F>(f: F) -> Self
    where
        F: Fn(Option<u16>, &ResponseMeta, Option<&[u8]>) -> Option<BoxError> + Send + Sync + 'static,
    {
        StatusRule::Check(Arc::new(f))
    }

    /// Validate one response against this rule.
    pub fn validate(&self, meta: &ResponseMeta, body: Option<&Bytes>) -> Result<(), HttpError> {
        let code = meta.status;
        let accepted = match self {
            StatusRule::Exact(expected) => code == Some(*expected),
            StatusRule::Range(low, high) => code.is_some_and(|c| (*low..*high).contains(&c)),
            StatusRule::Predicate(f) => code.is_some_and(|c| f(c)),
            StatusRule::Check(f) => {
                return match f(code, meta, body.map(|b| &b[..])) {
                    Some(error) => Err(HttpError::Rejected(error)),
                    None => Ok(()),
                };
            }
        };

        if accepted {
            Ok(())
        } else {
            Err(HttpError::Status {
                code,
                meta: meta.clone(),
                body: body.cloned(),
            })
        }
    }
}

impl Default for StatusRule {
    fn default() -> Self {
        StatusRule::Exact(200)
    }
}

impl From<u16> for StatusRule {
    fn from(code: u16) -> Self {
        StatusRule::Exact(code)
    }
}

impl From<Range<u16>> for StatusRule {
    fn from(range: Range<u16>) -> Self {
        StatusRule::Range(range.start, range.end)
    }
}

impl fmt::Debug for StatusRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusRule::Exact(code) => f.debug_tuple("Exact").field(code).finish(),
            StatusRule::Range(low, high) => f.debug_tuple("Range").field(low).field(high).finish(),
            StatusRule::Predicate(_) => f.write_str("Predicate(..)"),
            StatusRule::Check(_) => f.write_str("Check(..)"),
        }
    }
}

/// Validate a response against `rules`, stopping at the first failure.
pub fn validate_status(
    meta: &ResponseMeta,
    body: Option<&Bytes>,
    rules: &[StatusRule],
) -> Result<(), HttpError> {
    rules.iter().try_for_each(|rule| rule.validate(meta, body))
}
