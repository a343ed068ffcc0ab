//! Request matching predicates.
//!
//! # Responsibilities
//! - Match request path (exact, case-sensitive)
//! - Match request method
//! - Match body decodability into a typed payload
//! - Combine conditions with AND semantics
//!
//! # Design Decisions
//! - Each predicate is testable on its own
//! - A failing predicate explains itself with a [`Rejection`]
//! - `AndMatcher` evaluates in composition order and stops at the first
//!   failure, so cheap checks (path, method) go before decoding

use std::fmt;
use std::marker::PhantomData;

use axum::body::Bytes;
use axum::http::Method;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::codec::{decode_bytes, DecodeError};

/// A request as seen by matchers and handlers: method, path and the
/// fully buffered body.
#[derive(Debug, Clone)]
pub struct IncomingRequest {
    method: Method,
    path: String,
    body: Bytes,
}

impl IncomingRequest {
    pub fn new(method: Method, path: impl Into<String>, body: impl Into<Bytes>) -> Self {
        Self {
            method,
            path: path.into(),
            body: body.into(),
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }
}

/// Why a request was not accepted (protocol mismatch).
///
/// Variants are ordered from least to most specific; the router reports
/// the most specific one seen across all routes.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Error)]
pub enum Rejection {
    #[error("no route for this path")]
    NotFound,

    #[error("method not allowed")]
    MethodNotAllowed,

    #[error("invalid payload: {0}")]
    InvalidPayload(DecodeError),
}

/// Trait for matching requests against conditions.
pub trait Matcher: Send + Sync + fmt::Debug {
    /// `Ok(())` if the request satisfies this condition.
    fn check(&self, req: &IncomingRequest) -> Result<(), Rejection>;

    /// Returns true if the request matches this condition.
    fn matches(&self, req: &IncomingRequest) -> bool {
        self.check(req).is_ok()
    }

    /// Require both `self` and `other`, `self` checked first.
    fn and<M>(self, other: M) -> AndMatcher
    where
        Self: Sized + 'static,
        M: Matcher + 'static,
    {
        AndMatcher::new(vec![Box::new(self), Box::new(other)])
    }
}

/// Matches the request path exactly.
#[derive(Debug, Clone)]
pub struct PathMatcher {
    path: String,
}

impl PathMatcher {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

impl Matcher for PathMatcher {
    fn check(&self, req: &IncomingRequest) -> Result<(), Rejection> {
        if req.path() == self.path {
            Ok(())
        } else {
            Err(Rejection::NotFound)
        }
    }
}

/// Matches the request method.
#[derive(Debug, Clone)]
pub struct MethodMatcher {
    method: Method,
}

impl MethodMatcher {
    pub fn new(method: Method) -> Self {
        Self { method }
    }
}

impl Matcher for MethodMatcher {
    fn check(&self, req: &IncomingRequest) -> Result<(), Rejection> {
        if *req.method() == self.method {
            Ok(())
        } else {
            Err(Rejection::MethodNotAllowed)
        }
    }
}

/// Matches when the body decodes as JSON into `T`.
pub struct JsonBodyMatcher<T> {
    _payload: PhantomData<fn() -> T>,
}

impl<T> JsonBodyMatcher<T> {
    pub fn new() -> Self {
        Self {
            _payload: PhantomData,
        }
    }
}

impl<T> Default for JsonBodyMatcher<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for JsonBodyMatcher<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonBodyMatcher")
            .field("payload", &std::any::type_name::<T>())
            .finish()
    }
}

impl<T: DeserializeOwned> Matcher for JsonBodyMatcher<T> {
    fn check(&self, req: &IncomingRequest) -> Result<(), Rejection> {
        decode_bytes::<T>(req.body())
            .map(drop)
            .map_err(Rejection::InvalidPayload)
    }
}

/// Combines multiple matchers with AND semantics.
#[derive(Debug)]
pub struct AndMatcher {
    matchers: Vec<Box<dyn Matcher>>,
}

impl AndMatcher {
    pub fn new(matchers: Vec<Box<dyn Matcher>>) -> Self {
        Self { matchers }
    }
}

impl Matcher for AndMatcher {
    fn check(&self, req: &IncomingRequest) -> Result<(), Rejection> {
        self.matchers.iter().try_for_each(|m| m.check(req))
    }
}

/// Exact path predicate.
pub fn path(path: impl Into<String>) -> PathMatcher {
    PathMatcher::new(path)
}

/// Method predicate.
pub fn method(method: Method) -> MethodMatcher {
    MethodMatcher::new(method)
}

/// Body decodability predicate.
pub fn json_body<T: DeserializeOwned>() -> JsonBodyMatcher<T> {
    JsonBodyMatcher::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::DataPayload;

    fn post(path: &str, body: &'static str) -> IncomingRequest {
        IncomingRequest::new(Method::POST, path, body)
    }

    #[test]
    fn test_path_matcher() {
        let matcher = path("/data");
        assert!(matcher.matches(&post("/data", "")));
        assert_eq!(matcher.check(&post("/data/x", "")), Err(Rejection::NotFound));
        assert_eq!(matcher.check(&post("/DATA", "")), Err(Rejection::NotFound));
    }

    #[test]
    fn test_method_matcher() {
        let matcher = method(Method::POST);
        assert!(matcher.matches(&post("/", "")));
        let get = IncomingRequest::new(Method::GET, "/", "");
        assert_eq!(matcher.check(&get), Err(Rejection::MethodNotAllowed));
    }

    #[test]
    fn test_json_body_matcher() {
        let matcher = json_body::<DataPayload>();
        assert!(matcher.matches(&post("/", r#"{"number":1,"boolean":false}"#)));
        assert_eq!(
            matcher.check(&post("/", r#"{"boolean":false}"#)),
            Err(Rejection::InvalidPayload(DecodeError::MissingField("number".into())))
        );
    }

    #[test]
    fn and_reports_first_failure_in_order() {
        let matcher = path("/data")
            .and(method(Method::POST))
            .and(json_body::<DataPayload>());

        // Wrong method and bad body: method is checked first
        let req = IncomingRequest::new(Method::PUT, "/data", "not json");
        assert_eq!(matcher.check(&req), Err(Rejection::MethodNotAllowed));

        let req = post("/data", "not json");
        assert!(matches!(matcher.check(&req), Err(Rejection::InvalidPayload(_))));

        assert!(matcher.matches(&post("/data", r#"{"number":1,"boolean":true}"#)));
    }

    #[test]
    fn rejections_order_by_specificity() {
        let payload = Rejection::InvalidPayload(DecodeError::Malformed("x".into()));
        assert!(Rejection::NotFound < Rejection::MethodNotAllowed);
        assert!(Rejection::MethodNotAllowed < payload);
    }
}
