//! Request identification and buffering.
//!
//! # Responsibilities
//! - Generate a UUID v4 request ID for every request (`x-request-id`)
//! - Buffer the body up to the configured limit
//! - Reduce the HTTP request to the [`IncomingRequest`] the router sees

use std::error::Error as _;

use axum::body::Body;
use axum::http::{HeaderValue, Request};
use http_body_util::LengthLimitError;
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

use crate::routing::IncomingRequest;

pub const X_REQUEST_ID: &str = "x-request-id";

/// Makes a fresh UUID v4 request ID.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidRequestId;

impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// The request ID header value, or `"unknown"`.
pub fn request_id<B>(request: &Request<B>) -> String {
    request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string()
}

#[derive(Debug, thiserror::Error)]
pub enum BodyError {
    #[error("request body exceeds {0} bytes")]
    TooLarge(usize),

    /// The client went away or sent a broken body.
    #[error("failed to read request body: {0}")]
    Read(axum::Error),
}

impl BodyError {
    fn classify(err: axum::Error, limit: usize) -> Self {
        let mut source = err.source();
        while let Some(inner) = source {
            if inner.is::<LengthLimitError>() {
                return BodyError::TooLarge(limit);
            }
            source = inner.source();
        }
        BodyError::Read(err)
    }
}

/// Buffer the body and keep what routing needs.
pub async fn buffer_request(request: Request<Body>, limit: usize) -> Result<IncomingRequest, BodyError> {
    let (parts, body) = request.into_parts();
    let bytes = axum::body::to_bytes(body, limit)
        .await
        .map_err(|e| BodyError::classify(e, limit))?;
    Ok(IncomingRequest::new(parts.method, parts.uri.path(), bytes))
}
