//! Protocol-level error responses.
//!
//! Unmatched requests are answered, never dropped:
//! - `NotFound` → 404
//! - `MethodNotAllowed` → 405
//! - `InvalidPayload` → 400 with the decode error as text

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::routing::Rejection;

pub fn status_for(rejection: &Rejection) -> StatusCode {
    match rejection {
        Rejection::NotFound => StatusCode::NOT_FOUND,
        Rejection::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
        Rejection::InvalidPayload(_) => StatusCode::BAD_REQUEST,
    }
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        (status_for(&self), self.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::DecodeError;

    #[test]
    fn maps_rejections_to_statuses() {
        assert_eq!(status_for(&Rejection::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(status_for(&Rejection::MethodNotAllowed), StatusCode::METHOD_NOT_ALLOWED);
        let payload = Rejection::InvalidPayload(DecodeError::MissingField("number".into()));
        assert_eq!(payload.into_response().status(), StatusCode::BAD_REQUEST);
    }
}
