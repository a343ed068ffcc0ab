//! Application routes.

use axum::http::Method;

use crate::codec::DataPayload;
use crate::routing::Router;

/// Describe a received payload.
pub fn describe(payload: DataPayload) -> String {
    format!(
        "Received number {} and boolean {}",
        payload.number, payload.boolean
    )
}

/// The default application: `POST /data` with a [`DataPayload`] body.
pub fn app_routes() -> Router {
    Router::new().json_route("data", Method::POST, "/data", describe)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describe_mentions_both_fields() {
        let text = describe(DataPayload::new(5, true));
        assert!(text.contains('5'));
        assert!(text.contains("true"));
    }
}
