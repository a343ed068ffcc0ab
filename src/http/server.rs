//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with a single catch-all handler
//! - Wire up middleware (tracing, timeout, request ID)
//! - Buffer bodies and hand them to the protocol router
//! - Serve until shutdown, then finish in-flight requests

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::HttpConfig;
use crate::http::request::{buffer_request, request_id, BodyError, UuidRequestId};
use crate::http::response::status_for;
use crate::lifecycle::shutdown::ShutdownListener;
use crate::net::NetError;
use crate::observability::metrics;
use crate::routing::Router as ProtocolRouter;

/// Application state injected into the handler.
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<ProtocolRouter>,
    pub body_limit: usize,
}

/// HTTP front end for a protocol router.
pub struct HttpServer {
    app: Router,
    config: HttpConfig,
}

impl HttpServer {
    pub fn new(config: HttpConfig, routes: ProtocolRouter) -> Self {
        let state = AppState {
            router: Arc::new(routes),
            body_limit: config.body_limit_bytes,
        };
        let app = Self::build_router(&config, state);
        Self { app, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &HttpConfig, state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(dispatch_handler))
            .route("/", any(dispatch_handler))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
            .layer(TraceLayer::new_for_http())
    }

    /// The fully layered service, for in-process requests.
    pub fn app(&self) -> Router {
        self.app.clone()
    }

    pub fn config(&self) -> &HttpConfig {
        &self.config
    }

    /// Bind the configured address.
    pub async fn bind(&self) -> Result<TcpListener, NetError> {
        TcpListener::bind(&self.config.bind_address)
            .await
            .map_err(|e| NetError::bind(&self.config.bind_address, e))
    }

    /// Serve on `listener` until shutdown is triggered.
    pub async fn run(self, listener: TcpListener, mut shutdown: ShutdownListener) -> Result<(), NetError> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.app)
            .with_graceful_shutdown(async move { shutdown.recv().await })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Buffer the body, dispatch, and answer with the reply or rejection.
async fn dispatch_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let request_id = request_id(&request);

    let incoming = match buffer_request(request, state.body_limit).await {
        Ok(incoming) => incoming,
        Err(e) => {
            let status = match e {
                BodyError::TooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
                BodyError::Read(_) => StatusCode::BAD_REQUEST,
            };
            tracing::warn!(request_id = %request_id, error = %e, status = status.as_u16(), "Body rejected");
            metrics::record_request("none", status.as_u16(), start);
            return (status, e.to_string()).into_response();
        }
    };

    tracing::debug!(
        request_id = %request_id,
        method = %incoming.method(),
        path = %incoming.path(),
        "Dispatching request"
    );

    match state.router.dispatch(&incoming) {
        Ok(reply) => {
            metrics::record_request(&reply.route, StatusCode::OK.as_u16(), start);
            (StatusCode::OK, reply.body).into_response()
        }
        Err(rejection) => {
            let status = status_for(&rejection);
            tracing::warn!(
                request_id = %request_id,
                path = %incoming.path(),
                status = status.as_u16(),
                rejection = %rejection,
                "Request rejected"
            );
            metrics::record_request("none", status.as_u16(), start);
            rejection.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::handlers::app_routes;
    use tower::ServiceExt;

    #[tokio::test]
    async fn oversized_body_gets_413() {
        let config = HttpConfig {
            body_limit_bytes: 8,
            ..HttpConfig::default()
        };
        let server = HttpServer::new(config, app_routes());
        let request = Request::post("/data")
            .body(Body::from(r#"{"number":5,"boolean":true}"#))
            .unwrap();
        let response = server.app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn broken_body_gets_400() {
        let server = HttpServer::new(HttpConfig::default(), app_routes());
        let chunks: Vec<Result<&'static str, std::io::Error>> =
            vec![Ok("{\"number\":5"), Err(std::io::Error::other("connection reset"))];
        let request = Request::post("/data")
            .body(Body::from_stream(futures_util::stream::iter(chunks)))
            .unwrap();
        let response = server.app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn root_is_routed_through_dispatch() {
        let server = HttpServer::new(HttpConfig::default(), app_routes());
        let response = server
            .app()
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
