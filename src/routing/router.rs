//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Store routes in registration order
//! - Run the handler of the first route whose matcher accepts the request
//! - Return an explicit rejection when nothing matches
//!
//! # Design Decisions
//! - First match wins: routes are tried in the order they were added, so
//!   overlapping routes resolve deterministically
//! - Exactly one handler runs per request
//! - Immutable after construction (shared via `Arc`, no locks)

use std::fmt;

use axum::http::Method;
use serde::de::DeserializeOwned;

use crate::codec::decode_bytes;
use crate::routing::matcher::{json_body, method, path, IncomingRequest, Matcher, Rejection};

type Handler = Box<dyn Fn(&IncomingRequest) -> Result<String, Rejection> + Send + Sync>;

/// A matcher paired with the handler it guards.
pub struct Route {
    name: String,
    matcher: Box<dyn Matcher>,
    handler: Handler,
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("name", &self.name)
            .field("matcher", &self.matcher)
            .finish_non_exhaustive()
    }
}

/// Successful dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Name of the route that handled the request.
    pub route: String,
    /// Text response body.
    pub body: String,
}

/// Ordered set of routes.
#[derive(Debug, Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a route. Earlier routes take precedence.
    pub fn route<M, H>(mut self, name: impl Into<String>, matcher: M, handler: H) -> Self
    where
        M: Matcher + 'static,
        H: Fn(&IncomingRequest) -> Result<String, Rejection> + Send + Sync + 'static,
    {
        self.routes.push(Route {
            name: name.into(),
            matcher: Box::new(matcher),
            handler: Box::new(handler),
        });
        self
    }

    /// Append a route for `method path` whose body must decode as `T`.
    ///
    /// The matcher is `path ∧ method ∧ json_body::<T>`; the handler
    /// receives the decoded value.
    pub fn json_route<T, F>(self, name: impl Into<String>, verb: Method, route_path: &str, handler: F) -> Self
    where
        T: DeserializeOwned + 'static,
        F: Fn(T) -> String + Send + Sync + 'static,
    {
        let matcher = path(route_path).and(method(verb)).and(json_body::<T>());
        self.route(name, matcher, move |req: &IncomingRequest| {
            let value = decode_bytes::<T>(req.body()).map_err(Rejection::InvalidPayload)?;
            Ok(handler(value))
        })
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Dispatch to the first matching route.
    ///
    /// When no route matches, the most specific rejection across all
    /// routes is returned: a payload error beats a method mismatch, which
    /// beats an unknown path.
    pub fn dispatch(&self, req: &IncomingRequest) -> Result<Reply, Rejection> {
        let mut best = Rejection::NotFound;
        for route in &self.routes {
            match route.matcher.check(req) {
                Ok(()) => {
                    tracing::debug!(route = %route.name, path = %req.path(), "Route matched");
                    let body = (route.handler)(req)?;
                    return Ok(Reply {
                        route: route.name.clone(),
                        body,
                    });
                }
                Err(rejection) => best = best.max(rejection),
            }
        }
        tracing::debug!(method = %req.method(), path = %req.path(), rejection = %best, "No route matched");
        Err(best)
    }
}
