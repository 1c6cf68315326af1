//! Guards: permit/deny checks that run before interceptors, pipes and the
//! handler.
//!
//! A guard only answers yes or no. On no, the pipeline stops and the request
//! fails with `403 Forbidden resource`; nothing further down runs.

use tracing::debug;

use crate::exception::HttpException;
use crate::handler::BoxFuture;
use crate::pipeline::{Next, Stage};
use crate::request::Request;
use crate::response::{IntoResponse, Response};

/// A permit/deny decision over an incoming request.
pub trait Guard: Send + Sync + 'static {
    fn can_activate<'a>(&'a self, req: &'a Request) -> BoxFuture<'a, bool>;
}

/// Placeholder access control: logs the request and lets it through.
///
/// Swap in a real guard with the same signature to enforce permissions
/// without touching the routes that use it.
pub struct AuthGuard;

impl Guard for AuthGuard {
    fn can_activate<'a>(&'a self, req: &'a Request) -> BoxFuture<'a, bool> {
        Box::pin(async move { validate_request(req) })
    }
}

fn validate_request(req: &Request) -> bool {
    debug!(method = %req.method(), path = req.path(), route = ?req.route(), "validate request");
    true
}

pub(crate) struct GuardStage<G>(pub(crate) G);

impl<G: Guard> Stage for GuardStage<G> {
    fn process<'a>(&'a self, req: Request, next: Next) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            if self.0.can_activate(&req).await {
                next.run(req).await
            } else {
                HttpException::forbidden("Forbidden resource").into_response()
            }
        })
    }
}
