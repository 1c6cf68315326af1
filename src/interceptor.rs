//! Interceptors wrap the handler (and the pipes in front of it): they see the
//! request after the guards have passed, and the response before the
//! exception filters do.

use std::time::Instant;

use tracing::info;

use crate::handler::BoxFuture;
use crate::pipeline::{Next, Stage};
use crate::request::Request;
use crate::response::Response;

/// Runs code around the rest of the pipeline.
///
/// Call `next.run(req)` exactly once to continue; the future it returns
/// resolves to the response, which the interceptor may alter.
pub trait Interceptor: Send + Sync + 'static {
    fn intercept<'a>(&'a self, req: Request, next: Next) -> BoxFuture<'a, Response>;
}

/// Logs before and after the handler, with the elapsed time.
pub struct LoggingInterceptor;

impl Interceptor for LoggingInterceptor {
    fn intercept<'a>(&'a self, req: Request, next: Next) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let route = req.route().unwrap_or(req.path()).to_owned();
            info!(%route, "Before...");
            let started = Instant::now();

            let resp = next.run(req).await;

            info!(%route, elapsed_ms = started.elapsed().as_millis() as u64, "After...");
            resp
        })
    }
}

pub(crate) struct InterceptorStage<I>(pub(crate) I);

impl<I: Interceptor> Stage for InterceptorStage<I> {
    fn process<'a>(&'a self, req: Request, next: Next) -> BoxFuture<'a, Response> {
        self.0.intercept(req, next)
    }
}
