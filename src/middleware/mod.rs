//! Middleware layer.
//!
//! Middleware is the first stage a request meets after the exception
//! filters, and sees it before any guard. It is the right place for
//! cross-cutting concerns: logging, request-id injection, header tweaks.
//!
//! Middleware is attached to the router for a path prefix rather than to a
//! single route:
//!
//! ```rust,no_run
//! use tabby::Router;
//! use tabby::middleware::{from_fn, logger::{logger, LoggerMiddleware}};
//!
//! let app = Router::new()
//!     .middleware("/cats", LoggerMiddleware)
//!     .middleware("/cats", from_fn(logger));
//! ```
//!
//! Both forms are equivalent. Use a struct when the middleware carries
//! configuration, a plain `async fn(Request, Next) -> Response` otherwise.

pub mod logger;

use std::future::Future;

use crate::handler::BoxFuture;
use crate::pipeline::{Next, Stage};
use crate::request::Request;
use crate::response::Response;

/// A stage with access to the raw request and the final response.
pub trait Middleware: Send + Sync + 'static {
    fn handle<'a>(&'a self, req: Request, next: Next) -> BoxFuture<'a, Response>;
}

/// Wraps an `async fn(Request, Next) -> Response` as [`Middleware`].
pub fn from_fn<F, Fut>(f: F) -> FnMiddleware<F>
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    FnMiddleware(f)
}

/// Returned by [`from_fn`].
pub struct FnMiddleware<F>(F);

impl<F, Fut> Middleware for FnMiddleware<F>
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    fn handle<'a>(&'a self, req: Request, next: Next) -> BoxFuture<'a, Response> {
        Box::pin((self.0)(req, next))
    }
}

pub(crate) struct MiddlewareStage<M>(pub(crate) M);

impl<M: Middleware> Stage for MiddlewareStage<M> {
    fn process<'a>(&'a self, req: Request, next: Next) -> BoxFuture<'a, Response> {
        self.0.handle(req, next)
    }
}
