//! Application wiring: every route, middleware and service, built by hand.

use std::sync::Arc;

use crate::cats::{CatsController, CatsService};
use crate::method::Method;
use crate::middleware::from_fn;
use crate::middleware::logger::{LoggerMiddleware, logger};
use crate::request::Request;
use crate::router::Router;

/// Builds the application router around `cats`.
///
/// Both logger middlewares cover `/cats` and everything under it.
pub fn app(cats: Arc<CatsService>) -> Router {
    let router = Router::new()
        .on(Method::Get, "/", hello)
        .middleware("/cats", LoggerMiddleware)
        .middleware("/cats", from_fn(logger));

    CatsController::new(cats).register(router)
}

async fn hello(_req: Request) -> &'static str {
    "Hello World!"
}
