//! Request logging middleware.
//!
//! Observes a request on its way in and the status on its way out. Never
//! touches either, always calls `next`.

use tracing::info;

use crate::handler::BoxFuture;
use crate::middleware::Middleware;
use crate::pipeline::Next;
use crate::request::Request;
use crate::response::Response;

/// Struct form of the request logger.
pub struct LoggerMiddleware;

impl Middleware for LoggerMiddleware {
    fn handle<'a>(&'a self, req: Request, next: Next) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let method = req.method();
            let path = req.path().to_owned();
            info!(%method, %path, "request middleware");

            let resp = next.run(req).await;

            info!(%method, %path, status = resp.status_code().code(), "response middleware");
            resp
        })
    }
}

/// Function form of the request logger, for use with
/// [`from_fn`](crate::middleware::from_fn).
pub async fn logger(req: Request, next: Next) -> Response {
    info!(method = %req.method(), path = req.path(), "request functional middleware");
    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::method::Method;
    use crate::middleware::from_fn;
    use crate::pipeline::Pipeline;
    use crate::handler::Handler;

    async fn echo(req: Request) -> String {
        format!("{} {} {}", req.method(), req.path(), String::from_utf8_lossy(req.body()))
    }

    #[tokio::test]
    async fn both_forms_pass_the_request_through_untouched() {
        let chain = Pipeline::new()
            .middleware(LoggerMiddleware)
            .middleware(from_fn(logger))
            .into_chain(echo.into_boxed_handler());
        let req = Request::builder(Method::Post, "/cats").body("meow").build();

        let resp = Next::start(chain).run(req).await;

        assert_eq!(resp.body(), b"POST /cats meow");
    }
}
