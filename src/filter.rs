//! Exception filters: the outermost stage, turning exceptions into the
//! responses clients see.
//!
//! Without a filter, an [`HttpException`] is sent with its default body.
//! A filter gets the exception together with the request's method and path
//! and renders whatever it likes.

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use tracing::{error, warn};

use crate::exception::{ExceptionKind, HttpException};
use crate::handler::BoxFuture;
use crate::method::Method;
use crate::pipeline::{Next, Stage};
use crate::request::Request;
use crate::response::Response;

/// What a filter knows about the request that failed.
#[derive(Clone, Debug)]
pub struct ArgumentsHost {
    method: Method,
    path: String,
}

impl ArgumentsHost {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self { method, path: path.into() }
    }

    pub fn method(&self) -> Method { self.method }
    pub fn path(&self) -> &str { &self.path }
}

/// Renders an exception into a response.
pub trait ExceptionFilter: Send + Sync + 'static {
    fn catch(&self, exception: HttpException, host: &ArgumentsHost) -> Response;
}

/// Renders `{"statusCode", "timestamp", "path", "message"}` and logs the
/// exception: warn for client and authorization errors, error for the rest.
pub struct HttpExceptionFilter;

#[derive(Serialize)]
struct FilteredBody<'a> {
    #[serde(rename = "statusCode")]
    status_code: u16,
    timestamp: String,
    path: &'a str,
    message: &'a str,
}

impl ExceptionFilter for HttpExceptionFilter {
    fn catch(&self, exception: HttpException, host: &ArgumentsHost) -> Response {
        let status = exception.status();
        match exception.kind() {
            ExceptionKind::Client | ExceptionKind::Authorization => warn!(
                method = %host.method(),
                path = host.path(),
                status = status.code(),
                cause = exception.cause(),
                "{}",
                exception.message(),
            ),
            ExceptionKind::Server => error!(
                method = %host.method(),
                path = host.path(),
                status = status.code(),
                cause = exception.cause(),
                "{}",
                exception.message(),
            ),
        }

        let body = FilteredBody {
            status_code: status.code(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            path: host.path(),
            message: exception.message(),
        };
        Response::builder()
            .status(status)
            .json(serde_json::to_vec(&body).unwrap_or_default())
    }
}

pub(crate) struct FilterStage<F>(pub(crate) F);

impl<F: ExceptionFilter> Stage for FilterStage<F> {
    fn process<'a>(&'a self, req: Request, next: Next) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let host = ArgumentsHost::new(req.method(), req.path());
            let mut resp = next.run(req).await;
            match resp.take_exception() {
                Some(exception) => self.0.catch(exception, &host),
                None => resp,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::Handler;
    use crate::pipeline::Pipeline;
    use crate::status::Status;

    async fn failing(_req: Request) -> Result<&'static str, HttpException> {
        Err(HttpException::bad_request("Validation failed"))
    }

    async fn fine(_req: Request) -> &'static str {
        "ok"
    }

    #[tokio::test]
    async fn renders_exceptions_with_path_and_timestamp() {
        let chain = Pipeline::new()
            .filter(HttpExceptionFilter)
            .into_chain(failing.into_boxed_handler());
        let resp = Next::start(chain)
            .run(Request::builder(Method::Get, "/cats/pipe/abc").build())
            .await;

        assert_eq!(resp.status_code(), Status::BadRequest);
        assert!(resp.exception().is_none());
        let body: serde_json::Value = resp.json_body().unwrap();
        assert_eq!(body["statusCode"], 400);
        assert_eq!(body["path"], "/cats/pipe/abc");
        assert_eq!(body["message"], "Validation failed");
        assert!(body["timestamp"].as_str().unwrap().ends_with('Z'));
    }

    #[tokio::test]
    async fn leaves_successful_responses_alone() {
        let chain = Pipeline::new()
            .filter(HttpExceptionFilter)
            .into_chain(fine.into_boxed_handler());
        let resp = Next::start(chain).run(Request::builder(Method::Get, "/").build()).await;
        assert_eq!(resp.body(), b"ok");
    }
}
