//! Stage ordering through the public router API.

use std::sync::Arc;

use parking_lot::Mutex;
use tabby::filter::{ArgumentsHost, ExceptionFilter};
use tabby::guard::Guard;
use tabby::interceptor::Interceptor;
use tabby::middleware::Middleware;
use tabby::pipe::BodyPipe;
use tabby::{BoxFuture, HttpException, Method, Next, Request, Response, Route, Router, Status};

type Log = Arc<Mutex<Vec<&'static str>>>;

struct Recorder {
    log: Log,
    name: &'static str,
}

impl Recorder {
    fn new(log: &Log, name: &'static str) -> Self {
        Self { log: Arc::clone(log), name }
    }

    fn record(&self) {
        self.log.lock().push(self.name);
    }
}

impl Middleware for Recorder {
    fn handle<'a>(&'a self, req: Request, next: Next) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            self.record();
            next.run(req).await
        })
    }
}

impl Interceptor for Recorder {
    fn intercept<'a>(&'a self, req: Request, next: Next) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            self.record();
            let resp = next.run(req).await;
            self.log.lock().push("interceptor:post");
            resp
        })
    }
}

struct RecordingGuard {
    inner: Recorder,
    permit: bool,
}

impl Guard for RecordingGuard {
    fn can_activate<'a>(&'a self, _req: &'a Request) -> BoxFuture<'a, bool> {
        Box::pin(async move {
            self.inner.record();
            self.permit
        })
    }
}

impl BodyPipe for Recorder {
    fn check(&self, _req: &Request) -> Result<(), HttpException> {
        self.record();
        Ok(())
    }
}

impl ExceptionFilter for Recorder {
    fn catch(&self, exception: HttpException, _host: &ArgumentsHost) -> Response {
        self.record();
        Response::builder().status(exception.status()).text("filtered")
    }
}

fn app(log: &Log, permit: bool) -> Router {
    let handler_log = Arc::clone(log);
    let handler = move |_req: Request| {
        let log = Arc::clone(&handler_log);
        async move {
            log.lock().push("handler");
            "done"
        }
    };

    // Registered deliberately out of order.
    let route = Route::new(handler)
        .pipe(Recorder::new(log, "pipe"))
        .interceptor(Recorder::new(log, "interceptor"))
        .guard(RecordingGuard { inner: Recorder::new(log, "guard"), permit });

    Router::new()
        .route(Method::Get, "/cats", route)
        .middleware("/cats", Recorder::new(log, "middleware"))
        .filter(Recorder::new(log, "filter"))
}

#[tokio::test]
async fn stages_run_in_fixed_order() {
    let log: Log = Arc::default();
    let resp = app(&log, true).call(Request::builder(Method::Get, "/cats").build()).await;

    assert_eq!(resp.body(), b"done");
    assert_eq!(
        *log.lock(),
        ["middleware", "guard", "interceptor", "pipe", "handler", "interceptor:post"]
    );
}

#[tokio::test]
async fn denied_guard_stops_everything_downstream() {
    let log: Log = Arc::default();
    let resp = app(&log, false).call(Request::builder(Method::Get, "/cats").build()).await;

    assert_eq!(resp.status_code(), Status::Forbidden);
    assert_eq!(resp.body(), b"filtered");
    assert_eq!(*log.lock(), ["middleware", "guard", "filter"]);
}

#[tokio::test]
async fn middleware_is_scoped_to_its_prefix() {
    let log: Log = Arc::default();
    let router = app(&log, true).on(Method::Get, "/dogs", |_req: Request| async { "woof" });

    let resp = router.call(Request::builder(Method::Get, "/dogs").build()).await;

    assert_eq!(resp.body(), b"woof");
    assert!(log.lock().is_empty());
}
