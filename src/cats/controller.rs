use std::future::Future;
use std::sync::Arc;

use futures::StreamExt;
use serde_json::json;

use super::{Cat, CatSummary, CatsService, cat_schema};
use crate::exception::HttpException;
use crate::filter::HttpExceptionFilter;
use crate::guard::AuthGuard;
use crate::handler::Handler;
use crate::interceptor::LoggingInterceptor;
use crate::method::Method;
use crate::pipe::{ParseIntPipe, Pipe, ValidationPipe};
use crate::request::Request;
use crate::response::{IntoResponse, Json, Response};
use crate::router::{Route, Router};
use crate::status::Status;

/// HTTP surface of the cats feature, mounted under `/cats`.
pub struct CatsController {
    service: Arc<CatsService>,
}

impl CatsController {
    pub fn new(service: Arc<CatsService>) -> Arc<Self> {
        Arc::new(Self { service })
    }

    /// Adds every `/cats` route to `router`. Each one is guarded by
    /// [`AuthGuard`] and wrapped by [`LoggingInterceptor`].
    pub fn register(self: &Arc<Self>, router: Router) -> Router {
        router
            .route(Method::Get,    "/cats",                    self.guarded(Self::find_all))
            .route(Method::Get,    "/cats/all",                self.guarded(Self::find_all))
            .route(Method::Get,    "/cats/cat/{id}",           self.guarded(Self::find_one))
            .route(
                Method::Post,
                "/cats",
                self.guarded(Self::create)
                    .pipe(ValidationPipe::new(cat_schema()))
                    .filter(HttpExceptionFilter),
            )
            .route(Method::Put,    "/cats/cat/{id}",           self.guarded(Self::update))
            .route(Method::Delete, "/cats/cat/{id}",           self.guarded(Self::remove))
            .route(Method::Get,    "/cats/pipe/{id}",          self.guarded(Self::parse_id))
            .route(Method::Get,    "/cats/pipe/strict/{id}",   self.guarded(Self::parse_id_strict))
            .route(Method::Post,   "/cats/httpcode",           self.guarded(Self::http_code))
            .route(Method::Post,   "/cats/header",             self.guarded(Self::custom_header))
            .route(Method::Get,    "/cats/redirect",           self.guarded(Self::redirect))
            .route(Method::Get,    "/cats/redirect/url",       self.guarded(Self::redirect_with_url))
            .route(Method::Get,    "/cats/asynchronous",       self.guarded(Self::asynchronous))
            .route(Method::Get,    "/cats/observable",         self.guarded(Self::observable))
            .route(Method::Get,    "/cats/forbidden",          self.guarded(Self::forbidden))
            .route(Method::Get,    "/cats/forbidden/extended", self.guarded(Self::forbidden_extended))
            .route(Method::Get,    "/cats/custom/response",    self.guarded(Self::custom_list))
            .route(Method::Post,   "/cats/custom/response",    self.guarded(Self::custom_created))
    }

    fn guarded<F, Fut, R>(self: &Arc<Self>, f: F) -> Route
    where
        F: Fn(Arc<Self>, Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoResponse + Send + 'static,
    {
        Route::new(self.bind(f))
            .guard(AuthGuard)
            .interceptor(LoggingInterceptor)
    }

    /// Turns a method taking the controller into a plain handler.
    fn bind<F, Fut, R>(self: &Arc<Self>, f: F) -> impl Handler
    where
        F: Fn(Arc<Self>, Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoResponse + Send + 'static,
    {
        let this = Arc::clone(self);
        move |req| f(Arc::clone(&this), req)
    }

    // ── Handlers ──────────────────────────────────────────────────────────────

    async fn find_all(self: Arc<Self>, _req: Request) -> Json<Vec<Cat>> {
        Json(self.service.find_all())
    }

    async fn find_one(self: Arc<Self>, req: Request) -> Result<Json<Cat>, HttpException> {
        let id = ParseIntPipe::new().transform(req.param("id"))?;
        usize::try_from(id)
            .ok()
            .and_then(|index| self.service.find_one(index))
            .map(Json)
            .ok_or_else(|| HttpException::not_found(format!("Cat with id {id} not found")))
    }

    /// The body was already checked by the route's [`ValidationPipe`].
    async fn create(self: Arc<Self>, req: Request) -> Result<(Status, Json<Cat>), HttpException> {
        let cat: Cat = req.json()?;
        self.service.create(cat.clone());
        Ok((Status::Created, Json(cat)))
    }

    async fn update(self: Arc<Self>, req: Request) -> String {
        format!("Update #{} cat", req.param("id").unwrap_or_default())
    }

    async fn remove(self: Arc<Self>, req: Request) -> String {
        format!("Delete #{} cat", req.param("id").unwrap_or_default())
    }

    async fn parse_id(self: Arc<Self>, req: Request) -> Result<Json<serde_json::Value>, HttpException> {
        let id = ParseIntPipe::new().transform(req.param("id"))?;
        Ok(Json(json!({ "id": id })))
    }

    async fn parse_id_strict(self: Arc<Self>, req: Request) -> Result<Json<serde_json::Value>, HttpException> {
        let id = ParseIntPipe::with_error_status(Status::NotAcceptable).transform(req.param("id"))?;
        Ok(Json(json!({ "id": id })))
    }

    async fn http_code(self: Arc<Self>, _req: Request) -> Status {
        Status::NoContent
    }

    async fn custom_header(self: Arc<Self>, _req: Request) -> Response {
        Response::builder()
            .status(Status::Created)
            .header("cache-control", "none")
            .text("This action adds a new cat with header")
    }

    async fn redirect(self: Arc<Self>, _req: Request) -> Response {
        Response::redirect(Status::MovedPermanently, "https://nestjs.com")
    }

    async fn redirect_with_url(self: Arc<Self>, req: Request) -> Response {
        let location = match req.query("version") {
            Some("5") => "https://docs.nestjs.com/v5/",
            _ => "https://docs.nestjs.com",
        };
        Response::redirect(Status::Found, location)
    }

    async fn asynchronous(self: Arc<Self>, _req: Request) -> Json<Vec<CatSummary>> {
        Json(self.service.find_summaries().await)
    }

    /// Answers with the last value the stream emits, or `[]` if it emits none.
    async fn observable(self: Arc<Self>, _req: Request) -> Json<Vec<CatSummary>> {
        let last = self.service.summary_stream().fold(None, |_, item| async move { Some(item) }).await;
        Json(last.unwrap_or_default())
    }

    async fn forbidden(self: Arc<Self>, _req: Request) -> HttpException {
        HttpException::forbidden("Forbidden")
    }

    async fn forbidden_extended(self: Arc<Self>, _req: Request) -> HttpException {
        HttpException::forbidden("This is a custom message")
            .with_body(json!({ "status": 403, "error": "This is a custom message" }))
    }

    async fn custom_list(self: Arc<Self>, _req: Request) -> Response {
        Response::builder()
            .status(Status::Ok)
            .json(br#"[{"id":1,"name":"Cat"}]"#.to_vec())
    }

    async fn custom_created(self: Arc<Self>, _req: Request) -> Status {
        Status::Created
    }
}
