//! Outgoing HTTP response type and the [`IntoResponse`] conversion trait.
//!
//! Build a [`Response`] in your handler and return it, or return anything
//! that implements [`IntoResponse`]: strings, a [`Status`], a [`Json`]
//! value, an [`HttpException`], or a `Result` of those.

use bytes::Bytes;
use http_body_util::Full;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::error;

use crate::exception::HttpException;
use crate::status::Status;

const JSON: &str = "application/json";
const TEXT: &str = "text/plain; charset=utf-8";

// ── Response ─────────────────────────────────────────────────────────────────

/// An outgoing HTTP response.
///
/// # Shortcuts (200 OK, no custom headers needed)
///
/// ```rust
/// use tabby::{Response, Status};
///
/// Response::json(br#"{"name":"Garfield"}"#.to_vec());
/// Response::text("Hello World!");
/// Response::status(Status::NoContent);
/// Response::redirect(Status::MovedPermanently, "https://nestjs.com");
/// ```
///
/// # Builder (custom status or headers)
///
/// ```rust
/// use tabby::{Response, Status};
///
/// Response::builder()
///     .status(Status::Created)
///     .header("cache-control", "none")
///     .text("This action adds a new cat with header");
/// ```
#[derive(Debug)]
pub struct Response {
    pub(crate) body: Vec<u8>,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) status: Status,
    pub(crate) exception: Option<Box<HttpException>>,
}

impl Response {
    /// `200 OK` — `application/json`.
    pub fn json(body: Vec<u8>) -> Self {
        Self::builder().json(body)
    }

    /// `200 OK` — `text/plain; charset=utf-8`.
    pub fn text(body: impl Into<String>) -> Self {
        Self::builder().text(body)
    }

    /// Response with no body.
    pub fn status(code: Status) -> Self {
        Self::builder().status(code).no_body()
    }

    /// Redirect to `location` with a 3xx `code`.
    pub fn redirect(code: Status, location: &str) -> Self {
        Self::builder().status(code).header("location", location).no_body()
    }

    /// Builder for responses that need a custom status or extra headers.
    pub fn builder() -> ResponseBuilder {
        ResponseBuilder { headers: Vec::new(), status: Status::Ok }
    }

    pub fn status_code(&self) -> Status { self.status }
    pub fn headers(&self) -> &[(String, String)] { &self.headers }
    pub fn body(&self) -> &[u8] { &self.body }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Deserialises the body as JSON.
    pub fn json_body<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    /// The exception this response was rendered from, if any.
    pub fn exception(&self) -> Option<&HttpException> {
        self.exception.as_deref()
    }

    /// Detaches the exception, leaving a plain response behind.
    pub fn take_exception(&mut self) -> Option<HttpException> {
        self.exception.take().map(|e| *e)
    }

    pub(crate) fn with_exception(mut self, exception: HttpException) -> Self {
        self.exception = Some(Box::new(exception));
        self
    }

    /// Adds or replaces a header on an already built response.
    pub fn set_header(&mut self, name: &str, value: &str) {
        match self.headers.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(name)) {
            Some((_, v)) => *v = value.to_owned(),
            None => self.headers.push((name.to_owned(), value.to_owned())),
        }
    }

    pub(crate) fn into_http(self) -> http::Response<Full<Bytes>> {
        let mut builder = http::Response::builder().status(http::StatusCode::from(self.status));
        for (name, value) in &self.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder.body(Full::new(Bytes::from(self.body))).unwrap_or_else(|e| {
            error!("invalid response header: {e}");
            let mut resp = http::Response::new(Full::new(Bytes::new()));
            *resp.status_mut() = http::StatusCode::INTERNAL_SERVER_ERROR;
            resp
        })
    }
}

// ── ResponseBuilder ───────────────────────────────────────────────────────────

/// Fluent builder for [`Response`].
///
/// Obtain via [`Response::builder()`]. Defaults to `Status::Ok` (200).
/// Terminated by a typed body method.
pub struct ResponseBuilder {
    headers: Vec<(String, String)>,
    status: Status,
}

impl ResponseBuilder {
    pub fn status(mut self, code: Status) -> Self {
        self.status = code;
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_owned(), value.to_owned()));
        self
    }

    /// Terminate with a JSON body (`application/json`).
    pub fn json(self, body: Vec<u8>) -> Response {
        self.finish(JSON, body)
    }

    /// Terminate with a plain-text body (`text/plain; charset=utf-8`).
    pub fn text(self, body: impl Into<String>) -> Response {
        self.finish(TEXT, body.into().into_bytes())
    }

    /// Terminate with no body (e.g. `Status::NoContent`, `Status::Created`).
    pub fn no_body(self) -> Response {
        Response { body: Vec::new(), headers: self.headers, status: self.status, exception: None }
    }

    fn finish(self, content_type: &str, body: Vec<u8>) -> Response {
        let mut headers = vec![("content-type".to_owned(), content_type.to_owned())];
        headers.extend(self.headers);
        Response { body, headers, status: self.status, exception: None }
    }
}

// ── Json ──────────────────────────────────────────────────────────────────────

/// Serialises `T` with serde_json into a `200 OK` JSON response.
///
/// ```rust
/// use tabby::Json;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Cat { name: String }
///
/// async fn garfield(_req: tabby::Request) -> Json<Cat> {
///     Json(Cat { name: "Garfield".into() })
/// }
/// ```
pub struct Json<T>(pub T);

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        match serde_json::to_vec(&self.0) {
            Ok(bytes) => Response::json(bytes),
            Err(e) => HttpException::internal("Internal server error")
                .with_cause(e)
                .into_response(),
        }
    }
}

// ── IntoResponse ──────────────────────────────────────────────────────────────

/// Conversion into an HTTP [`Response`].
///
/// Implement on your own types to return them directly from handlers.
pub trait IntoResponse {
    fn into_response(self) -> Response;
}

impl IntoResponse for Response {
    fn into_response(self) -> Response { self }
}

impl IntoResponse for &'static str {
    fn into_response(self) -> Response { Response::text(self) }
}

impl IntoResponse for String {
    fn into_response(self) -> Response { Response::text(self) }
}

/// Return a [`Status`] directly from a handler: `return Status::NoContent`
impl IntoResponse for Status {
    fn into_response(self) -> Response { Response::status(self) }
}

/// `(Status::Created, Json(cat))` overrides the status of the inner response.
impl<T: IntoResponse> IntoResponse for (Status, T) {
    fn into_response(self) -> Response {
        let mut resp = self.1.into_response();
        resp.status = self.0;
        resp
    }
}

/// Lets handlers use `?` on anything that fails with an [`HttpException`].
impl<T: IntoResponse, E: IntoResponse> IntoResponse for Result<T, E> {
    fn into_response(self) -> Response {
        match self {
            Ok(v) => v.into_response(),
            Err(e) => e.into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_puts_content_type_first() {
        let resp = Response::builder()
            .status(Status::Created)
            .header("cache-control", "none")
            .text("ok");
        assert_eq!(resp.status_code(), Status::Created);
        assert_eq!(resp.headers()[0].0, "content-type");
        assert_eq!(resp.header("Cache-Control"), Some("none"));
    }

    #[test]
    fn redirect_sets_location_without_body() {
        let resp = Response::redirect(Status::Found, "https://docs.nestjs.com");
        assert_eq!(resp.status_code(), Status::Found);
        assert_eq!(resp.header("location"), Some("https://docs.nestjs.com"));
        assert!(resp.body().is_empty());
    }

    #[test]
    fn status_tuple_overrides_status() {
        let resp = (Status::Created, Json(serde_json::json!({"a": 1}))).into_response();
        assert_eq!(resp.status_code(), Status::Created);
        assert_eq!(resp.header("content-type"), Some("application/json"));
    }

    #[test]
    fn err_result_renders_exception() {
        let res: Result<&'static str, HttpException> = Err(HttpException::bad_request("nope"));
        let resp = res.into_response();
        assert_eq!(resp.status_code(), Status::BadRequest);
        assert!(resp.exception().is_some());
    }

    #[test]
    fn set_header_replaces_existing() {
        let mut resp = Response::text("x");
        resp.set_header("Content-Type", "text/html");
        assert_eq!(resp.header("content-type"), Some("text/html"));
        assert_eq!(resp.headers().len(), 1);
    }

    #[test]
    fn into_http_maps_status_and_headers() {
        let resp = Response::redirect(Status::MovedPermanently, "https://nestjs.com").into_http();
        assert_eq!(resp.status(), http::StatusCode::MOVED_PERMANENTLY);
        assert_eq!(resp.headers()["location"], "https://nestjs.com");
    }
}
