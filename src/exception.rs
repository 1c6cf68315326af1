//! Request-level failures.
//!
//! Any stage or handler can fail a request by returning an [`HttpException`].
//! Converting it into a [`Response`] renders a default JSON body *and* keeps
//! the exception attached to the response, so an exception filter further
//! out in the pipeline can recognise it and render it differently.
//!
//! ```rust
//! use tabby::{HttpException, IntoResponse, Status};
//!
//! let resp = HttpException::bad_request("Validation failed").into_response();
//! assert_eq!(resp.status_code(), Status::BadRequest);
//! assert!(resp.exception().is_some());
//! ```

use serde::Serialize;

use crate::response::{IntoResponse, Response};
use crate::status::Status;

/// Coarse classification of an exception, derived from its status.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ExceptionKind {
    /// Malformed or invalid input (4xx other than 401/403).
    Client,
    /// Access denied (401/403).
    Authorization,
    /// Anything the server failed at (5xx, or a non-error status used as one).
    Server,
}

/// A failed request: status, human-readable message, optional custom body.
#[derive(Clone, Debug, thiserror::Error)]
#[error("{status}: {message}")]
pub struct HttpException {
    status: Status,
    message: String,
    body: Option<serde_json::Value>,
    cause: Option<String>,
}

impl HttpException {
    pub fn new(status: Status, message: impl Into<String>) -> Self {
        Self { status, message: message.into(), body: None, cause: None }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(Status::BadRequest, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(Status::Unauthorized, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(Status::Forbidden, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(Status::NotFound, message)
    }

    pub fn not_acceptable(message: impl Into<String>) -> Self {
        Self::new(Status::NotAcceptable, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(Status::InternalServerError, message)
    }

    /// Replaces the default rendered body with `body`, verbatim.
    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Records what caused this exception. Logged by filters, never sent.
    pub fn with_cause(mut self, cause: impl std::fmt::Display) -> Self {
        self.cause = Some(cause.to_string());
        self
    }

    pub fn status(&self) -> Status { self.status }
    pub fn message(&self) -> &str { &self.message }
    pub fn body(&self) -> Option<&serde_json::Value> { self.body.as_ref() }
    pub fn cause(&self) -> Option<&str> { self.cause.as_deref() }

    pub fn kind(&self) -> ExceptionKind {
        match self.status {
            Status::Unauthorized | Status::Forbidden => ExceptionKind::Authorization,
            s if s.is_client_error() => ExceptionKind::Client,
            _ => ExceptionKind::Server,
        }
    }

    /// The body sent when no filter re-renders the exception.
    ///
    /// `{"statusCode":400,"message":"Validation failed","error":"Bad Request"}`,
    /// with `error` left out when the message already is the reason phrase.
    pub fn default_body(&self) -> Vec<u8> {
        if let Some(body) = &self.body {
            return serde_json::to_vec(body).unwrap_or_default();
        }
        let reason = self.status.reason();
        let body = DefaultBody {
            status_code: self.status.code(),
            message: &self.message,
            error: (self.message != reason).then_some(reason),
        };
        serde_json::to_vec(&body).unwrap_or_default()
    }
}

#[derive(Serialize)]
struct DefaultBody<'a> {
    #[serde(rename = "statusCode")]
    status_code: u16,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
}

impl IntoResponse for HttpException {
    fn into_response(self) -> Response {
        let body = self.default_body();
        Response::builder()
            .status(self.status)
            .json(body)
            .with_exception(self)
    }
}
