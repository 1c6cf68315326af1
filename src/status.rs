//! HTTP status codes as a typed enum.
//!
//! Use [`Status`] anywhere a status code is accepted: `Response::status()`,
//! `Response::builder().status()`, an [`HttpException`](crate::HttpException),
//! or as a bare handler return value.
//!
//! ```rust
//! use tabby::{Response, Status};
//!
//! // status-only, no body
//! Response::status(Status::NoContent);
//!
//! Response::builder()
//!     .status(Status::Created)
//!     .header("location", "/cats/cat/0")
//!     .json(br#"{"name":"Garfield"}"#.to_vec());
//!
//! async fn remove(_req: tabby::Request) -> Status {
//!     Status::NoContent
//! }
//! ```

use std::fmt;

/// The status codes the pipeline and the sample application produce.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Status {
    // ── 2xx Success ───────────────────────────────────────────────────────────
    Ok,                            // 200
    Created,                       // 201
    NoContent,                     // 204

    // ── 3xx Redirection ───────────────────────────────────────────────────────
    MovedPermanently,              // 301
    Found,                         // 302

    // ── 4xx Client errors ─────────────────────────────────────────────────────
    BadRequest,                    // 400
    Unauthorized,                  // 401
    Forbidden,                     // 403
    NotFound,                      // 404
    MethodNotAllowed,              // 405
    NotAcceptable,                 // 406
    PayloadTooLarge,               // 413

    // ── 5xx Server errors ─────────────────────────────────────────────────────
    InternalServerError,           // 500
}

impl Status {
    /// Numeric status code.
    pub fn code(self) -> u16 {
        match self {
            Self::Ok                   => 200,
            Self::Created              => 201,
            Self::NoContent            => 204,
            Self::MovedPermanently     => 301,
            Self::Found                => 302,
            Self::BadRequest           => 400,
            Self::Unauthorized         => 401,
            Self::Forbidden            => 403,
            Self::NotFound             => 404,
            Self::MethodNotAllowed     => 405,
            Self::NotAcceptable        => 406,
            Self::PayloadTooLarge      => 413,
            Self::InternalServerError  => 500,
        }
    }

    /// Canonical reason phrase (RFC 9110), used in default error bodies.
    pub fn reason(self) -> &'static str {
        match self {
            Self::Ok                   => "OK",
            Self::Created              => "Created",
            Self::NoContent            => "No Content",
            Self::MovedPermanently     => "Moved Permanently",
            Self::Found                => "Found",
            Self::BadRequest           => "Bad Request",
            Self::Unauthorized         => "Unauthorized",
            Self::Forbidden            => "Forbidden",
            Self::NotFound             => "Not Found",
            Self::MethodNotAllowed     => "Method Not Allowed",
            Self::NotAcceptable        => "Not Acceptable",
            Self::PayloadTooLarge      => "Payload Too Large",
            Self::InternalServerError  => "Internal Server Error",
        }
    }

    pub fn is_client_error(self) -> bool { (400..500).contains(&self.code()) }
}

impl From<Status> for u16 {
    fn from(s: Status) -> u16 { s.code() }
}

impl From<Status> for http::StatusCode {
    fn from(s: Status) -> Self {
        // Every variant above is a registered code, so this never falls back.
        http::StatusCode::from_u16(s.code()).unwrap_or(http::StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code(), self.reason())
    }
}
