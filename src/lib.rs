//! # tabby
//!
//! A small HTTP framework where the request pipeline is explicit, plus the
//! cats application built on it.
//!
//! ## The pipeline
//!
//! Every matched request runs through one ordered list of stages, then the
//! route's handler:
//!
//! ```text
//! filter → middleware → guard → interceptor → pipe → handler
//! ```
//!
//! - **Filters** turn [`HttpException`]s into responses.
//! - **Middleware** sees raw requests under a path prefix (logging, headers).
//! - **Guards** permit or deny; a denial is a `403`.
//! - **Interceptors** wrap the handler and may change request and response.
//! - **Pipes** validate or transform one input: the body as a stage
//!   ([`pipe::ValidationPipe`]), or a single parameter inside the handler
//!   ([`pipe::ParseIntPipe`]).
//!
//! No decorators and no container: routes go into a [`Router`] by hand,
//! services are passed to controllers through their constructors.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use tabby::{HttpException, Method, Request, Route, Router, Server};
//! use tabby::guard::AuthGuard;
//! use tabby::pipe::{ParseIntPipe, Pipe};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), tabby::Error> {
//!     let app = Router::new()
//!         .route(Method::Get, "/cats/pipe/{id}", Route::new(show).guard(AuthGuard));
//!
//!     Server::bind(([0, 0, 0, 0], 3000).into()).serve(app).await
//! }
//!
//! async fn show(req: Request) -> Result<String, HttpException> {
//!     let id = ParseIntPipe::new().transform(req.param("id"))?;
//!     Ok(format!("cat #{id}"))
//! }
//! ```

mod error;
mod exception;
mod handler;
mod method;
mod request;
mod response;
mod router;
mod server;
mod status;

pub mod app;
pub mod cats;
pub mod config;
pub mod filter;
pub mod guard;
pub mod interceptor;
pub mod middleware;
pub mod pipe;
pub mod pipeline;
pub mod schema;

pub use error::Error;
pub use exception::{ExceptionKind, HttpException};
pub use handler::{BoxFuture, Handler};
pub use method::{Method, UnknownMethod};
pub use pipeline::{Next, Pipeline, Stage, StageKind};
pub use request::{Request, RequestBuilder};
pub use response::{IntoResponse, Json, Response, ResponseBuilder};
pub use router::{Route, Router};
pub use server::Server;
pub use status::Status;
