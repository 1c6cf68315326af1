//! HTTP server and graceful shutdown.
//!
//! On SIGTERM or Ctrl-C the server stops accepting, lets every in-flight
//! connection finish, then returns from [`Server::serve`] so `main` can exit
//! cleanly.

use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Body;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

use crate::config::AppConfig;
use crate::error::Error;
use crate::exception::HttpException;
use crate::method::Method;
use crate::request::Request;
use crate::response::{IntoResponse, Response};
use crate::router::Router;
use crate::status::Status;

/// The HTTP server.
pub struct Server {
    addr: SocketAddr,
    body_limit: usize,
}

impl Server {
    /// Configures the server to bind to `addr` when [`serve`](Server::serve)
    /// is called.
    pub fn bind(addr: SocketAddr) -> Self {
        Self { addr, body_limit: crate::config::MAX_BODY_BYTES }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self { addr: config.addr(), body_limit: config.body_limit() }
    }

    /// Starts accepting connections and dispatching them through `router`.
    ///
    /// Returns only after a full graceful shutdown (SIGTERM or Ctrl-C,
    /// followed by all in-flight requests completing).
    pub async fn serve(self, router: Router) -> Result<(), Error> {
        let listener = TcpListener::bind(self.addr).await?;

        // One routing table, shared by every connection task.
        let router = Arc::new(router);
        let body_limit = self.body_limit;

        info!(addr = %self.addr, "tabby listening");

        let mut tasks = tokio::task::JoinSet::new();

        let shutdown = shutdown_signal();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                // Check shutdown first so a SIGTERM stops accepting at once,
                // even if more connections are queued.
                biased;

                () = &mut shutdown => {
                    info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                    break;
                }

                res = listener.accept() => {
                    let (stream, remote_addr) = match res {
                        Ok(v) => v,
                        Err(e) => {
                            error!("accept error: {e}");
                            continue;
                        }
                    };

                    let router = Arc::clone(&router);
                    let io = TokioIo::new(stream);

                    tasks.spawn(async move {
                        // Called once per request on the connection.
                        let svc = service_fn(move |req| {
                            let router = Arc::clone(&router);
                            async move { dispatch(router, req, remote_addr, body_limit).await }
                        });

                        // HTTP/1.1 or HTTP/2, whatever the client negotiates.
                        if let Err(e) = ConnBuilder::new(TokioExecutor::new())
                            .serve_connection(io, svc)
                            .await
                        {
                            error!(peer = %remote_addr, "connection error: {e}");
                        }
                    });
                }

                // Reap finished connection tasks so the JoinSet does not grow
                // without bound on long-running servers.
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        while tasks.join_next().await.is_some() {}

        info!("tabby stopped");
        Ok(())
    }
}

// ── Request dispatch ──────────────────────────────────────────────────────────

/// Buffers one hyper request, runs it through the router, converts back.
///
/// Every failure becomes a response, so hyper never sees an error.
async fn dispatch(
    router: Arc<Router>,
    req: hyper::Request<hyper::body::Incoming>,
    remote_addr: SocketAddr,
    body_limit: usize,
) -> Result<http::Response<Full<Bytes>>, std::convert::Infallible> {
    let response = match into_request(req, body_limit).await {
        Ok(req) => {
            debug!(peer = %remote_addr, method = %req.method(), path = req.path(), "dispatch");
            router.call(req).await
        }
        Err(rejection) => rejection,
    };
    Ok(response.into_http())
}

async fn into_request(
    req: hyper::Request<hyper::body::Incoming>,
    body_limit: usize,
) -> Result<Request, Response> {
    let (parts, body) = req.into_parts();

    let method = Method::try_from(&parts.method).map_err(|e| {
        HttpException::new(Status::MethodNotAllowed, "Method Not Allowed")
            .with_cause(e)
            .into_response()
    })?;

    let body = read_body(body, body_limit).await.map_err(IntoResponse::into_response)?;

    let target = parts.uri.path_and_query().map_or("/", |pq| pq.as_str());
    Ok(Request::new(method, target, parts.headers, body))
}

/// Buffers at most `limit` bytes of `body`: 413 past the limit, 400 when the
/// body cannot be read.
async fn read_body<B>(body: B, limit: usize) -> Result<Bytes, HttpException>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
            Err(HttpException::new(Status::PayloadTooLarge, "Payload Too Large").with_cause(e))
        }
        Err(e) => Err(HttpException::bad_request("Unreadable request body").with_cause(e)),
    }
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on the first SIGTERM or Ctrl-C the process receives.
///
/// If a handler cannot be installed, that signal is simply never awaited.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to install Ctrl-C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c   => {}
        () = sigterm  => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn bodies_within_the_limit_are_buffered() {
        let body = read_body(Full::new(Bytes::from_static(b"hello")), 5).await.unwrap();
        assert_eq!(body, "hello");
    }

    #[tokio::test]
    async fn oversized_bodies_are_rejected_with_413() {
        let err = read_body(Full::new(Bytes::from_static(b"hello!")), 5).await.unwrap_err();
        assert_eq!(err.status(), Status::PayloadTooLarge);
        assert_eq!(err.into_response().status_code(), Status::PayloadTooLarge);
    }
}
