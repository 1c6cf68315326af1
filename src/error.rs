//! Infrastructure error type.

/// The error type returned by tabby's fallible setup operations.
///
/// Request-level failures (400, 403, 404, ...) are expressed as
/// [`HttpException`](crate::HttpException) values and rendered into
/// responses, never as `Error`s. This type surfaces infrastructure failures:
/// parsing a bind address or binding the listener.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid socket address `{addr}`: {source}")]
    Addr {
        addr: String,
        #[source]
        source: std::net::AddrParseError,
    },
}
