//! Incoming HTTP request type.

use std::collections::HashMap;

use bytes::Bytes;
use http::HeaderMap;
use http::header::{HeaderName, HeaderValue};
use serde::de::DeserializeOwned;

use crate::exception::HttpException;
use crate::method::Method;

/// An incoming HTTP request with its body fully buffered.
///
/// Path parameters are filled in by the router once a route matches; until
/// then [`param`](Request::param) returns `None`.
#[derive(Debug)]
pub struct Request {
    method: Method,
    path: String,
    query: Option<String>,
    headers: HeaderMap,
    body: Bytes,
    params: HashMap<String, String>,
    route: Option<String>,
}

impl Request {
    /// Starts building a request by hand, for in-process dispatch through
    /// [`Router::call`](crate::Router::call). `target` may carry a query
    /// string (`/cats/redirect/url?version=5`).
    pub fn builder(method: Method, target: &str) -> RequestBuilder {
        RequestBuilder {
            req: Request::new(method, target, HeaderMap::new(), Bytes::new()),
        }
    }

    pub(crate) fn new(method: Method, target: &str, headers: HeaderMap, body: Bytes) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((p, q)) => (p.to_owned(), Some(q.to_owned())),
            None => (target.to_owned(), None),
        };
        Self { method, path, query, headers, body, params: HashMap::new(), route: None }
    }

    pub(crate) fn matched(&mut self, route: &str, params: HashMap<String, String>) {
        self.route = Some(route.to_owned());
        self.params = params;
    }

    pub fn method(&self) -> Method { self.method }
    pub fn path(&self) -> &str { &self.path }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn headers_mut(&mut self) -> &mut HeaderMap { &mut self.headers }
    pub fn body(&self) -> &[u8] { &self.body }

    /// The route pattern that matched, e.g. `/cats/cat/{id}`.
    pub fn route(&self) -> Option<&str> { self.route.as_deref() }

    /// Raw query string without the leading `?`.
    pub fn query_string(&self) -> Option<&str> { self.query.as_deref() }

    /// Header lookup; names are case-insensitive.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/cats/cat/{id}`, `req.param("id")` on `/cats/cat/42` returns `Some("42")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// First value of a query parameter. Values are taken verbatim.
    pub fn query(&self, key: &str) -> Option<&str> {
        self.query.as_deref()?
            .split('&')
            .filter_map(|pair| pair.split_once('=').or(Some((pair, ""))))
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v)
    }

    /// Deserialises the body as JSON; malformed bodies are a 400.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, HttpException> {
        serde_json::from_slice(&self.body)
            .map_err(|e| HttpException::bad_request("Invalid JSON body").with_cause(e))
    }
}

/// Builder returned by [`Request::builder`].
pub struct RequestBuilder {
    req: Request,
}

impl RequestBuilder {
    /// Adds a header. Invalid names or values are ignored.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(n), Ok(v)) = (HeaderName::try_from(name), HeaderValue::try_from(value)) {
            self.req.headers.append(n, v);
        }
        self
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.req.body = body.into();
        self
    }

    /// Sets a JSON body and the matching content-type.
    pub fn json(self, value: &serde_json::Value) -> Self {
        let bytes = serde_json::to_vec(value).unwrap_or_default();
        self.header("content-type", "application/json").body(bytes)
    }

    pub fn build(self) -> Request {
        self.req
    }
}
