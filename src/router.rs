//! Route table.
//!
//! One radix tree per HTTP method, O(path-length) lookup. Routes are
//! registered explicitly, each with its own [`Route`] pipeline; filters and
//! prefix-scoped middleware are registered on the router and merged into
//! every covered route's pipeline. Each route's chain is assembled at
//! registration, so dispatch only clones an `Arc`.

use std::collections::HashMap;
use std::sync::Arc;

use matchit::Router as MatchitRouter;

use crate::exception::HttpException;
use crate::filter::ExceptionFilter;
use crate::guard::Guard;
use crate::handler::{BoxedHandler, Handler};
use crate::interceptor::Interceptor;
use crate::method::Method;
use crate::middleware::Middleware;
use crate::pipe::BodyPipe;
use crate::pipeline::{Chain, Next, Pipeline};
use crate::request::Request;
use crate::response::Response;

/// A handler plus the stages that only apply to it.
///
/// ```rust,no_run
/// # use tabby::{Request, Route};
/// # use tabby::guard::AuthGuard;
/// # use tabby::interceptor::LoggingInterceptor;
/// # async fn find_all(_: Request) -> &'static str { "" }
/// Route::new(find_all)
///     .guard(AuthGuard)
///     .interceptor(LoggingInterceptor);
/// ```
pub struct Route {
    handler: BoxedHandler,
    pipeline: Pipeline,
}

impl Route {
    pub fn new(handler: impl Handler) -> Self {
        Self { handler: handler.into_boxed_handler(), pipeline: Pipeline::new() }
    }

    pub fn middleware(mut self, middleware: impl Middleware) -> Self {
        self.pipeline = self.pipeline.middleware(middleware);
        self
    }

    pub fn guard(mut self, guard: impl Guard) -> Self {
        self.pipeline = self.pipeline.guard(guard);
        self
    }

    pub fn interceptor(mut self, interceptor: impl Interceptor) -> Self {
        self.pipeline = self.pipeline.interceptor(interceptor);
        self
    }

    pub fn pipe(mut self, pipe: impl BodyPipe) -> Self {
        self.pipeline = self.pipeline.pipe(pipe);
        self
    }

    pub fn filter(mut self, filter: impl ExceptionFilter) -> Self {
        self.pipeline = self.pipeline.filter(filter);
        self
    }
}

struct Endpoint {
    pattern: String,
    route: Route,
    chain: Arc<Chain>,
}

/// The application router.
///
/// Build it once at startup and pass it to [`Server::serve`](crate::Server::serve).
/// Every registration returns `self` so calls chain naturally.
pub struct Router {
    routes: HashMap<Method, MatchitRouter<usize>>,
    endpoints: Vec<Endpoint>,
    global: Pipeline,
    scoped: Vec<(String, Pipeline)>,
    fallback: Arc<Chain>,
}

impl Router {
    pub fn new() -> Self {
        Self {
            routes: HashMap::new(),
            endpoints: Vec::new(),
            global: Pipeline::new(),
            scoped: Vec::new(),
            fallback: Pipeline::new().into_chain(not_found.into_boxed_handler()),
        }
    }

    /// Register a bare handler for a method + path pair.
    ///
    /// Path parameters use `{name}` syntax; `req.param("name")` retrieves them.
    pub fn on(self, method: Method, path: &str, handler: impl Handler) -> Self {
        self.route(method, path, Route::new(handler))
    }

    /// Register a handler together with its own stages.
    ///
    /// # Panics
    ///
    /// Panics if `path` is not a valid route or conflicts with one already
    /// registered for `method`.
    pub fn route(mut self, method: Method, path: &str, route: Route) -> Self {
        self.routes
            .entry(method)
            .or_default()
            .insert(path, self.endpoints.len())
            .unwrap_or_else(|e| panic!("invalid route `{path}`: {e}"));
        let chain = assemble(&self.global, &self.scoped, path, &route);
        self.endpoints.push(Endpoint { pattern: path.to_owned(), route, chain });
        self
    }

    /// Apply `middleware` to every route under `prefix` (segment-wise:
    /// `/cats` covers `/cats` and `/cats/all`, not `/catsup`).
    ///
    /// The prefix is matched against route patterns, so it may not contain
    /// parameters.
    pub fn middleware(mut self, prefix: &str, middleware: impl Middleware) -> Self {
        let prefix = prefix.trim_end_matches('/').to_owned();
        let pipeline = Pipeline::new().middleware(middleware);
        self.scoped.push((prefix, pipeline));
        self.reassemble();
        self
    }

    /// Install an exception filter for every request, matched or not.
    pub fn filter(mut self, filter: impl ExceptionFilter) -> Self {
        self.global = std::mem::take(&mut self.global).filter(filter);
        self.reassemble();
        self
    }

    /// Runs one request through its pipeline and returns the response.
    ///
    /// This is what the server calls for every request; it is public so the
    /// whole application can be exercised in-process.
    pub async fn call(&self, mut req: Request) -> Response {
        let matched = self
            .routes
            .get(&req.method())
            .and_then(|tree| tree.at(req.path()).ok())
            .map(|m| {
                let params: HashMap<String, String> = m.params.iter()
                    .map(|(k, v)| (k.to_owned(), v.to_owned()))
                    .collect();
                (&self.endpoints[*m.value], params)
            });

        let chain = match matched {
            Some((endpoint, params)) => {
                req.matched(&endpoint.pattern, params);
                Arc::clone(&endpoint.chain)
            }
            None => Arc::clone(&self.fallback),
        };

        Next::start(chain).run(req).await
    }

    /// Router-wide stages changed: rebuild every assembled chain.
    fn reassemble(&mut self) {
        for endpoint in &mut self.endpoints {
            endpoint.chain = assemble(&self.global, &self.scoped, &endpoint.pattern, &endpoint.route);
        }
        self.fallback = self.global.clone().into_chain(not_found.into_boxed_handler());
    }
}

/// Global stages, then middleware scoped over `pattern`, then the route's own.
fn assemble(global: &Pipeline, scoped: &[(String, Pipeline)], pattern: &str, route: &Route) -> Arc<Chain> {
    let mut pipeline = global.clone();
    for (_, stages) in scoped.iter().filter(|(prefix, _)| covers(prefix, pattern)) {
        pipeline.merge(stages);
    }
    pipeline.merge(&route.pipeline);
    pipeline.into_chain(Arc::clone(&route.handler))
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}

fn covers(prefix: &str, path: &str) -> bool {
    prefix.is_empty()
        || path == prefix
        || path.strip_prefix(prefix).is_some_and(|rest| rest.starts_with('/'))
}

async fn not_found(req: Request) -> HttpException {
    HttpException::not_found(format!("Cannot {} {}", req.method(), req.path()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::from_fn;
    use crate::status::Status;

    async fn show(req: Request) -> String {
        format!("{} {}", req.route().unwrap_or("-"), req.param("id").unwrap_or("-"))
    }

    #[test]
    fn prefix_matching_is_segment_wise() {
        assert!(covers("/cats", "/cats"));
        assert!(covers("/cats", "/cats/cat/1"));
        assert!(!covers("/cats", "/catsup"));
        assert!(covers("", "/anything"));
    }

    #[tokio::test]
    async fn fills_route_and_params() {
        let router = Router::new().on(Method::Get, "/cats/cat/{id}", show);
        let resp = router.call(Request::builder(Method::Get, "/cats/cat/7").build()).await;
        assert_eq!(resp.body(), b"/cats/cat/{id} 7");
    }

    #[tokio::test]
    async fn unknown_route_is_404_with_method_and_path() {
        let router = Router::new().on(Method::Get, "/cats", show);
        let resp = router.call(Request::builder(Method::Post, "/dogs").build()).await;
        assert_eq!(resp.status_code(), Status::NotFound);
        assert_eq!(resp.exception().unwrap().message(), "Cannot POST /dogs");
    }

    #[tokio::test]
    async fn middleware_added_after_a_route_still_wraps_it() {
        let stamp = |req: Request, next: Next| async move {
            let mut resp = next.run(req).await;
            resp.set_header("x-stamped", "yes");
            resp
        };
        let router = Router::new()
            .on(Method::Get, "/cats/cat/{id}", show)
            .middleware("/cats", from_fn(stamp));

        for _ in 0..2 {
            let resp = router.call(Request::builder(Method::Get, "/cats/cat/1").build()).await;
            assert_eq!(resp.header("x-stamped"), Some("yes"));
            assert_eq!(resp.body(), b"/cats/cat/{id} 1");
        }
    }

    #[tokio::test]
    async fn dispatch_reuses_the_assembled_chain() {
        let router = Router::new().on(Method::Get, "/cats", show);
        let chain = Arc::clone(&router.endpoints[0].chain);

        router.call(Request::builder(Method::Get, "/cats").build()).await;
        router.call(Request::builder(Method::Get, "/cats").build()).await;

        assert!(Arc::ptr_eq(&chain, &router.endpoints[0].chain));
        // Only the router and this test hold it once requests are done.
        assert_eq!(Arc::strong_count(&chain), 2);
    }

    #[test]
    fn router_wide_stages_reassemble_existing_routes() {
        let router = Router::new().on(Method::Get, "/cats", show);
        let before = Arc::clone(&router.endpoints[0].chain);
        let router = router.middleware("/cats", from_fn(|req, next: Next| next.run(req)));
        assert!(!Arc::ptr_eq(&before, &router.endpoints[0].chain));
    }

    #[test]
    #[should_panic(expected = "invalid route")]
    fn conflicting_routes_panic() {
        let _ = Router::new()
            .on(Method::Get, "/cats/{id}", show)
            .on(Method::Get, "/cats/{name}", show);
    }
}
