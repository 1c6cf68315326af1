//! The ordered request pipeline.
//!
//! Every request that matches a route runs through one explicit, ordered list
//! of stages followed by the route's handler:
//!
//! ```text
//! filter → middleware → guard → interceptor (pre) → pipe → handler
//!                                                             ↓
//! filter (on error) ←──────────── interceptor (post) ←── response
//! ```
//!
//! Each stage implements [`Stage::process`]: it receives the request and a
//! [`Next`] continuation. Calling `next.run(req)` hands the request to the
//! following stage and resolves to the response once everything downstream
//! is done. Not calling it short-circuits the pipeline.
//!
//! The order between kinds is fixed by [`StageKind`], not by registration
//! order: a guard added before a middleware still runs after it. Within one
//! kind, stages run in the order they were added.

use std::sync::Arc;

use crate::filter::{ExceptionFilter, FilterStage};
use crate::guard::{Guard, GuardStage};
use crate::handler::{BoxFuture, BoxedHandler};
use crate::interceptor::{Interceptor, InterceptorStage};
use crate::middleware::{Middleware, MiddlewareStage};
use crate::pipe::{BodyPipe, PipeStage};
use crate::request::Request;
use crate::response::Response;

/// Where a stage sits in the pipeline. Variants are declared outermost first.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum StageKind {
    Filter,
    Middleware,
    Guard,
    Interceptor,
    Pipe,
}

/// The capability shared by every pipeline stage.
pub trait Stage: Send + Sync + 'static {
    fn process<'a>(&'a self, req: Request, next: Next) -> BoxFuture<'a, Response>;
}

pub(crate) type BoxedStage = Arc<dyn Stage>;

/// A fully assembled pipeline: its stages in run order plus the handler.
pub(crate) struct Chain {
    stages: Vec<BoxedStage>,
    endpoint: BoxedHandler,
}

/// The continuation handed to each stage.
#[derive(Clone)]
pub struct Next {
    chain: Arc<Chain>,
    index: usize,
}

impl Next {
    pub(crate) fn start(chain: Arc<Chain>) -> Self {
        Self { chain, index: 0 }
    }

    /// Runs the rest of the pipeline with `req`.
    pub fn run(self, req: Request) -> BoxFuture<'static, Response> {
        Box::pin(async move {
            let Next { chain, index } = self;
            match chain.stages.get(index) {
                Some(stage) => {
                    let next = Next { chain: Arc::clone(&chain), index: index + 1 };
                    stage.process(req, next).await
                }
                None => chain.endpoint.call(req).await,
            }
        })
    }
}

/// An ordered list of stages, kept sorted by [`StageKind`].
#[derive(Clone, Default)]
pub struct Pipeline {
    stages: Vec<(StageKind, BoxedStage)>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `stage` after every stage of the same or an outer kind.
    pub fn stage(mut self, kind: StageKind, stage: impl Stage) -> Self {
        self.insert(kind, Arc::new(stage));
        self
    }

    pub fn middleware(self, middleware: impl Middleware) -> Self {
        self.stage(StageKind::Middleware, MiddlewareStage(middleware))
    }

    pub fn guard(self, guard: impl Guard) -> Self {
        self.stage(StageKind::Guard, GuardStage(guard))
    }

    pub fn interceptor(self, interceptor: impl Interceptor) -> Self {
        self.stage(StageKind::Interceptor, InterceptorStage(interceptor))
    }

    pub fn pipe(self, pipe: impl BodyPipe) -> Self {
        self.stage(StageKind::Pipe, PipeStage(pipe))
    }

    pub fn filter(self, filter: impl ExceptionFilter) -> Self {
        self.stage(StageKind::Filter, FilterStage(filter))
    }

    /// Stage kinds in run order.
    pub fn kinds(&self) -> Vec<StageKind> {
        self.stages.iter().map(|(k, _)| *k).collect()
    }

    pub fn len(&self) -> usize { self.stages.len() }
    pub fn is_empty(&self) -> bool { self.stages.is_empty() }

    pub(crate) fn insert(&mut self, kind: StageKind, stage: BoxedStage) {
        let at = self.stages.partition_point(|(k, _)| *k <= kind);
        self.stages.insert(at, (kind, stage));
    }

    /// Merges `other` into `self`; on ties, stages already in `self` run first.
    pub(crate) fn merge(&mut self, other: &Pipeline) {
        for (kind, stage) in &other.stages {
            self.insert(*kind, Arc::clone(stage));
        }
    }

    pub(crate) fn into_chain(self, endpoint: BoxedHandler) -> Arc<Chain> {
        Arc::new(Chain {
            stages: self.stages.into_iter().map(|(_, s)| s).collect(),
            endpoint,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guard::AuthGuard;
    use crate::handler::Handler;
    use crate::interceptor::LoggingInterceptor;
    use crate::method::Method;
    use crate::middleware::logger::LoggerMiddleware;

    struct Tag(&'static str);

    impl Stage for Tag {
        fn process<'a>(&'a self, mut req: Request, next: Next) -> BoxFuture<'a, Response> {
            Box::pin(async move {
                let seen = req.header("x-seen").unwrap_or_default().to_owned();
                let value = format!("{seen}{}", self.0);
                req.headers_mut().insert("x-seen", value.parse().unwrap());
                next.run(req).await
            })
        }
    }

    async fn echo_seen(req: Request) -> String {
        req.header("x-seen").unwrap_or_default().to_owned()
    }

    #[test]
    fn kinds_are_sorted_regardless_of_registration_order() {
        let p = Pipeline::new()
            .interceptor(LoggingInterceptor)
            .guard(AuthGuard)
            .middleware(LoggerMiddleware);
        assert_eq!(
            p.kinds(),
            vec![StageKind::Middleware, StageKind::Guard, StageKind::Interceptor]
        );
    }

    #[tokio::test]
    async fn stages_of_one_kind_keep_registration_order() {
        let p = Pipeline::new()
            .stage(StageKind::Pipe, Tag("p"))
            .stage(StageKind::Middleware, Tag("a"))
            .stage(StageKind::Middleware, Tag("b"))
            .stage(StageKind::Guard, Tag("g"));
        let chain = p.into_chain(echo_seen.into_boxed_handler());
        let resp = Next::start(chain).run(Request::builder(Method::Get, "/").build()).await;
        assert_eq!(resp.body(), b"abgp");
    }

    #[tokio::test]
    async fn empty_pipeline_calls_the_handler() {
        let chain = Pipeline::new().into_chain(echo_seen.into_boxed_handler());
        let resp = Next::start(chain).run(Request::builder(Method::Get, "/").build()).await;
        assert!(resp.body().is_empty());
    }

    #[test]
    fn merge_keeps_existing_stages_first_on_ties() {
        let mut global = Pipeline::new().stage(StageKind::Middleware, Tag("g"));
        let route = Pipeline::new()
            .stage(StageKind::Guard, Tag("r1"))
            .stage(StageKind::Middleware, Tag("r2"));
        global.merge(&route);
        assert_eq!(
            global.kinds(),
            vec![StageKind::Middleware, StageKind::Middleware, StageKind::Guard]
        );
    }
}
