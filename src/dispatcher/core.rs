use http::{Method, Request, Response};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::config::DispatcherConfig;
use crate::context::{Context, ContextPool};
use crate::error::{Error, RouteError};
use crate::handler::Handler;
use crate::middleware::{middleware_fn, Chain, Health, Middleware, Next};
use crate::router::{Router, RouterStage};
use crate::server::{RawWriter, ResponseRecorder};

/// Receives errors returned from the middleware chain.
pub trait ErrorHandler: Send + Sync {
    fn handle(&self, ctx: &mut Context, err: Error);
}

impl<F> ErrorHandler for F
where
    F: Fn(&mut Context, Error) + Send + Sync,
{
    fn handle(&self, ctx: &mut Context, err: Error) {
        self(ctx, err)
    }
}

/// Logs the error and, when nothing was sent yet, answers with the error's status.
struct DefaultErrorHandler;

impl ErrorHandler for DefaultErrorHandler {
    fn handle(&self, ctx: &mut Context, err: Error) {
        let status = err.status();
        error!(
            method = %ctx.method(),
            path = %ctx.path(),
            status = status.as_u16(),
            error = %err,
            "Request failed"
        );
        if ctx.is_committed() {
            return;
        }
        let text = status.canonical_reason().unwrap_or("Error");
        if let Err(e) = ctx.string(status.as_u16(), text) {
            warn!(error = %e, "Failed to write error response");
        }
    }
}

/// Request dispatcher: route table, middleware chain and context pool.
pub struct Dispatcher {
    config: Arc<DispatcherConfig>,
    router: Arc<Router>,
    middlewares: Vec<Arc<dyn Middleware>>,
    not_found: Option<Arc<dyn Handler>>,
    error_handler: Arc<dyn ErrorHandler>,
    chain: Chain,
    pool: ContextPool,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(DispatcherConfig::default())
    }
}

impl Dispatcher {
    /// Create a dispatcher with no routes and no middleware.
    #[must_use]
    pub fn new(config: DispatcherConfig) -> Self {
        let config = Arc::new(config);
        let mut dispatcher = Self {
            pool: ContextPool::new(Arc::clone(&config)),
            config,
            router: Arc::new(Router::new()),
            middlewares: Vec::new(),
            not_found: None,
            error_handler: Arc::new(DefaultErrorHandler),
            chain: Chain::default(),
        };
        let logger = dispatcher.config.logger.clone();
        logger.in_scope(|| dispatcher.rebuild());
        dispatcher
    }

    fn rebuild(&mut self) {
        let stage: Arc<dyn Middleware> = Arc::new(RouterStage::new(
            Arc::clone(&self.router),
            self.not_found.clone(),
        ));
        let mut links = self.middlewares.clone();
        links.push(stage);
        self.chain = Chain::build(&links);
        debug!(
            middleware_count = self.middlewares.len(),
            routes = self.router.len(),
            "Middleware chain rebuilt"
        );
    }

    /// Mutate the route table. The chain holds the only other reference to the
    /// router, so dropping it first keeps `make_mut` from cloning the tree.
    fn with_router<T>(&mut self, f: impl FnOnce(&mut Router) -> T) -> T {
        self.chain = Chain::default();
        let config = Arc::clone(&self.config);
        let out = config
            .logger
            .in_scope(|| f(Arc::make_mut(&mut self.router)));
        config.logger.in_scope(|| self.rebuild());
        out
    }

    // ---- middleware ----------------------------------------------------------

    /// Append middleware. It runs after everything added before it and always
    /// before the router.
    pub fn use_middleware<M: Middleware + 'static>(&mut self, middleware: M) {
        self.use_shared(Arc::new(middleware));
    }

    /// Like [`Dispatcher::use_middleware`], for middleware already behind an `Arc`
    /// (e.g. a [`MetricsMiddleware`](crate::middleware::MetricsMiddleware) the
    /// caller keeps reading).
    pub fn use_shared(&mut self, middleware: Arc<dyn Middleware>) {
        self.middlewares.push(middleware);
        let config = Arc::clone(&self.config);
        config.logger.in_scope(|| self.rebuild());
    }

    /// Append a closure as middleware.
    pub fn use_fn<F>(&mut self, f: F)
    where
        F: Fn(&mut Context, Next<'_>) -> Result<(), Error> + Send + Sync + 'static,
    {
        self.use_middleware(middleware_fn(f));
    }

    /// Append a [`Health`] probe at the configured `health_path`.
    pub fn use_health(&mut self) {
        let health = Health::with_path(self.config.health_path.clone());
        self.use_middleware(health);
    }

    /// Number of middleware registered, the router stage excluded.
    pub fn middleware_count(&self) -> usize {
        self.middlewares.len()
    }

    // ---- routes --------------------------------------------------------------

    /// Register `handler` for `method` at `path`, reporting malformed patterns.
    pub fn try_add<H: Handler + 'static>(
        &mut self,
        method: Method,
        path: &str,
        handler: H,
    ) -> Result<(), RouteError> {
        self.with_router(|router| router.try_add(method, path, handler))
    }

    /// Register `handler` for `method` at `path`.
    ///
    /// # Panics
    ///
    /// Panics on a malformed pattern or an unsupported method, like
    /// [`Router::add`].
    pub fn add<H: Handler + 'static>(&mut self, method: Method, path: &str, handler: H) {
        self.with_router(|router| router.add(method, path, handler));
    }

    pub fn get<H: Handler + 'static>(&mut self, path: &str, handler: H) {
        self.add(Method::GET, path, handler);
    }

    pub fn post<H: Handler + 'static>(&mut self, path: &str, handler: H) {
        self.add(Method::POST, path, handler);
    }

    pub fn put<H: Handler + 'static>(&mut self, path: &str, handler: H) {
        self.add(Method::PUT, path, handler);
    }

    pub fn delete<H: Handler + 'static>(&mut self, path: &str, handler: H) {
        self.add(Method::DELETE, path, handler);
    }

    pub fn patch<H: Handler + 'static>(&mut self, path: &str, handler: H) {
        self.add(Method::PATCH, path, handler);
    }

    pub fn options<H: Handler + 'static>(&mut self, path: &str, handler: H) {
        self.add(Method::OPTIONS, path, handler);
    }

    pub fn head<H: Handler + 'static>(&mut self, path: &str, handler: H) {
        self.add(Method::HEAD, path, handler);
    }

    pub fn connect<H: Handler + 'static>(&mut self, path: &str, handler: H) {
        self.add(Method::CONNECT, path, handler);
    }

    pub fn trace<H: Handler + 'static>(&mut self, path: &str, handler: H) {
        self.add(Method::TRACE, path, handler);
    }

    /// Register one handler for GET, POST, PUT, DELETE, PATCH, OPTIONS and HEAD.
    pub fn all<H: Handler + 'static>(&mut self, path: &str, handler: H) {
        self.with_router(|router| router.all(path, handler));
    }

    /// Handler run when no route matches, instead of the built-in 404/405.
    pub fn set_not_found<H: Handler + 'static>(&mut self, handler: H) {
        self.not_found = Some(Arc::new(handler));
        let config = Arc::clone(&self.config);
        config.logger.in_scope(|| self.rebuild());
    }

    /// Replace the handler that receives errors returned from the chain.
    pub fn set_error_handler<E: ErrorHandler + 'static>(&mut self, handler: E) {
        self.error_handler = Arc::new(handler);
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// Contexts idle in the pool.
    pub fn pool_idle(&self) -> usize {
        self.pool.idle()
    }

    /// Log the routing table at `info` level through the configured logger.
    pub fn log_summary(&self) {
        self.config.logger.in_scope(|| {
            self.router.log_summary();
            info!(
                middleware_count = self.middlewares.len(),
                max_request_body_size = self.config.max_request_body_size,
                pool_max_idle = self.config.pool_max_idle,
                "Dispatcher ready"
            );
        });
    }

    // ---- serving -------------------------------------------------------------

    /// Run one request through the chain, writing the response to `raw`.
    pub fn serve(&self, request: Request<Vec<u8>>, raw: Box<dyn RawWriter>) {
        self.config.logger.in_scope(|| {
            let mut ctx = self.pool.acquire();
            ctx.reset(request, raw);
            if let Err(err) = self.chain.run(&mut ctx) {
                self.error_handler.handle(&mut ctx, err);
            }
            if let Err(err) = ctx.writer_mut().finish() {
                warn!(error = %err, "Failed to finish response");
            }
        });
    }

    /// Run one request and collect the response in memory.
    pub fn handle(&self, request: Request<Vec<u8>>) -> Response<Vec<u8>> {
        let recorder = ResponseRecorder::new();
        self.serve(request, Box::new(recorder.clone()));
        recorder.to_response()
    }
}
