use http::Method;
use smallvec::SmallVec;
use std::any::Any;
use std::borrow::Cow;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use super::errors::ErrorRegistry;
use super::garden::{Garden, Tree};
use super::method::MethodMatch;
use super::party::Party;
use super::route::Route;
use crate::config::RouterConfig;
use crate::context::{Context, ContextPool, Request, Response, MAX_INLINE_PARAMS};
use crate::error::{Result, RouterError};
use crate::handler::{BoxHandler, Handler, HandlerChain};
use crate::static_files::StaticFiles;

/// Methods registered by [`Registrar::any`].
pub const ANY_METHODS: [Method; 9] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::DELETE,
    Method::PATCH,
    Method::HEAD,
    Method::OPTIONS,
    Method::CONNECT,
    Method::TRACE,
];

/// How the text matched against a tree is derived from a request.
///
/// Chosen once when the router is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PathMode {
    /// Match the request path as is.
    #[default]
    Identity,
    /// Host trees match `host + path`; plain trees still match the path.
    HostPrefixed,
}

impl PathMode {
    fn match_key(self, hosts: bool, request: &Request) -> Cow<'_, str> {
        match self {
            PathMode::HostPrefixed if hosts => {
                Cow::Owned(format!("{}{}", request.host(), request.path()))
            }
            _ => Cow::Borrowed(request.path()),
        }
    }
}

/// Route registration surface shared by [`Router`] and [`Party`].
pub trait Registrar {
    /// Register `chain` for `method` and `pattern`.
    ///
    /// # Errors
    ///
    /// [`RouterError::InvalidPattern`] or [`RouterError::RouteConflict`].
    fn handle(&mut self, method: Method, pattern: &str, chain: HandlerChain) -> Result<()>;

    /// Register a single-handler `GET` route.
    ///
    /// # Errors
    ///
    /// See [`Registrar::handle`].
    fn get<F>(&mut self, pattern: &str, f: F) -> Result<()>
    where
        F: Fn(&mut Context) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.handle(Method::GET, pattern, HandlerChain::new().then(f))
    }

    /// Register a single-handler `POST` route.
    ///
    /// # Errors
    ///
    /// See [`Registrar::handle`].
    fn post<F>(&mut self, pattern: &str, f: F) -> Result<()>
    where
        F: Fn(&mut Context) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.handle(Method::POST, pattern, HandlerChain::new().then(f))
    }

    /// Register a single-handler `PUT` route.
    ///
    /// # Errors
    ///
    /// See [`Registrar::handle`].
    fn put<F>(&mut self, pattern: &str, f: F) -> Result<()>
    where
        F: Fn(&mut Context) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.handle(Method::PUT, pattern, HandlerChain::new().then(f))
    }

    /// Register a single-handler `DELETE` route.
    ///
    /// # Errors
    ///
    /// See [`Registrar::handle`].
    fn delete<F>(&mut self, pattern: &str, f: F) -> Result<()>
    where
        F: Fn(&mut Context) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.handle(Method::DELETE, pattern, HandlerChain::new().then(f))
    }

    /// Register a single-handler `PATCH` route.
    ///
    /// # Errors
    ///
    /// See [`Registrar::handle`].
    fn patch<F>(&mut self, pattern: &str, f: F) -> Result<()>
    where
        F: Fn(&mut Context) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.handle(Method::PATCH, pattern, HandlerChain::new().then(f))
    }

    /// Register a single-handler `HEAD` route.
    ///
    /// # Errors
    ///
    /// See [`Registrar::handle`].
    fn head<F>(&mut self, pattern: &str, f: F) -> Result<()>
    where
        F: Fn(&mut Context) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.handle(Method::HEAD, pattern, HandlerChain::new().then(f))
    }

    /// Register a single-handler `OPTIONS` route.
    ///
    /// # Errors
    ///
    /// See [`Registrar::handle`].
    fn options<F>(&mut self, pattern: &str, f: F) -> Result<()>
    where
        F: Fn(&mut Context) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.handle(Method::OPTIONS, pattern, HandlerChain::new().then(f))
    }

    /// Register `f` for every method in [`ANY_METHODS`].
    ///
    /// # Errors
    ///
    /// Stops at the first failing method; methods registered before it stay
    /// registered.
    fn any<F>(&mut self, pattern: &str, f: F) -> Result<()>
    where
        F: Fn(&mut Context) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let handler: BoxHandler = Arc::new(f);
        for method in &ANY_METHODS {
            let chain: HandlerChain = std::iter::once(Arc::clone(&handler)).collect();
            self.handle(method.clone(), pattern, chain)?;
        }
        Ok(())
    }

    /// Serve files from `dir` under `request_prefix`.
    ///
    /// Registers `GET {request_prefix}/*filepath`. `strip_slashes` leading path
    /// segments are removed from the request path before it is mapped onto
    /// `dir`; see [`StaticFiles`].
    ///
    /// # Errors
    ///
    /// See [`Registrar::handle`].
    fn serve_static(
        &mut self,
        request_prefix: &str,
        dir: impl Into<PathBuf>,
        strip_slashes: usize,
    ) -> Result<()> {
        let pattern = format!("{}/*filepath", request_prefix.trim_end_matches('/'));
        let files = StaticFiles::new(dir, strip_slashes);
        self.handle(Method::GET, &pattern, HandlerChain::new().then_handler(files))
    }
}

/// Route matches slower than this are logged at `warn!`.
const SLOW_MATCH_US: u128 = 1000;

enum Lookup<'r> {
    Found {
        tree: &'r Tree,
        route: Arc<Route>,
        values: SmallVec<[String; MAX_INLINE_PARAMS]>,
    },
    NoPath(&'r Tree),
    NoMethod,
}

/// HTTP request router.
///
/// Build it, register routes, then share it (`Arc<Router>`) with the
/// transport. Registration takes `&mut self` and serving takes `&self`, so the
/// route table cannot change once requests are being served.
pub struct Router {
    garden: Garden,
    errors: ErrorRegistry,
    method_match: MethodMatch,
    path_mode: PathMode,
    middleware: Vec<BoxHandler>,
    fallback: ContextPool,
    pool_prewarm: usize,
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("garden", &self.garden)
            .field("errors", &self.errors)
            .field("method_match", &self.method_match)
            .field("path_mode", &self.path_mode)
            .field("middleware", &self.middleware.len())
            .field("pool_prewarm", &self.pool_prewarm)
            .finish_non_exhaustive()
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::with_path_mode(PathMode::Identity)
    }
}

impl Router {
    /// Router matching request paths only.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Router that also accepts host routes (see [`Router::register_host`]).
    #[must_use]
    pub fn domain() -> Self {
        Self::with_path_mode(PathMode::HostPrefixed)
    }

    /// Router built from `config`.
    #[must_use]
    pub fn with_config(config: &RouterConfig) -> Self {
        let mode = if config.domain_routing {
            PathMode::HostPrefixed
        } else {
            PathMode::Identity
        };
        let mut router = Self::with_path_mode(mode);
        router.method_match = config.method_match;
        router.pool_prewarm = config.pool_prewarm;
        router
    }

    fn with_path_mode(path_mode: PathMode) -> Self {
        Self {
            garden: Garden::new(),
            errors: ErrorRegistry::new(),
            method_match: MethodMatch::default(),
            path_mode,
            middleware: Vec::new(),
            fallback: ContextPool::new("fallback"),
            pool_prewarm: 0,
        }
    }

    // ----- registration -----

    /// Register `chain` for `method` and `pattern`.
    ///
    /// Router middleware registered so far runs before `chain`.
    ///
    /// # Errors
    ///
    /// - [`RouterError::InvalidPattern`] for a malformed pattern
    /// - [`RouterError::RouteConflict`] when the method and pattern are taken
    pub fn register(&mut self, method: Method, pattern: &str, chain: HandlerChain) -> Result<()> {
        self.add_route(method, None, pattern, chain)
    }

    /// Register a route that only matches requests addressed to `host`.
    ///
    /// The route is matched against `host + path`, so `host` is compared with
    /// the request's `Host` value exactly, port included.
    ///
    /// # Errors
    ///
    /// [`RouterError::DomainRoutingDisabled`] unless the router was built with
    /// [`Router::domain`] or a config enabling domain routing, plus the errors
    /// of [`Router::register`].
    pub fn register_host(
        &mut self,
        host: &str,
        method: Method,
        pattern: &str,
        chain: HandlerChain,
    ) -> Result<()> {
        if self.path_mode != PathMode::HostPrefixed {
            return Err(RouterError::DomainRoutingDisabled {
                host: host.to_string(),
            });
        }
        self.add_route(method, Some(host), pattern, chain)
    }

    pub(crate) fn add_route(
        &mut self,
        method: Method,
        host: Option<&str>,
        pattern: &str,
        chain: HandlerChain,
    ) -> Result<()> {
        let chain = chain.prepended(&self.middleware);
        let route = Arc::new(Route::new(method, host, pattern, chain)?);
        let tree = self
            .garden
            .plant(route.method(), host.is_some(), self.pool_prewarm);

        if let Err(err) = tree.trie_mut().insert(Arc::clone(&route)) {
            warn!(
                method = %route.method(),
                host = route.host().unwrap_or_default(),
                pattern = %route.pattern(),
                error = %err,
                "Route registration rejected"
            );
            return Err(err);
        }

        info!(
            method = %route.method(),
            host = route.host().unwrap_or_default(),
            pattern = %route.pattern(),
            params = ?route.param_names(),
            handlers = route.chain().len(),
            "Route registered"
        );
        Ok(())
    }

    /// Add router-wide middleware.
    ///
    /// Middleware is prepended to the chains of routes registered *after* this
    /// call; routes that already exist are not changed.
    pub fn middleware<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&mut Context) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.middleware.push(Arc::new(f));
        self
    }

    /// [`Router::middleware`] for a stateful handler.
    pub fn middleware_handler<H: Handler>(&mut self, handler: H) -> &mut Self {
        self.middleware.push(Arc::new(handler));
        self
    }

    /// Start a group of routes sharing `prefix` and the group's middleware.
    pub fn party(&mut self, prefix: &str) -> Party<'_> {
        Party::new(self, prefix)
    }

    /// Choose how request methods are compared with tree methods.
    pub fn set_method_match(&mut self, method_match: MethodMatch) -> &mut Self {
        self.method_match = method_match;
        self
    }

    // ----- error handlers -----

    /// Bind an error handler to `status`, replacing the previous one.
    ///
    /// # Errors
    ///
    /// [`RouterError::InvalidStatus`] unless `status` is a 4xx or 5xx code.
    pub fn on_error<F>(&mut self, status: u16, f: F) -> Result<()>
    where
        F: Fn(&mut Context) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.errors.register(status, f)
    }

    /// Replace the 404 handler.
    pub fn on_not_found<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&mut Context) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.errors.set(404, Arc::new(f));
        self
    }

    /// Replace the 500 handler, which also answers panicking handlers.
    pub fn on_panic<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&mut Context) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.errors.set(500, Arc::new(f));
        self
    }

    /// Answer `ctx` with the error handler bound to `status`.
    pub fn emit_error(&self, status: u16, ctx: &mut Context) {
        self.errors.emit(status, ctx);
    }

    // ----- introspection -----

    /// Method comparison in use.
    #[must_use]
    pub fn method_match(&self) -> MethodMatch {
        self.method_match
    }

    /// Path mode chosen at construction.
    #[must_use]
    pub fn path_mode(&self) -> PathMode {
        self.path_mode
    }

    /// The route table.
    #[must_use]
    pub fn garden(&self) -> &Garden {
        &self.garden
    }

    /// The error registry.
    #[must_use]
    pub fn errors(&self) -> &ErrorRegistry {
        &self.errors
    }

    /// Pool used for 404s when no tree serves the request method.
    #[must_use]
    pub fn fallback_pool(&self) -> &ContextPool {
        &self.fallback
    }

    /// All registered routes, tree by tree in registration order.
    pub fn routes(&self) -> impl Iterator<Item = &Arc<Route>> {
        self.garden.routes()
    }

    // ----- dispatch -----

    /// Serve one request.
    ///
    /// Never panics on behalf of a handler: failures become error responses
    /// and the context always goes back to its pool.
    pub fn serve(&self, request: Request) -> Response {
        let started = Instant::now();
        let lookup = self.locate(&request);
        let match_us = started.elapsed().as_micros();
        if match_us > SLOW_MATCH_US {
            warn!(
                method = %request.method(),
                host = %request.host(),
                path = %request.path(),
                match_us,
                "Slow route match"
            );
        }
        match lookup {
            Lookup::Found { tree, route, values } => {
                let mut ctx = tree.pool().acquire(request);
                ctx.bind_route(&route, values);
                self.run_chain(&route, &mut ctx);
                debug!(
                    request_id = %ctx.request_id(),
                    method = %ctx.method(),
                    path = %ctx.path(),
                    route_pattern = %route.pattern(),
                    status = ctx.response().status(),
                    match_us,
                    duration_us = started.elapsed().as_micros(),
                    "Request dispatched"
                );
                ctx.take_response()
            }
            Lookup::NoPath(tree) => self.not_found(tree.pool(), request, started),
            Lookup::NoMethod => self.not_found(&self.fallback, request, started),
        }
    }

    /// Host trees are tried before plain trees so a host route is never
    /// shadowed by a plain route registered earlier.
    fn locate(&self, request: &Request) -> Lookup<'_> {
        let mut first = None;
        let host_trees = self.garden.iter().filter(|tree| tree.hosts());
        let plain_trees = self.garden.iter().filter(|tree| !tree.hosts());
        for tree in host_trees.chain(plain_trees) {
            if !self.method_match.matches(tree.method(), request.method()) {
                continue;
            }
            first.get_or_insert(tree);
            let key = self.path_mode.match_key(tree.hosts(), request);
            let found = tree.trie().resolve(&key).map(|resolved| {
                let values: SmallVec<[String; MAX_INLINE_PARAMS]> =
                    resolved.values.iter().map(|v| (*v).to_string()).collect();
                (Arc::clone(resolved.route), values)
            });
            if let Some((route, values)) = found {
                return Lookup::Found { tree, route, values };
            }
        }
        match first {
            Some(tree) => Lookup::NoPath(tree),
            None => Lookup::NoMethod,
        }
    }

    fn not_found(&self, pool: &ContextPool, request: Request, started: Instant) -> Response {
        let mut ctx = pool.acquire(request);
        self.errors.emit(404, &mut ctx);
        debug!(
            request_id = %ctx.request_id(),
            method = %ctx.method(),
            host = %ctx.host(),
            path = %ctx.path(),
            pool = %pool.label(),
            duration_us = started.elapsed().as_micros(),
            "No route matched"
        );
        ctx.take_response()
    }

    fn run_chain(&self, route: &Route, ctx: &mut Context) {
        match catch_unwind(AssertUnwindSafe(|| route.chain().run(ctx))) {
            Ok(Ok(())) => {
                if let Some(status) = ctx.take_pending_error() {
                    debug!(
                        request_id = %ctx.request_id(),
                        route_pattern = %route.pattern(),
                        status,
                        "Handler emitted error status"
                    );
                    self.errors.emit(status, ctx);
                }
            }
            Ok(Err(err)) => {
                error!(
                    request_id = %ctx.request_id(),
                    method = %route.method(),
                    route_pattern = %route.pattern(),
                    error = %format!("{err:#}"),
                    "Handler failed"
                );
                self.errors.emit(500, ctx);
            }
            Err(panic) => {
                error!(
                    request_id = %ctx.request_id(),
                    method = %route.method(),
                    route_pattern = %route.pattern(),
                    panic_message = %panic_message(&*panic),
                    "Handler panicked"
                );
                self.errors.emit(500, ctx);
            }
        }
    }
}

impl Registrar for Router {
    fn handle(&mut self, method: Method, pattern: &str, chain: HandlerChain) -> Result<()> {
        self.register(method, pattern, chain)
    }
}

pub(super) fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}
