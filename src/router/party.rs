//! Route groups sharing a path prefix and middleware.

use http::Method;
use std::sync::Arc;

use super::core::{Registrar, Router};
use crate::context::Context;
use crate::error::Result;
use crate::handler::{BoxHandler, Handler, HandlerChain};

/// Registration handle for a group of routes.
///
/// Every pattern registered through a party is prefixed with the party's
/// prefix, and the party's middleware runs after the router middleware and
/// before the route handlers. Nested parties inherit both.
///
/// ```rust
/// use bramble::{Context, Registrar, Router};
///
/// let mut router = Router::new();
/// let mut api = router.party("/api");
/// api.middleware(|ctx: &mut Context| {
///     ctx.set_header("x-api", "1");
///     Ok(())
/// });
/// api.get("/users/:id", |ctx: &mut Context| {
///     let id = ctx.param("id").unwrap_or_default().to_string();
///     ctx.text(200, id);
///     Ok(())
/// })
/// .unwrap();
/// assert_eq!(router.routes().next().map(|r| r.pattern()), Some("/api/users/:id"));
/// ```
pub struct Party<'r> {
    router: &'r mut Router,
    prefix: String,
    middleware: Vec<BoxHandler>,
}

impl<'r> Party<'r> {
    pub(crate) fn new(router: &'r mut Router, prefix: &str) -> Self {
        Self {
            router,
            prefix: join_prefix("", prefix),
            middleware: Vec::new(),
        }
    }

    /// Full prefix of the group.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Add middleware to routes registered through this party afterwards.
    pub fn middleware<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&mut Context) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.middleware.push(Arc::new(f));
        self
    }

    /// [`Party::middleware`] for a stateful handler.
    pub fn middleware_handler<H: Handler>(&mut self, handler: H) -> &mut Self {
        self.middleware.push(Arc::new(handler));
        self
    }

    /// Nested group under `prefix`, inheriting this party's middleware.
    pub fn party(&mut self, prefix: &str) -> Party<'_> {
        Party {
            router: &mut *self.router,
            prefix: join_prefix(&self.prefix, prefix),
            middleware: self.middleware.clone(),
        }
    }
}

impl Registrar for Party<'_> {
    fn handle(&mut self, method: Method, pattern: &str, chain: HandlerChain) -> Result<()> {
        let pattern = format!("{}{}", self.prefix, pattern);
        self.router
            .add_route(method, None, &pattern, chain.prepended(&self.middleware))
    }
}

impl std::fmt::Debug for Party<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Party")
            .field("prefix", &self.prefix)
            .field("middleware", &self.middleware.len())
            .finish()
    }
}

/// `"/api" + "/v1/"` → `"/api/v1"`; the root prefix collapses to `""`.
fn join_prefix(parent: &str, prefix: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        return parent.to_string();
    }
    if prefix.starts_with('/') {
        format!("{parent}{prefix}")
    } else {
        format!("{parent}/{prefix}")
    }
}
