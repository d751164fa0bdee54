//! # Handler Module
//!
//! A handler is anything that can act on a [`Context`]: route handlers,
//! middleware and error handlers all share the same contract.
//!
//! ## Contract
//!
//! - Handlers of a chain run in registration order on the same context
//! - `ctx.stop()` ends the chain without touching the response
//! - `ctx.emit_error(status)` ends the chain and lets the router dispatch
//!   `status` through its error registry
//! - Returning `Err` is a fatal signal: the chain ends and the 500 handler fires
//! - A panic is caught at the dispatch boundary and also fires the 500 handler
//!
//! ## Example
//!
//! ```rust
//! use bramble::{Context, Registrar, Router};
//!
//! let mut router = Router::new();
//! router
//!     .get("/users/:id", |ctx: &mut Context| {
//!         let id = ctx.param("id").unwrap_or_default().to_string();
//!         ctx.text(200, format!("user {id}"));
//!         Ok(())
//!     })
//!     .unwrap();
//! ```

use std::fmt;
use std::sync::Arc;

use crate::context::Context;

/// A request handler.
///
/// Implemented for every `Fn(&mut Context) -> anyhow::Result<()>` closure that
/// is `Send + Sync + 'static`. Implement it by hand for handlers that carry
/// state, such as [`StaticFiles`](crate::static_files::StaticFiles).
pub trait Handler: Send + Sync + 'static {
    /// Act on the request held by `ctx`.
    ///
    /// # Errors
    ///
    /// Any error aborts the chain and is answered with the registered 500
    /// handler.
    fn handle(&self, ctx: &mut Context) -> anyhow::Result<()>;
}

impl<F> Handler for F
where
    F: Fn(&mut Context) -> anyhow::Result<()> + Send + Sync + 'static,
{
    fn handle(&self, ctx: &mut Context) -> anyhow::Result<()> {
        self(ctx)
    }
}

/// Shared, type-erased handler.
pub type BoxHandler = Arc<dyn Handler>;

/// Ordered handler chain applied to a route.
#[derive(Clone, Default)]
pub struct HandlerChain {
    handlers: Vec<BoxHandler>,
}

impl HandlerChain {
    /// Create an empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a handler to the end of the chain.
    pub fn push<H: Handler>(&mut self, handler: H) {
        self.handlers.push(Arc::new(handler));
    }

    /// Append a closure to the end of the chain.
    pub fn push_fn<F>(&mut self, f: F)
    where
        F: Fn(&mut Context) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.handlers.push(Arc::new(f));
    }

    /// Append an already shared handler.
    pub fn push_shared(&mut self, handler: BoxHandler) {
        self.handlers.push(handler);
    }

    /// Builder-style [`HandlerChain::push_fn`].
    #[must_use]
    pub fn then<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Context) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.push_fn(f);
        self
    }

    /// Builder-style [`HandlerChain::push`].
    #[must_use]
    pub fn then_handler<H: Handler>(mut self, handler: H) -> Self {
        self.push(handler);
        self
    }

    /// Return a chain made of `prefix` followed by this chain.
    #[must_use]
    pub fn prepended(&self, prefix: &[BoxHandler]) -> Self {
        let mut handlers = Vec::with_capacity(prefix.len() + self.handlers.len());
        handlers.extend(prefix.iter().cloned());
        handlers.extend(self.handlers.iter().cloned());
        Self { handlers }
    }

    /// Number of handlers in the chain.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// `true` when the chain holds no handler.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Run the chain in order until it ends or a handler stops it.
    ///
    /// # Errors
    ///
    /// Returns the first error produced by a handler; later handlers are
    /// not run.
    pub fn run(&self, ctx: &mut Context) -> anyhow::Result<()> {
        for handler in &self.handlers {
            if ctx.is_stopped() {
                break;
            }
            handler.handle(ctx)?;
        }
        Ok(())
    }
}

impl fmt::Debug for HandlerChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerChain")
            .field("len", &self.handlers.len())
            .finish()
    }
}

impl FromIterator<BoxHandler> for HandlerChain {
    fn from_iter<I: IntoIterator<Item = BoxHandler>>(iter: I) -> Self {
        Self {
            handlers: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Request;
    use http::Method;

    fn ctx() -> Context {
        let mut ctx = Context::new();
        ctx.reset(Request::new(Method::GET, "/"));
        ctx
    }

    #[test]
    fn test_chain_runs_in_order() {
        let chain = HandlerChain::new()
            .then(|ctx: &mut Context| {
                ctx.write(b"a");
                Ok(())
            })
            .then(|ctx: &mut Context| {
                ctx.write(b"b");
                Ok(())
            });
        let mut ctx = ctx();
        chain.run(&mut ctx).unwrap();
        assert_eq!(ctx.response().body(), b"ab");
    }

    #[test]
    fn test_chain_stops() {
        let chain = HandlerChain::new()
            .then(|ctx: &mut Context| {
                ctx.write(b"a");
                ctx.stop();
                Ok(())
            })
            .then(|ctx: &mut Context| {
                ctx.write(b"b");
                Ok(())
            });
        let mut ctx = ctx();
        chain.run(&mut ctx).unwrap();
        assert_eq!(ctx.response().body(), b"a");
    }

    #[test]
    fn test_chain_error_short_circuits() {
        let chain = HandlerChain::new()
            .then(|_ctx: &mut Context| Err(anyhow::anyhow!("boom")))
            .then(|ctx: &mut Context| {
                ctx.write(b"unreachable");
                Ok(())
            });
        let mut ctx = ctx();
        assert!(chain.run(&mut ctx).is_err());
        assert!(ctx.response().body().is_empty());
    }

    #[test]
    fn test_prepended() {
        let mw: BoxHandler = Arc::new(|ctx: &mut Context| -> anyhow::Result<()> {
            ctx.write(b"mw;");
            Ok(())
        });
        let chain = HandlerChain::new()
            .then(|ctx: &mut Context| {
                ctx.write(b"route");
                Ok(())
            })
            .prepended(&[mw]);
        assert_eq!(chain.len(), 2);
        let mut ctx = ctx();
        chain.run(&mut ctx).unwrap();
        assert_eq!(ctx.response().body(), b"mw;route");
    }
}
