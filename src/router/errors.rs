//! Status-code error handlers.
//!
//! The registry answers requests that did not end in a normal handler
//! response: unmatched methods and paths (404), failing or panicking handlers
//! (500) and anything a handler raised with `ctx.emit_error(status)`.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{error, warn};

use crate::context::Context;
use crate::error::{Result, RouterError};
use crate::handler::{BoxHandler, Handler};

/// Body of the built-in 404 handler.
pub const NOT_FOUND_TEXT: &str = "Not Found";

/// Body of the built-in 500 handler.
pub const INTERNAL_ERROR_TEXT: &str = "The server encountered an unexpected condition which prevented it from fulfilling the request.";

/// Built-in handler writing a fixed plain-text body.
struct DefaultText(&'static str);

impl Handler for DefaultText {
    fn handle(&self, ctx: &mut Context) -> anyhow::Result<()> {
        let status = ctx.response().status();
        ctx.text(status, self.0);
        Ok(())
    }
}

/// Text written for `status` when no handler takes care of it.
fn fallback_text(status: u16) -> &'static str {
    match status {
        404 => NOT_FOUND_TEXT,
        500 => INTERNAL_ERROR_TEXT,
        _ => http::StatusCode::from_u16(status)
            .ok()
            .and_then(|code| code.canonical_reason())
            .unwrap_or("Error"),
    }
}

/// Maps status codes to the handler that renders them.
///
/// A fresh registry already answers 404 and 500. Registering a handler for a
/// status replaces the previous one.
pub struct ErrorRegistry {
    handlers: HashMap<u16, BoxHandler>,
}

impl Default for ErrorRegistry {
    fn default() -> Self {
        let mut handlers: HashMap<u16, BoxHandler> = HashMap::new();
        handlers.insert(404, Arc::new(DefaultText(NOT_FOUND_TEXT)));
        handlers.insert(500, Arc::new(DefaultText(INTERNAL_ERROR_TEXT)));
        Self { handlers }
    }
}

impl ErrorRegistry {
    /// Registry with the built-in 404 and 500 handlers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `handler` to `status`, replacing any previous handler.
    ///
    /// # Errors
    ///
    /// [`RouterError::InvalidStatus`] unless `status` is in `400..=599`.
    pub fn register<H: Handler>(&mut self, status: u16, handler: H) -> Result<()> {
        self.register_shared(status, Arc::new(handler))
    }

    /// [`ErrorRegistry::register`] for an already shared handler.
    ///
    /// # Errors
    ///
    /// [`RouterError::InvalidStatus`] unless `status` is in `400..=599`.
    pub fn register_shared(&mut self, status: u16, handler: BoxHandler) -> Result<()> {
        if !(400..=599).contains(&status) {
            return Err(RouterError::InvalidStatus(status));
        }
        self.set(status, handler);
        Ok(())
    }

    pub(crate) fn set(&mut self, status: u16, handler: BoxHandler) {
        self.handlers.insert(status, handler);
    }

    /// `true` when a handler is bound to `status`.
    #[must_use]
    pub fn contains(&self, status: u16) -> bool {
        self.handlers.contains_key(&status)
    }

    /// Answer `ctx` with the handler bound to `status`.
    ///
    /// Anything the chain wrote before is discarded. Statuses without a
    /// handler get a plain-text body with the status' reason phrase. If the
    /// error handler itself fails or panics, the plain-text fallback is
    /// written instead.
    pub fn emit(&self, status: u16, ctx: &mut Context) {
        ctx.reset_response();
        ctx.set_status(status);

        let Some(handler) = self.handlers.get(&status) else {
            ctx.text(status, fallback_text(status));
            return;
        };

        match catch_unwind(AssertUnwindSafe(|| handler.handle(ctx))) {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                warn!(status, error = %err, path = %ctx.path(), "Error handler failed");
                ctx.reset_response();
                ctx.text(status, fallback_text(status));
            }
            Err(_) => {
                error!(status, path = %ctx.path(), "Error handler panicked");
                ctx.reset_response();
                ctx.text(status, fallback_text(status));
            }
        }
    }
}

impl std::fmt::Debug for ErrorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut statuses: Vec<&u16> = self.handlers.keys().collect();
        statuses.sort_unstable();
        f.debug_struct("ErrorRegistry")
            .field("statuses", &statuses)
            .finish()
    }
}
