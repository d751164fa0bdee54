//! # Bramble
//!
//! **Bramble** is a trie-based HTTP request router with pooled request
//! contexts, host-aware routing and a coroutine transport built on `may`.
//!
//! ## Overview
//!
//! Given a request method and path, the router finds the single best route in
//! time proportional to the path length, binds its captures, and runs the
//! route's handler chain on a pooled [`Context`]. Requests that match nothing,
//! and handlers that fail or panic, are answered through a status-code
//! [`ErrorRegistry`].
//!
//! ## Architecture
//!
//! - **[`router`]** - radix trie, method trees, dispatch, domain routing, groups
//! - **[`context`]** - request/response values, per-request context and its pool
//! - **[`handler`]** - the handler contract and handler chains
//! - **[`static_files`]** - directory serving with strip levels
//! - **[`server`]** - `may_minihttp` adapter feeding [`Router::serve`]
//! - **[`config`]** - TOML and environment configuration
//! - **[`logging`]** - `tracing` subscriber setup for the binary
//! - **[`cli`]** - the `bramble` command line
//!
//! ### Request Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Client
//!     participant Server as server::RouterService
//!     participant Router as router::Router
//!     participant Trie as router::PathTrie
//!     participant Pool as context::ContextPool
//!     participant Chain as HandlerChain
//!     participant Errors as ErrorRegistry
//!
//!     Client->>Server: HTTP request
//!     Server->>Router: serve(Request)
//!     Router->>Trie: resolve(path or host+path)
//!     alt route found
//!         Router->>Pool: acquire(request)
//!         Router->>Chain: run(ctx)
//!         opt error, panic or emit_error
//!             Router->>Errors: emit(status, ctx)
//!         end
//!     else no route
//!         Router->>Pool: acquire(request)
//!         Router->>Errors: emit(404, ctx)
//!     end
//!     Router-->>Pool: release on drop
//!     Router-->>Server: Response
//!     Server-->>Client: HTTP response
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use bramble::{Context, Registrar, Request, Router};
//! use http::Method;
//!
//! let mut router = Router::new();
//! router
//!     .get("/users/new", |ctx: &mut Context| {
//!         ctx.text(200, "form");
//!         Ok(())
//!     })
//!     .unwrap();
//! router
//!     .get("/users/:id", |ctx: &mut Context| {
//!         let id = ctx.param("id").unwrap_or_default().to_string();
//!         ctx.json(200, &serde_json::json!({ "id": id }))?;
//!         Ok(())
//!     })
//!     .unwrap();
//!
//! assert_eq!(router.serve(Request::new(Method::GET, "/users/new")).body_text(), "form");
//! assert_eq!(
//!     router.serve(Request::new(Method::GET, "/users/42")).body_text(),
//!     r#"{"id":"42"}"#
//! );
//! assert_eq!(router.serve(Request::new(Method::PATCH, "/users/42")).status(), 404);
//! ```
//!
//! Serving it over HTTP:
//!
//! ```rust,no_run
//! use bramble::server::{HttpServer, RouterService};
//! use bramble::Router;
//! use std::sync::Arc;
//!
//! let router = Arc::new(Router::new());
//! let handle = HttpServer(RouterService::new(router)).start("0.0.0.0:8080")?;
//! handle.join().ok();
//! # Ok::<(), std::io::Error>(())
//! ```
//!
//! ## Concurrency
//!
//! Registration needs `&mut Router` and must finish before the router is
//! shared; serving only needs `&Router`. Trees are read-only while serving and
//! each tree's context pool is internally synchronised, so no external locking
//! is required.

pub mod cli;
pub mod config;
pub mod context;
pub mod error;
pub mod handler;
pub mod ids;
pub mod logging;
pub mod router;
pub mod server;
pub mod static_files;

pub use config::{RouterConfig, StaticMount};
pub use context::{Context, ContextPool, PooledContext, Request, Response};
pub use error::{Result, RouterError};
pub use handler::{BoxHandler, Handler, HandlerChain};
pub use ids::RequestId;
pub use router::{
    ErrorRegistry, MethodMatch, Party, PathMode, PathTrie, Registrar, Route, Router,
};
pub use static_files::StaticFiles;
