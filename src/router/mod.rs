//! # Router Module
//!
//! URL-to-handler resolution and dispatch.
//!
//! ## Overview
//!
//! - [`PathTrie`] is a radix trie holding the routes of one method tree and
//!   resolving request paths with static → param → wildcard priority and
//!   backtracking
//! - [`Garden`] is the ordered list of method trees; each [`Tree`] owns a
//!   trie and the [`ContextPool`](crate::context::ContextPool) its requests
//!   are served from
//! - [`Router`] picks trees by method, resolves, runs handler chains and
//!   answers failures through its [`ErrorRegistry`]
//! - [`Party`] groups registrations under a shared prefix and middleware
//!
//! ## Domain routing
//!
//! A router built with [`Router::domain`] accepts host routes. Those live in
//! their own trees and are matched against `host + path`, so virtual hosts
//! need no second lookup dimension. A host containing `/` can therefore
//! collide with path text of another host's routes; hosts are used verbatim
//! and are not validated.
//!
//! ## Example
//!
//! ```rust
//! use bramble::{Context, HandlerChain, Registrar, Request, Router};
//! use http::Method;
//!
//! let mut router = Router::domain();
//! router
//!     .get("/users/:id", |ctx: &mut Context| {
//!         let id = ctx.param("id").unwrap_or_default().to_string();
//!         ctx.text(200, id);
//!         Ok(())
//!     })
//!     .unwrap();
//! router
//!     .register_host(
//!         "admin.example.com",
//!         Method::GET,
//!         "/admin",
//!         HandlerChain::new().then(|ctx: &mut Context| {
//!             ctx.text(200, "admin");
//!             Ok(())
//!         }),
//!     )
//!     .unwrap();
//!
//! let res = router.serve(Request::new(Method::GET, "/users/42"));
//! assert_eq!(res.body_text(), "42");
//!
//! let res = router.serve(Request::new(Method::GET, "/admin").with_host("admin.example.com"));
//! assert_eq!(res.status(), 200);
//!
//! let res = router.serve(Request::new(Method::GET, "/admin").with_host("www.example.com"));
//! assert_eq!(res.status(), 404);
//! ```

mod core;
mod errors;
mod garden;
mod method;
mod party;
mod route;
mod trie;
#[cfg(test)]
mod performance_tests;

pub use self::core::{PathMode, Registrar, Router, ANY_METHODS};
pub use errors::{ErrorRegistry, INTERNAL_ERROR_TEXT, NOT_FOUND_TEXT};
pub use garden::{Garden, Tree};
pub use method::MethodMatch;
pub use party::Party;
pub use route::Route;
pub use trie::{Captures, PathTrie, Resolved};
