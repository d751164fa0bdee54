//! # Context Module
//!
//! Per-request state and its reuse pool.
//!
//! ## Overview
//!
//! - [`Request`] is what the transport hands to the router
//! - [`Context`] carries the request, the captured path parameters, typed
//!   values shared between handlers and the [`Response`] being written
//! - [`ContextPool`] recycles contexts so the hot path does not allocate a
//!   fresh one per request
//!
//! ## Lifecycle
//!
//! ```text
//! acquire(request) ──► reset(request) ──► handler chain ──► drop guard ──► clear() ──► idle
//! ```
//!
//! A context is owned by exactly one in-flight request. Release happens in the
//! guard's `Drop`, so every exit path (including a panicking handler) returns
//! it to the pool with no request data left behind.

mod core;
mod pool;

pub use self::core::{
    Context, HeaderVec, ParamVec, Request, Response, MAX_INLINE_HEADERS, MAX_INLINE_PARAMS,
};
pub use pool::{ContextPool, PoolMetrics, PooledContext};
