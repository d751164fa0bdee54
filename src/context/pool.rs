//! Reuse pool for [`Context`] objects.
//!
//! Every route tree owns one pool. A request acquires a context, the handler
//! chain runs on it, and the [`PooledContext`] guard hands it back when it is
//! dropped. Because release happens in `Drop`, a context also returns to its
//! pool when the chain unwinds from a panic.
//!
//! The pool never blocks waiting for capacity and never caps its size: when no
//! idle context is available a new one is created. The idle list sits behind a
//! short critical section, so callers need no external locking.

use parking_lot::Mutex;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

use super::core::{Context, Request};

/// Counters describing a pool's lifetime activity.
#[derive(Debug, Default)]
pub struct PoolMetrics {
    created: AtomicU64,
    acquired: AtomicU64,
    released: AtomicU64,
}

impl PoolMetrics {
    fn record_created(&self) {
        self.created.fetch_add(1, Ordering::Relaxed);
    }

    fn record_acquire(&self) {
        self.acquired.fetch_add(1, Ordering::Relaxed);
    }

    fn record_release(&self) {
        self.released.fetch_add(1, Ordering::Relaxed);
    }

    /// Contexts ever allocated by the pool.
    #[must_use]
    pub fn created(&self) -> u64 {
        self.created.load(Ordering::Relaxed)
    }

    /// Total acquisitions.
    #[must_use]
    pub fn acquired(&self) -> u64 {
        self.acquired.load(Ordering::Relaxed)
    }

    /// Total releases.
    #[must_use]
    pub fn released(&self) -> u64 {
        self.released.load(Ordering::Relaxed)
    }

    /// Contexts currently owned by in-flight requests.
    #[must_use]
    pub fn in_use(&self) -> u64 {
        self.acquired().saturating_sub(self.released())
    }
}

/// Pool of reusable request contexts.
#[derive(Debug)]
pub struct ContextPool {
    label: String,
    idle: Mutex<Vec<Context>>,
    metrics: PoolMetrics,
}

impl Default for ContextPool {
    fn default() -> Self {
        Self::new("default")
    }
}

impl ContextPool {
    /// Create an empty pool. `label` only shows up in logs.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            idle: Mutex::new(Vec::new()),
            metrics: PoolMetrics::default(),
        }
    }

    /// Allocate `count` idle contexts up front.
    pub fn prewarm(&self, count: usize) {
        if count == 0 {
            return;
        }
        let mut idle = self.idle.lock();
        idle.reserve(count);
        for _ in 0..count {
            self.metrics.record_created();
            idle.push(Context::new());
        }
        debug!(pool = %self.label, count, "Context pool prewarmed");
    }

    /// Take an idle context (or create one) and bind `request` to it.
    pub fn acquire(&self, request: Request) -> PooledContext<'_> {
        let reused = self.idle.lock().pop();
        let mut ctx = reused.unwrap_or_else(|| {
            self.metrics.record_created();
            debug!(
                pool = %self.label,
                created = self.metrics.created(),
                "Context pool grew"
            );
            Context::new()
        });
        ctx.reset(request);
        self.metrics.record_acquire();
        PooledContext { pool: self, ctx }
    }

    fn release(&self, mut ctx: Context) {
        ctx.clear();
        self.idle.lock().push(ctx);
        self.metrics.record_release();
    }

    /// Number of contexts waiting to be reused.
    #[must_use]
    pub fn idle(&self) -> usize {
        self.idle.lock().len()
    }

    /// Pool counters.
    #[must_use]
    pub fn metrics(&self) -> &PoolMetrics {
        &self.metrics
    }

    /// Label given at construction.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }
}

/// Exclusive handle on a pooled [`Context`].
///
/// Dereferences to the context; returns it, cleared, to the pool on drop.
#[derive(Debug)]
pub struct PooledContext<'p> {
    pool: &'p ContextPool,
    ctx: Context,
}

impl Deref for PooledContext<'_> {
    type Target = Context;

    fn deref(&self) -> &Context {
        &self.ctx
    }
}

impl DerefMut for PooledContext<'_> {
    fn deref_mut(&mut self) -> &mut Context {
        &mut self.ctx
    }
}

impl Drop for PooledContext<'_> {
    fn drop(&mut self) {
        let ctx = std::mem::take(&mut self.ctx);
        self.pool.release(ctx);
    }
}
