//! # Context Pool
//!
//! Recycles [`Context`] allocations between requests.
//!
//! - **Reset on acquire**: every context handed out has been rebound by the caller
//!   through [`Context::reset`], and every returned context was cleared first, so
//!   nothing from one request is observable in the next.
//! - **Bounded**: at most `max_idle` contexts are kept; surplus ones are dropped.
//! - **Panic safe**: a context whose request panicked is dropped, never recycled.

use parking_lot::Mutex;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use tracing::debug;

use super::core::Context;
use crate::config::DispatcherConfig;

/// Free list of idle contexts.
pub struct ContextPool {
    free: Mutex<Vec<Box<Context>>>,
    config: Arc<DispatcherConfig>,
    max_idle: usize,
    created: AtomicUsize,
}

impl ContextPool {
    pub fn new(config: Arc<DispatcherConfig>) -> Self {
        let max_idle = config.pool_max_idle;
        Self {
            free: Mutex::new(Vec::new()),
            config,
            max_idle,
            created: AtomicUsize::new(0),
        }
    }

    /// Take an idle context or allocate a new one.
    pub fn acquire(&self) -> PooledContext<'_> {
        let ctx = self.free.lock().pop().unwrap_or_else(|| {
            let total = self.created.fetch_add(1, Ordering::Relaxed) + 1;
            debug!(total, "Allocated new request context");
            Box::new(Context::new(Arc::clone(&self.config)))
        });
        PooledContext {
            ctx: Some(ctx),
            pool: self,
        }
    }

    fn release(&self, mut ctx: Box<Context>) {
        ctx.release();
        let mut free = self.free.lock();
        if free.len() < self.max_idle {
            free.push(ctx);
        }
    }

    /// Contexts currently idle in the pool.
    pub fn idle(&self) -> usize {
        self.free.lock().len()
    }

    /// Contexts allocated over the pool's lifetime.
    pub fn created(&self) -> usize {
        self.created.load(Ordering::Relaxed)
    }
}

/// A context on loan from a [`ContextPool`]; returned to the pool on drop.
pub struct PooledContext<'p> {
    ctx: Option<Box<Context>>,
    pool: &'p ContextPool,
}

impl Deref for PooledContext<'_> {
    type Target = Context;

    fn deref(&self) -> &Context {
        // Only `Drop` takes the context out.
        self.ctx.as_deref().unwrap_or_else(|| unreachable_context())
    }
}

impl DerefMut for PooledContext<'_> {
    fn deref_mut(&mut self) -> &mut Context {
        self.ctx.as_deref_mut().unwrap_or_else(|| unreachable_context())
    }
}

impl Drop for PooledContext<'_> {
    fn drop(&mut self) {
        if let Some(ctx) = self.ctx.take() {
            if thread::panicking() {
                debug!("Dropping request context after panic");
                return;
            }
            self.pool.release(ctx);
        }
    }
}

#[cold]
#[allow(clippy::panic)]
fn unreachable_context() -> ! {
    panic!("pooled context used after release")
}
