//! Middleware chain.
//!
//! A chain is a singly linked list built once from the registered middleware by a
//! right fold: the last middleware links to a no-op terminator, and every earlier
//! middleware links to the one after it. Invoking the head runs the whole chain.
//!
//! Each middleware receives the [`Context`] and a [`Next`] continuation. Code before
//! `next.run(ctx)` runs on the way in, code after it on the way out (in reverse
//! registration order). Returning without running `next` short-circuits everything
//! downstream. `Next` is consumed by `run`, so a continuation can be invoked at most
//! once.

use std::fmt;
use std::sync::Arc;

use crate::context::Context;
use crate::error::Error;

/// A unit of request-processing logic wrapped around the rest of the chain.
pub trait Middleware: Send + Sync {
    /// Process the request, optionally delegating to the rest of the chain.
    fn invoke(&self, ctx: &mut Context, next: Next<'_>) -> Result<(), Error>;
}

/// Continuation handed to a middleware: the remainder of the chain.
pub struct Next<'a> {
    link: Option<&'a Link>,
}

impl Next<'_> {
    /// Run the rest of the chain.
    pub fn run(self, ctx: &mut Context) -> Result<(), Error> {
        match self.link {
            Some(link) => link.invoke(ctx),
            None => Ok(()),
        }
    }
}

/// Wraps a closure as [`Middleware`].
pub struct MiddlewareFn<F>(F);

/// Wrap `f` as middleware.
///
/// ```rust
/// use brrtmux::middleware::middleware_fn;
///
/// let mw = middleware_fn(|ctx, next| {
///     ctx.set_header("x-powered-by", "brrtmux")?;
///     next.run(ctx)
/// });
/// # let _ = mw;
/// ```
pub fn middleware_fn<F>(f: F) -> MiddlewareFn<F>
where
    F: Fn(&mut Context, Next<'_>) -> Result<(), Error> + Send + Sync,
{
    MiddlewareFn(f)
}

impl<F> Middleware for MiddlewareFn<F>
where
    F: Fn(&mut Context, Next<'_>) -> Result<(), Error> + Send + Sync,
{
    fn invoke(&self, ctx: &mut Context, next: Next<'_>) -> Result<(), Error> {
        (self.0)(ctx, next)
    }
}

/// Terminator at the tail of every chain.
struct Void;

impl Middleware for Void {
    fn invoke(&self, _ctx: &mut Context, _next: Next<'_>) -> Result<(), Error> {
        Ok(())
    }
}

struct Link {
    handler: Arc<dyn Middleware>,
    next: Option<Box<Link>>,
}

impl Link {
    fn void() -> Self {
        Self {
            handler: Arc::new(Void),
            next: None,
        }
    }

    fn invoke(&self, ctx: &mut Context) -> Result<(), Error> {
        self.handler.invoke(
            ctx,
            Next {
                link: self.next.as_deref(),
            },
        )
    }
}

/// An immutable, built middleware chain.
pub struct Chain {
    head: Link,
    len: usize,
}

impl Chain {
    /// Fold `middlewares` into a chain, first element outermost.
    #[must_use]
    pub fn build(middlewares: &[Arc<dyn Middleware>]) -> Self {
        Self {
            head: fold(middlewares),
            len: middlewares.len(),
        }
    }

    /// Run the chain from the head.
    pub fn run(&self, ctx: &mut Context) -> Result<(), Error> {
        self.head.invoke(ctx)
    }

    /// Number of real (non-terminator) links.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Default for Chain {
    fn default() -> Self {
        Self::build(&[])
    }
}

impl fmt::Debug for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chain").field("len", &self.len).finish()
    }
}

fn fold(middlewares: &[Arc<dyn Middleware>]) -> Link {
    match middlewares.split_first() {
        None => Link::void(),
        Some((first, rest)) => Link {
            handler: Arc::clone(first),
            next: Some(Box::new(fold(rest))),
        },
    }
}
