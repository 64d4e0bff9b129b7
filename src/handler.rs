//! The unit of request-processing logic bound to one (method, path) pair.

use crate::context::Context;
use crate::error::Error;

/// A request handler.
///
/// Any `Fn(&mut Context) -> Result<(), Error>` closure is a handler, so most routes
/// are registered with a plain closure. Implement the trait directly when the handler
/// carries state that reads better as a struct.
pub trait Handler: Send + Sync {
    /// Process the request bound to `ctx`, writing the response through it.
    fn call(&self, ctx: &mut Context) -> Result<(), Error>;
}

impl<F> Handler for F
where
    F: Fn(&mut Context) -> Result<(), Error> + Send + Sync,
{
    fn call(&self, ctx: &mut Context) -> Result<(), Error> {
        self(ctx)
    }
}
