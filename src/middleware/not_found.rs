use http::StatusCode;

use super::{Middleware, Next};
use crate::context::Context;
use crate::error::Error;

/// Terminates the chain with `404 Not Found` unless a response was already
/// committed upstream. Never calls `next`.
#[derive(Debug, Default, Clone, Copy)]
pub struct NotFound;

impl Middleware for NotFound {
    fn invoke(&self, ctx: &mut Context, _next: Next<'_>) -> Result<(), Error> {
        if ctx.is_committed() {
            return Ok(());
        }
        ctx.string(StatusCode::NOT_FOUND.as_u16(), "404 page not found")
    }
}
