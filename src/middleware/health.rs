use super::{Middleware, Next};
use crate::context::Context;
use crate::error::Error;

/// Answers liveness probes with `200 OK` and passes every other request on.
///
/// The probe path is compared ignoring ASCII case.
pub struct Health {
    path: String,
}

impl Health {
    /// Probe at `/health`.
    pub fn new() -> Self {
        Self::with_path("/health")
    }

    pub fn with_path(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl Default for Health {
    fn default() -> Self {
        Self::new()
    }
}

impl Middleware for Health {
    fn invoke(&self, ctx: &mut Context, next: Next<'_>) -> Result<(), Error> {
        if ctx.path().eq_ignore_ascii_case(&self.path) {
            return ctx.string(200, "OK");
        }
        next.run(ctx)
    }
}
