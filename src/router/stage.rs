use http::header::{HeaderValue, ALLOW};
use http::StatusCode;
use std::sync::Arc;
use tracing::debug;

use super::core::{Lookup, Router};
use crate::context::Context;
use crate::error::Error;
use crate::handler::Handler;
use crate::middleware::{Middleware, Next};

/// The router as the terminal stage of a middleware chain.
///
/// On a hit the extracted parameters are written into the context and the handler
/// runs; `next` is never called. On a miss the fallback handler runs if one is set.
/// Otherwise the rest of the chain runs and, if nothing downstream committed a
/// response, the stage answers `404 Not Found` or `405 Method Not Allowed` with an
/// `Allow` header.
pub struct RouterStage {
    router: Arc<Router>,
    fallback: Option<Arc<dyn Handler>>,
}

impl RouterStage {
    pub fn new(router: Arc<Router>, fallback: Option<Arc<dyn Handler>>) -> Self {
        Self { router, fallback }
    }

    pub fn router(&self) -> &Router {
        &self.router
    }
}

impl Middleware for RouterStage {
    fn invoke(&self, ctx: &mut Context, next: Next<'_>) -> Result<(), Error> {
        let lookup = self.router.lookup(ctx.method(), ctx.path());
        let allowed = match lookup {
            Lookup::Found {
                handler, params, ..
            } => {
                ctx.params_mut().extend(params);
                return handler.call(ctx);
            }
            Lookup::MethodNotAllowed { allowed } => allowed,
            Lookup::NotFound => Vec::new(),
        };

        if let Some(fallback) = &self.fallback {
            return fallback.call(ctx);
        }
        next.run(ctx)?;
        if ctx.is_committed() {
            return Ok(());
        }

        if allowed.is_empty() {
            debug!(method = %ctx.method(), path = %ctx.path(), "Responding 404");
            return ctx.string(StatusCode::NOT_FOUND.as_u16(), "404 page not found");
        }
        let allow = allowed
            .iter()
            .map(|m| m.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        let value = HeaderValue::from_str(&allow).map_err(|e| Error::InvalidHeader(e.to_string()))?;
        ctx.writer_mut().headers_mut().insert(ALLOW, value);
        debug!(method = %ctx.method(), path = %ctx.path(), allow = %allow, "Responding 405");
        ctx.string(
            StatusCode::METHOD_NOT_ALLOWED.as_u16(),
            "405 method not allowed",
        )
    }
}
