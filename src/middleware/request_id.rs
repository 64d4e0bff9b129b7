use http::header::HeaderValue;

use super::{Middleware, Next};
use crate::context::Context;
use crate::error::Error;
use crate::ids::{RequestId, REQUEST_ID_HEADER};

/// Store key the request id is kept under.
pub const REQUEST_ID_KEY: &str = "brrtmux.request_id";

/// Tags every request with a [`RequestId`].
///
/// A well-formed `X-Request-Id` header on the request is reused; otherwise a fresh
/// ULID is minted. The id is put in the context store under [`REQUEST_ID_KEY`] and
/// echoed back in the response header.
#[derive(Debug, Default, Clone, Copy)]
pub struct RequestIdMiddleware;

impl Middleware for RequestIdMiddleware {
    fn invoke(&self, ctx: &mut Context, next: Next<'_>) -> Result<(), Error> {
        let id = RequestId::from_header_or_new(ctx.header(REQUEST_ID_HEADER));
        let value = HeaderValue::try_from(id.to_string())
            .map_err(|e| Error::InvalidHeader(e.to_string()))?;
        ctx.writer_mut().headers_mut().insert(REQUEST_ID_HEADER, value);
        ctx.set(REQUEST_ID_KEY, id);
        next.run(ctx)
    }
}

/// The id [`RequestIdMiddleware`] assigned to this request, if it ran.
pub fn request_id(ctx: &Context) -> Option<RequestId> {
    ctx.get::<RequestId>(REQUEST_ID_KEY).ok().copied()
}
