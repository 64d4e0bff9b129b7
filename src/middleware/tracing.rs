use std::time::Instant;

use tracing::{field, info, info_span, warn};

use super::{Middleware, Next};
use crate::context::Context;
use crate::error::Error;

/// Access log: one span per request, closed with a summary event read from the
/// response writer (status, bytes, latency).
#[derive(Debug, Default, Clone, Copy)]
pub struct AccessLog;

impl Middleware for AccessLog {
    fn invoke(&self, ctx: &mut Context, next: Next<'_>) -> Result<(), Error> {
        let span = info_span!(
            "request",
            method = %ctx.method(),
            path = %ctx.path(),
            status = field::Empty,
            bytes = field::Empty,
            latency_us = field::Empty,
        );
        let _entered = span.enter();
        let start = Instant::now();

        let result = next.run(ctx);

        let latency_us = u64::try_from(start.elapsed().as_micros()).unwrap_or(u64::MAX);
        let writer = ctx.writer();
        span.record("status", writer.status().as_u16());
        span.record("bytes", writer.bytes_written());
        span.record("latency_us", latency_us);

        match &result {
            Ok(()) => info!(
                status = writer.status().as_u16(),
                bytes = writer.bytes_written(),
                latency_us,
                "Request completed"
            ),
            Err(e) => warn!(
                error = %e,
                committed = writer.is_committed(),
                latency_us,
                "Request failed"
            ),
        }
        result
    }
}
