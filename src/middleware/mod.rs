//! # Middleware
//!
//! The [`Middleware`] trait, the [`Chain`] built from registered middleware, and
//! the stock middleware shipped with the crate:
//!
//! - [`Health`] - answers liveness probes
//! - [`NotFound`] - explicit 404 terminator
//! - [`AccessLog`] - per-request span and completion event
//! - [`RequestIdMiddleware`] - assigns a ULID request id
//! - [`MetricsMiddleware`] - atomic counters with Prometheus rendering

mod core;
mod health;
mod metrics;
mod not_found;
mod request_id;
mod tracing;

pub use core::{middleware_fn, Chain, Middleware, MiddlewareFn, Next};
pub use health::Health;
pub use metrics::MetricsMiddleware;
pub use not_found::NotFound;
pub use request_id::{request_id, RequestIdMiddleware, REQUEST_ID_KEY};
pub use tracing::AccessLog;
