//! Per-request context.
//!
//! [`Context`] carries the request, the response writer, extracted path
//! parameters, a lazily decoded query string and a typed key/value store. The
//! dispatcher recycles contexts through [`ContextPool`].

mod core;
mod pool;
mod store;

pub use core::Context;
pub use pool::{ContextPool, PooledContext};
pub use store::Store;
