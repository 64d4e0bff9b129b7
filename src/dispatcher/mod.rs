//! # Dispatcher Module
//!
//! The dispatcher is the entry point a transport calls once per request. It owns
//! the route table, the ordered middleware list and a pool of request contexts.
//!
//! ## Request Flow
//!
//! 1. A context is taken from the pool and bound to the request and writer
//! 2. The middleware chain runs; the router stage is always its last real link
//! 3. An error returned from the chain goes to the [`ErrorHandler`]
//! 4. Any status still pending is committed and the context returns to the pool
//!
//! ## Setup and Serving
//!
//! Registration (`get`, `use_middleware`, ...) takes `&mut self` and happens before
//! traffic starts. Serving takes `&self`, so one dispatcher behind an `Arc` can be
//! shared by any number of transport threads.
//!
//! ```rust
//! use brrtmux::context::Context;
//! use brrtmux::dispatcher::Dispatcher;
//! use brrtmux::middleware::Health;
//! use http::{Request, StatusCode};
//!
//! let mut app = Dispatcher::default();
//! app.use_middleware(Health::new());
//! app.get("/hello/:name", |ctx: &mut Context| {
//!     let greeting = format!("Hello, {}", ctx.param("name").unwrap_or("stranger"));
//!     ctx.string(200, &greeting)
//! });
//!
//! let response = app.handle(Request::get("/hello/ana").body(Vec::new()).unwrap());
//! assert_eq!(response.status(), StatusCode::OK);
//! assert_eq!(response.body(), b"Hello, ana");
//! ```

mod core;
#[cfg(test)]
mod tests;

pub use core::{Dispatcher, ErrorHandler};
