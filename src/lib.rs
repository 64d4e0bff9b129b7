//! # brrtmux
//!
//! **brrtmux** is an embeddable HTTP request dispatcher: it resolves an incoming
//! method and path to a registered handler and runs it through an ordered chain of
//! middleware. It has no socket layer of its own; a transport hands it an
//! `http::Request` and a response sink.
//!
//! ## Architecture
//!
//! - **[`router`]** - Segment tree with static, `:param` and `*catch-all`
//!   segments and a per-method handler table at each leaf
//! - **[`middleware`]** - The [`Middleware`](middleware::Middleware) trait, the
//!   chain built from registered middleware, and stock middleware
//! - **[`context`]** - Per-request [`Context`](context::Context), recycled through
//!   a pool
//! - **[`server`]** - Transport boundary and the status-capturing
//!   [`ResponseWriter`](server::ResponseWriter)
//! - **[`dispatcher`]** - The entry point tying the pieces together
//! - **[`config`]**, **[`logging`]**, **[`error`]** - Ambient plumbing
//!
//! ### Request Handling Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Transport
//!     participant Dispatcher
//!     participant Pool as ContextPool
//!     participant Chain as Middleware Chain
//!     participant Router as RouterStage
//!     participant Handler
//!
//!     Transport->>Dispatcher: serve(request, writer)
//!     Dispatcher->>Pool: acquire + reset
//!     Dispatcher->>Chain: run(ctx)
//!     Chain->>Chain: middleware "before" code
//!     Chain->>Router: last link
//!     Router->>Router: lookup(method, path)
//!     alt Route found
//!         Router->>Handler: call(ctx) with params
//!         Handler-->>Router: Result
//!     else Path matched, method did not
//!         Router-->>Chain: 405 + Allow
//!     else No route
//!         Router-->>Chain: 404 (or fallback handler)
//!     end
//!     Chain->>Chain: middleware "after" code (reverse order)
//!     Chain-->>Dispatcher: Result
//!     Dispatcher->>Dispatcher: error handler on Err
//!     Dispatcher->>Pool: release
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use brrtmux::context::Context;
//! use brrtmux::dispatcher::Dispatcher;
//! use brrtmux::middleware::{AccessLog, RequestIdMiddleware};
//! use http::Request;
//!
//! let mut app = Dispatcher::default();
//! app.use_middleware(RequestIdMiddleware);
//! app.use_middleware(AccessLog);
//! app.get("/users/:id", |ctx: &mut Context| {
//!     let id = ctx.param_int("id")?;
//!     ctx.json(200, &serde_json::json!({ "id": id }))
//! });
//!
//! let response = app.handle(Request::get("/users/42").body(Vec::new()).unwrap());
//! assert_eq!(response.body(), br#"{"id":42}"#);
//! ```
//!
//! ## Concurrency
//!
//! Routes and middleware are registered with `&mut self` before traffic starts.
//! Serving takes `&self`: the route tree is read without locks, and the only
//! shared mutable state on the request path is the context pool's free list.

pub mod cli;
pub mod config;
pub mod context;
pub mod dispatcher;
mod echo;
pub mod error;
pub mod handler;
pub mod ids;
pub mod logging;
pub mod middleware;
pub mod router;
pub mod server;

pub use config::DispatcherConfig;
pub use context::Context;
pub use dispatcher::{Dispatcher, ErrorHandler};
pub use error::{Error, RouteError, StoreError};
pub use handler::Handler;
pub use middleware::{Middleware, Next};
pub use router::Router;
