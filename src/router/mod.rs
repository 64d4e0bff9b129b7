//! # Router Module
//!
//! The router module resolves `(method, path)` pairs to handlers using a compact
//! segment tree, and extracts named parameters from the matched path.
//!
//! ## Overview
//!
//! The router is responsible for:
//! - Registering `(method, pattern, handler)` triples at startup
//! - Matching incoming requests against the tree segment by segment
//! - Extracting `:name` parameters and `*name` catch-all tails
//! - Reporting "path matched, method did not" separately from "no such path"
//!
//! ## Architecture
//!
//! Registration splits a pattern on `/` and walks (or grows) the tree one segment
//! at a time. Routes that share a parameter position share one parameter node,
//! which accumulates every name bound there; each endpoint keeps the names valid
//! for its own pattern so a match only exposes those.
//!
//! Matching is greedy: static beats parameter beats catch-all at every node, and
//! there is no backtracking once a branch is chosen.
//!
//! ## Example
//!
//! ```rust
//! use brrtmux::context::Context;
//! use brrtmux::error::Error;
//! use brrtmux::router::{Lookup, Router};
//! use http::Method;
//!
//! fn noop(_: &mut Context) -> Result<(), Error> {
//!     Ok(())
//! }
//!
//! let mut router = Router::new();
//! router.get("/users/:id/phone/:num", noop);
//! router.get("/files/*path", noop);
//!
//! match router.lookup(&Method::GET, "/users/42/phone/555") {
//!     Lookup::Found { params, .. } => {
//!         assert_eq!(params[0].1, "42");
//!         assert_eq!(params[1].1, "555");
//!     }
//!     other => panic!("unexpected {other:?}"),
//! }
//! assert!(matches!(
//!     router.lookup(&Method::POST, "/files/a/b.txt"),
//!     Lookup::MethodNotAllowed { .. }
//! ));
//! ```
//!
//! ## Performance
//!
//! - Lookup is O(k) in the number of path segments, independent of route count
//! - Child lookup is a short linear scan; fan-out per node is small in practice
//! - Parameters stay on the stack for routes with ≤8 dynamic segments

mod core;
mod stage;
mod tree;
#[cfg(test)]
mod tests;

pub use core::{first_param, Lookup, ParamVec, RouteInfo, Router, MAX_INLINE_PARAMS};
pub use stage::RouterStage;
pub use tree::SegmentKind;
