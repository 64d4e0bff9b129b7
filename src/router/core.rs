//! Router core module - hot path for request routing.
//!
//! # JSF Compliance (Rule 206)
//!
//! Resolution is part of the request hot path: captured values borrow from the
//! request path (or own their text when a segment had to be percent-decoded) until
//! they are moved into the caller's [`ParamVec`], which stays
//! on the stack for routes with up to [`MAX_INLINE_PARAMS`] parameters.

#![deny(clippy::inefficient_to_string)]
#![deny(clippy::format_push_string)]
#![deny(clippy::unnecessary_to_owned)]

use http::Method;
use smallvec::SmallVec;
use std::borrow::Cow;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::tree::{PathTree, Walk};
use crate::error::RouteError;
use crate::handler::Handler;

/// Maximum number of path parameters before heap allocation.
/// Most REST APIs have ≤4 path params (e.g., /users/:id/posts/:post_id).
pub const MAX_INLINE_PARAMS: usize = 8;

/// Stack-allocated parameter storage for the hot path.
///
/// Param names use `Arc<str>` because they come from the route tree (known at
/// startup), so cloning one is an atomic increment. Values are per-request data.
/// Order is the order of appearance in the matched path.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// First value bound to `name`.
///
/// Duplicate names at different depths (e.g., `/org/:id/user/:id`) resolve to the
/// first occurrence, the org id.
#[inline]
#[must_use]
pub fn first_param<'a>(params: &'a ParamVec, name: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(k, _)| k.as_ref() == name)
        .map(|(_, v)| v.as_str())
}

/// Full resolution result, keeping "path matched, method did not" apart from
/// "path did not match".
pub enum Lookup {
    /// A handler is registered for the method and path
    Found {
        /// The matched handler
        handler: Arc<dyn Handler>,
        /// Parameters extracted from the path
        params: ParamVec,
        /// Pattern the handler was registered under
        pattern: Arc<str>,
    },
    /// The path exists but has no handler for the method
    MethodNotAllowed {
        /// Methods that do have a handler on this path
        allowed: Vec<Method>,
    },
    /// No route matches the path
    NotFound,
}

impl std::fmt::Debug for Lookup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Lookup::Found { params, pattern, .. } => f
                .debug_struct("Found")
                .field("pattern", pattern)
                .field("params", params)
                .finish_non_exhaustive(),
            Lookup::MethodNotAllowed { allowed } => f
                .debug_struct("MethodNotAllowed")
                .field("allowed", allowed)
                .finish(),
            Lookup::NotFound => f.write_str("NotFound"),
        }
    }
}

/// A registered route, for listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteInfo {
    /// HTTP method
    pub method: Method,
    /// Pattern as registered (e.g., `/users/:id`)
    pub pattern: String,
    /// Tree path of the leaf, showing every name bound at shared positions
    pub tree_path: String,
}

/// Router that matches HTTP requests to handlers using a segment tree.
///
/// Routes are registered once at startup with [`Router::add`] (or the per-method
/// shortcuts) and resolved concurrently afterwards; lookups take `&self` and need
/// no locking.
///
/// # Path syntax
///
/// - `/users` - static segment, matched ignoring ASCII case
/// - `/users/:id` - named parameter, matches one non-empty segment
/// - `/static/*filepath` - catch-all, matches the rest of the path including `/`
///
/// # Example
///
/// ```rust
/// use brrtmux::router::Router;
/// use brrtmux::context::Context;
/// use http::Method;
///
/// let mut router = Router::new();
/// router.get("/users/:id", |ctx: &mut Context| ctx.string(200, "user"));
///
/// let mut params = Default::default();
/// assert!(router.find(&Method::GET, "/users/42", &mut params).is_some());
/// assert_eq!(brrtmux::router::first_param(&params, "id"), Some("42"));
/// ```
#[derive(Clone, Default)]
pub struct Router {
    tree: PathTree,
    routes: usize,
}

impl Router {
    /// Create an empty router.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `method` at `path`.
    ///
    /// Registering the same method and path again replaces the earlier handler;
    /// the last registration wins.
    pub fn try_add<H>(&mut self, method: Method, path: &str, handler: H) -> Result<(), RouteError>
    where
        H: Handler + 'static,
    {
        self.try_add_shared(method, path, Arc::new(handler))
    }

    /// Like [`Router::try_add`], for a handler already shared behind an `Arc`.
    pub fn try_add_shared(
        &mut self,
        method: Method,
        path: &str,
        handler: Arc<dyn Handler>,
    ) -> Result<(), RouteError> {
        let replaced = self.tree.insert(&method, path, handler)?;
        if replaced {
            warn!(method = %method, path = %path, "Replaced existing route handler");
        } else {
            self.routes += 1;
            debug!(method = %method, path = %path, nodes = self.tree.len(), "Route registered");
        }
        Ok(())
    }

    /// Register `handler` for `method` at `path`.
    ///
    /// # Panics
    ///
    /// Panics on a malformed pattern or an unsupported method. Routes are
    /// registered during startup, so these are programming errors.
    #[allow(clippy::panic)]
    pub fn add<H>(&mut self, method: Method, path: &str, handler: H)
    where
        H: Handler + 'static,
    {
        if let Err(e) = self.try_add(method, path, handler) {
            panic!("router: {e}");
        }
    }

    /// Shortcut for `add(Method::GET, ..)`.
    pub fn get<H: Handler + 'static>(&mut self, path: &str, handler: H) {
        self.add(Method::GET, path, handler);
    }

    /// Shortcut for `add(Method::POST, ..)`.
    pub fn post<H: Handler + 'static>(&mut self, path: &str, handler: H) {
        self.add(Method::POST, path, handler);
    }

    /// Shortcut for `add(Method::PUT, ..)`.
    pub fn put<H: Handler + 'static>(&mut self, path: &str, handler: H) {
        self.add(Method::PUT, path, handler);
    }

    /// Shortcut for `add(Method::DELETE, ..)`.
    pub fn delete<H: Handler + 'static>(&mut self, path: &str, handler: H) {
        self.add(Method::DELETE, path, handler);
    }

    /// Shortcut for `add(Method::PATCH, ..)`.
    pub fn patch<H: Handler + 'static>(&mut self, path: &str, handler: H) {
        self.add(Method::PATCH, path, handler);
    }

    /// Shortcut for `add(Method::OPTIONS, ..)`.
    pub fn options<H: Handler + 'static>(&mut self, path: &str, handler: H) {
        self.add(Method::OPTIONS, path, handler);
    }

    /// Shortcut for `add(Method::HEAD, ..)`.
    pub fn head<H: Handler + 'static>(&mut self, path: &str, handler: H) {
        self.add(Method::HEAD, path, handler);
    }

    /// Shortcut for `add(Method::CONNECT, ..)`.
    pub fn connect<H: Handler + 'static>(&mut self, path: &str, handler: H) {
        self.add(Method::CONNECT, path, handler);
    }

    /// Shortcut for `add(Method::TRACE, ..)`.
    pub fn trace<H: Handler + 'static>(&mut self, path: &str, handler: H) {
        self.add(Method::TRACE, path, handler);
    }

    /// Register one handler for GET, POST, PUT, DELETE, PATCH, OPTIONS and HEAD.
    ///
    /// # Panics
    ///
    /// Panics on a malformed pattern, like [`Router::add`].
    #[allow(clippy::panic)]
    pub fn all<H: Handler + 'static>(&mut self, path: &str, handler: H) {
        let handler: Arc<dyn Handler> = Arc::new(handler);
        for method in [
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
            Method::OPTIONS,
            Method::HEAD,
        ] {
            if let Err(e) = self.try_add_shared(method, path, Arc::clone(&handler)) {
                panic!("router: {e}");
            }
        }
    }

    /// Resolve `method` and `path` to a handler, appending extracted parameters to
    /// `params`.
    ///
    /// Returns `None` both when the path is unknown and when it has no handler for
    /// the method; use [`Router::lookup`] to tell the two apart.
    pub fn find(&self, method: &Method, path: &str, params: &mut ParamVec) -> Option<Arc<dyn Handler>> {
        match self.lookup(method, path) {
            Lookup::Found {
                handler,
                params: found,
                ..
            } => {
                params.extend(found);
                Some(handler)
            }
            _ => None,
        }
    }

    /// Resolve `method` and `path`, keeping the reason for a miss.
    #[must_use]
    pub fn lookup(&self, method: &Method, path: &str) -> Lookup {
        let mut values: SmallVec<[Cow<'_, str>; 8]> = SmallVec::new();
        let walk = self.tree.walk(method, path, &mut values);
        match walk {
            Walk::Miss => {
                debug!(method = %method, path = %path, "No route matched");
                Lookup::NotFound
            }
            Walk::Leaf { node, endpoint: None } => {
                let allowed = self.tree.allowed(node);
                debug!(
                    method = %method,
                    path = %path,
                    tree_path = %self.tree.node_path(node),
                    allowed = ?allowed,
                    "Path matched but method did not"
                );
                Lookup::MethodNotAllowed { allowed }
            }
            Walk::Leaf {
                endpoint: Some(endpoint),
                ..
            } => {
                let params: ParamVec = endpoint
                    .params
                    .iter()
                    .zip(values)
                    .map(|(name, value)| (Arc::clone(name), value.into_owned()))
                    .collect();
                debug!(
                    method = %method,
                    path = %path,
                    pattern = %endpoint.pattern,
                    params = ?params,
                    "Route matched"
                );
                Lookup::Found {
                    handler: Arc::clone(&endpoint.handler),
                    params,
                    pattern: Arc::clone(&endpoint.pattern),
                }
            }
        }
    }

    /// Number of distinct (method, path) routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes
    }

    /// Whether no route has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes == 0
    }

    /// Every registered route.
    #[must_use]
    pub fn routes(&self) -> Vec<RouteInfo> {
        self.tree
            .endpoints()
            .into_iter()
            .map(|(method, pattern, node)| RouteInfo {
                method,
                pattern: pattern.to_string(),
                tree_path: self.tree.node_path(node),
            })
            .collect()
    }

    /// Log a summary of the routing table at `info` level.
    pub fn log_summary(&self) {
        let routes = self.routes();
        let summary: Vec<String> = routes
            .iter()
            .take(10)
            .map(|r| format!("{} {}", r.method, r.pattern))
            .collect();
        info!(
            routes_count = routes.len(),
            nodes = self.tree.len(),
            routes_summary = ?summary,
            "Routing table loaded"
        );
    }

    /// Print all registered routes to stdout.
    pub fn dump_routes(&self) {
        let routes = self.routes();
        println!("[routes] count={}", routes.len());
        for r in routes {
            println!("[route] {} {} (tree: {})", r.method, r.pattern, r.tree_path);
        }
    }
}
