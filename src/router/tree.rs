//! Segment tree for route matching
//!
//! Paths are split on `/` and each segment becomes one node:
//! - Static segments (e.g., `users`) match exactly, ignoring ASCII case
//! - Parameter segments (e.g., `:id`) match any single non-empty segment
//! - Catch-all segments (e.g., `*filepath`) match the rest of the path, `/` included
//!
//! A node has at most one parameter child and at most one catch-all child. Routes
//! that differ only in the parameter name at some depth share that child, and the
//! child remembers every name bound there. Each route endpoint records the names
//! valid for *its* path, so the extra names never leak into a match.
//!
//! Nodes live in an arena (`Vec<PathNode>`) owned by the tree. Children are referred
//! to by index, and the parent index is a plain back-reference used only to rebuild
//! a node's pattern for diagnostics.
//!
//! ## Matching policy
//!
//! Resolution is greedy: at each node a static child wins over the parameter child,
//! which wins over the catch-all child. Once a branch is taken there is no
//! backtracking. With `/a/b/c` and `/a/:x/d` registered, `/a/b/d` takes the static
//! `b` branch, finds no `d` under it, and fails.
//!
//! Request paths are split on `/` before percent-decoding, so an encoded `%2F`
//! stays inside its segment. Static comparison and captured values both see the
//! decoded text.

use http::Method;
use percent_encoding::percent_decode_str;
use smallvec::SmallVec;
use std::borrow::Cow;
use std::sync::Arc;

use crate::error::RouteError;
use crate::handler::Handler;

/// Index of a node in the tree arena.
pub(crate) type NodeId = usize;

const ROOT: NodeId = 0;

/// The nine routable methods, in method-table slot order.
pub(crate) const METHODS: [Method; 9] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::DELETE,
    Method::PATCH,
    Method::OPTIONS,
    Method::HEAD,
    Method::CONNECT,
    Method::TRACE,
];

/// Method-table slot for `method`, `None` for methods the tree does not route.
pub(crate) fn method_slot(method: &Method) -> Option<usize> {
    METHODS.iter().position(|m| m == method)
}

/// Kind of path segment a node matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    /// Literal text
    Static,
    /// `:name`
    Param,
    /// `*name`
    CatchAll,
}

impl SegmentKind {
    fn describe(self) -> &'static str {
        match self {
            SegmentKind::Static => "static",
            SegmentKind::Param => "parameter",
            SegmentKind::CatchAll => "catch-all",
        }
    }
}

/// A handler installed for one method on one node.
#[derive(Clone)]
pub(crate) struct Endpoint {
    pub handler: Arc<dyn Handler>,
    /// Parameter names valid for this route, one per dynamic segment, in path order
    pub params: SmallVec<[Arc<str>; 4]>,
    /// Pattern as registered
    pub pattern: Arc<str>,
}

#[derive(Clone, Default)]
struct MethodTable {
    slots: [Option<Endpoint>; 9],
}

impl MethodTable {
    fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    fn allowed(&self) -> Vec<Method> {
        self.slots
            .iter()
            .zip(METHODS.iter())
            .filter(|(slot, _)| slot.is_some())
            .map(|(_, m)| m.clone())
            .collect()
    }
}

#[derive(Clone)]
struct PathNode {
    segment: Box<str>,
    kind: SegmentKind,
    /// Every parameter name ever bound at this position
    names: SmallVec<[Arc<str>; 2]>,
    parent: Option<NodeId>,
    statics: SmallVec<[NodeId; 4]>,
    param: Option<NodeId>,
    catch_all: Option<NodeId>,
    handlers: MethodTable,
}

impl PathNode {
    fn new(segment: &str, kind: SegmentKind, parent: Option<NodeId>) -> Self {
        Self {
            segment: segment.into(),
            kind,
            names: SmallVec::new(),
            parent,
            statics: SmallVec::new(),
            param: None,
            catch_all: None,
            handlers: MethodTable::default(),
        }
    }

    fn remember_name(&mut self, name: &str) -> Arc<str> {
        if let Some(existing) = self.names.iter().find(|n| n.as_ref() == name) {
            return Arc::clone(existing);
        }
        let name: Arc<str> = Arc::from(name);
        self.names.push(Arc::clone(&name));
        name
    }
}

/// Outcome of walking the tree for a request path.
pub(crate) enum Walk<'t> {
    /// The path reached a node that has at least one handler
    Leaf {
        node: NodeId,
        endpoint: Option<&'t Endpoint>,
    },
    /// The path ran off the tree or ended on a node without handlers
    Miss,
}

/// Split a path into `(byte offset, segment)` pairs, skipping empty segments.
pub(crate) fn segments(path: &str) -> impl Iterator<Item = (usize, &str)> {
    path.split('/')
        .scan(0usize, |offset, seg| {
            let start = *offset;
            *offset += seg.len() + 1;
            Some((start, seg))
        })
        .filter(|(_, seg)| !seg.is_empty())
}

/// Percent-decode one piece of a request path. Invalid UTF-8 is replaced rather
/// than rejected.
pub(crate) fn decode(raw: &str) -> Cow<'_, str> {
    percent_decode_str(raw).decode_utf8_lossy()
}

/// Arena-backed segment tree.
#[derive(Clone)]
pub(crate) struct PathTree {
    nodes: Vec<PathNode>,
}

impl Default for PathTree {
    fn default() -> Self {
        Self {
            nodes: vec![PathNode::new("/", SegmentKind::Static, None)],
        }
    }
}

impl PathTree {
    fn push(&mut self, node: PathNode) -> NodeId {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    fn static_child(&self, node: NodeId, segment: &str) -> Option<NodeId> {
        self.nodes[node]
            .statics
            .iter()
            .copied()
            .find(|&c| self.nodes[c].segment.eq_ignore_ascii_case(segment))
    }

    /// Insert `handler` for `method` at `pattern`.
    ///
    /// Returns `true` when an existing handler for the same method and path was
    /// replaced.
    pub(crate) fn insert(
        &mut self,
        method: &Method,
        pattern: &str,
        handler: Arc<dyn Handler>,
    ) -> Result<bool, RouteError> {
        let slot = method_slot(method).ok_or_else(|| RouteError::UnsupportedMethod(method.clone()))?;
        if pattern.is_empty() {
            return Err(RouteError::EmptyPath);
        }
        if !pattern.starts_with('/') {
            return Err(RouteError::MissingLeadingSlash(pattern.to_string()));
        }

        let parts: SmallVec<[&str; 8]> = segments(pattern).map(|(_, seg)| seg).collect();
        let mut current = ROOT;
        let mut params: SmallVec<[Arc<str>; 4]> = SmallVec::new();

        for (index, segment) in parts.iter().enumerate() {
            let child = if let Some(name) = segment.strip_prefix(':') {
                if name.is_empty() {
                    return Err(RouteError::UnnamedParameter { path: pattern.to_string() });
                }
                if self.nodes[current].catch_all.is_some() {
                    return Err(RouteError::Conflict {
                        path: pattern.to_string(),
                        segment: (*segment).to_string(),
                        existing: SegmentKind::CatchAll.describe(),
                    });
                }
                match self.nodes[current].param {
                    Some(existing) => existing,
                    None => {
                        let id = self.push(PathNode::new(segment, SegmentKind::Param, Some(current)));
                        self.nodes[current].param = Some(id);
                        id
                    }
                }
            } else if let Some(name) = segment.strip_prefix('*') {
                if name.is_empty() {
                    return Err(RouteError::UnnamedParameter { path: pattern.to_string() });
                }
                if index + 1 != parts.len() {
                    return Err(RouteError::CatchAllNotLast {
                        path: pattern.to_string(),
                        name: name.to_string(),
                    });
                }
                if self.nodes[current].param.is_some() {
                    return Err(RouteError::Conflict {
                        path: pattern.to_string(),
                        segment: (*segment).to_string(),
                        existing: SegmentKind::Param.describe(),
                    });
                }
                match self.nodes[current].catch_all {
                    Some(existing) => existing,
                    None => {
                        let id = self.push(PathNode::new(segment, SegmentKind::CatchAll, Some(current)));
                        self.nodes[current].catch_all = Some(id);
                        id
                    }
                }
            } else {
                match self.static_child(current, segment) {
                    Some(existing) => existing,
                    None => {
                        let id = self.push(PathNode::new(segment, SegmentKind::Static, Some(current)));
                        self.nodes[current].statics.push(id);
                        id
                    }
                }
            };

            if self.nodes[child].kind != SegmentKind::Static {
                let name = self.nodes[child].remember_name(&segment[1..]);
                params.push(name);
            }
            current = child;
        }

        let endpoint = Endpoint {
            handler,
            params,
            pattern: Arc::from(pattern),
        };
        Ok(self.nodes[current].handlers.slots[slot]
            .replace(endpoint)
            .is_some())
    }

    /// Walk the tree for `path`, pushing one captured value per dynamic segment.
    pub(crate) fn walk<'t, 'p>(
        &'t self,
        method: &Method,
        path: &'p str,
        values: &mut SmallVec<[Cow<'p, str>; 8]>,
    ) -> Walk<'t> {
        let mut current = ROOT;
        for (offset, raw) in segments(path) {
            let segment = decode(raw);
            if let Some(child) = self.static_child(current, &segment) {
                current = child;
                continue;
            }
            let node = &self.nodes[current];
            if let Some(child) = node.param {
                values.push(segment);
                current = child;
                continue;
            }
            if let Some(child) = node.catch_all {
                values.push(decode(&path[offset..]));
                current = child;
                break;
            }
            return Walk::Miss;
        }

        let handlers = &self.nodes[current].handlers;
        if handlers.is_empty() {
            return Walk::Miss;
        }
        let endpoint = method_slot(method).and_then(|slot| handlers.slots[slot].as_ref());
        Walk::Leaf {
            node: current,
            endpoint,
        }
    }

    /// Methods that have a handler on `node`.
    pub(crate) fn allowed(&self, node: NodeId) -> Vec<Method> {
        self.nodes[node].handlers.allowed()
    }

    /// Rebuild the tree path of `node` by following parent links.
    ///
    /// Dynamic positions show every name bound there, e.g. `/users/:id|uid`.
    pub(crate) fn node_path(&self, node: NodeId) -> String {
        let mut parts = Vec::new();
        let mut cursor = Some(node);
        while let Some(id) = cursor {
            if id == ROOT {
                break;
            }
            let n = &self.nodes[id];
            let part = match n.kind {
                SegmentKind::Static => n.segment.to_string(),
                SegmentKind::Param | SegmentKind::CatchAll => {
                    let marker = if n.kind == SegmentKind::Param { ':' } else { '*' };
                    let names: Vec<&str> = n.names.iter().map(AsRef::as_ref).collect();
                    format!("{marker}{}", names.join("|"))
                }
            };
            parts.push(part);
            cursor = n.parent;
        }
        parts.reverse();
        format!("/{}", parts.join("/"))
    }

    /// Every installed endpoint as `(method, pattern, node)`, in insertion order of
    /// nodes.
    pub(crate) fn endpoints(&self) -> Vec<(Method, Arc<str>, NodeId)> {
        let mut out = Vec::new();
        for (id, node) in self.nodes.iter().enumerate() {
            for (slot, endpoint) in node.handlers.slots.iter().enumerate() {
                if let Some(ep) = endpoint {
                    out.push((METHODS[slot].clone(), Arc::clone(&ep.pattern), id));
                }
            }
        }
        out
    }

    /// Number of nodes, root included.
    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    #[cfg(test)]
    pub(crate) fn kind(&self, node: NodeId) -> SegmentKind {
        self.nodes[node].kind
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;
    use crate::error::Error;

    fn noop() -> Arc<dyn Handler> {
        Arc::new(|_: &mut Context| -> Result<(), Error> { Ok(()) })
    }

    fn captured(tree: &PathTree, method: Method, path: &str) -> Option<(String, Vec<String>)> {
        let mut values = SmallVec::new();
        match tree.walk(&method, path, &mut values) {
            Walk::Leaf {
                endpoint: Some(ep), ..
            } => Some((
                ep.pattern.to_string(),
                values.into_iter().map(Cow::into_owned).collect(),
            )),
            _ => None,
        }
    }

    #[test]
    fn test_segments_skip_empty() {
        let segs: Vec<_> = segments("/a//b/").collect();
        assert_eq!(segs, vec![(1, "a"), (4, "b")]);
    }

    #[test]
    fn test_param_children_are_merged() {
        let mut tree = PathTree::default();
        tree.insert(&Method::GET, "/users/:id/posts", noop()).unwrap();
        tree.insert(&Method::GET, "/users/:uid/comments", noop()).unwrap();
        // root, users, :id|uid, posts, comments
        assert_eq!(tree.len(), 5);
        assert_eq!(tree.kind(2), SegmentKind::Param);
        assert_eq!(tree.node_path(2), "/users/:id|uid");
    }

    #[test]
    fn test_static_children_case_insensitive() {
        let mut tree = PathTree::default();
        tree.insert(&Method::GET, "/Users", noop()).unwrap();
        tree.insert(&Method::POST, "/users", noop()).unwrap();
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn test_overwrite_reported() {
        let mut tree = PathTree::default();
        assert!(!tree.insert(&Method::GET, "/a", noop()).unwrap());
        assert!(tree.insert(&Method::GET, "/a", noop()).unwrap());
    }

    #[test]
    fn test_catch_all_captures_remainder() {
        let mut tree = PathTree::default();
        tree.insert(&Method::GET, "/static/*filepath", noop()).unwrap();
        let (pattern, values) = captured(&tree, Method::GET, "/static/css/site.css").unwrap();
        assert_eq!(pattern, "/static/*filepath");
        assert_eq!(values, vec!["css/site.css"]);
        assert!(captured(&tree, Method::GET, "/static").is_none());
    }

    #[test]
    fn test_segments_decoded_after_split() {
        let mut tree = PathTree::default();
        tree.insert(&Method::GET, "/café", noop()).unwrap();
        tree.insert(&Method::GET, "/users/:name", noop()).unwrap();
        tree.insert(&Method::GET, "/files/*path", noop()).unwrap();

        let (pattern, _) = captured(&tree, Method::GET, "/caf%C3%A9").unwrap();
        assert_eq!(pattern, "/café");
        let (_, values) = captured(&tree, Method::GET, "/users/john%20doe").unwrap();
        assert_eq!(values, vec!["john doe"]);
        // an encoded slash does not start a new segment
        let (_, values) = captured(&tree, Method::GET, "/users/a%2Fb").unwrap();
        assert_eq!(values, vec!["a/b"]);
        let (_, values) = captured(&tree, Method::GET, "/files/my%20docs/a.txt").unwrap();
        assert_eq!(values, vec!["my docs/a.txt"]);
    }

    #[test]
    fn test_greedy_static_preference() {
        let mut tree = PathTree::default();
        tree.insert(&Method::GET, "/a/b/c", noop()).unwrap();
        tree.insert(&Method::GET, "/a/:x/d", noop()).unwrap();
        assert!(captured(&tree, Method::GET, "/a/zz/d").is_some());
        assert!(captured(&tree, Method::GET, "/a/b/d").is_none());
    }

    #[test]
    fn test_registration_faults() {
        let mut tree = PathTree::default();
        assert_eq!(tree.insert(&Method::GET, "", noop()), Err(RouteError::EmptyPath));
        assert!(matches!(
            tree.insert(&Method::GET, "users", noop()),
            Err(RouteError::MissingLeadingSlash(_))
        ));
        assert!(matches!(
            tree.insert(&Method::GET, "/users/:", noop()),
            Err(RouteError::UnnamedParameter { .. })
        ));
        assert!(matches!(
            tree.insert(&Method::GET, "/files/*rest/more", noop()),
            Err(RouteError::CatchAllNotLast { .. })
        ));
        tree.insert(&Method::GET, "/items/:id", noop()).unwrap();
        assert!(matches!(
            tree.insert(&Method::GET, "/items/*rest", noop()),
            Err(RouteError::Conflict { .. })
        ));
        let brew = Method::from_bytes(b"BREW").unwrap();
        assert!(matches!(
            tree.insert(&brew, "/coffee", noop()),
            Err(RouteError::UnsupportedMethod(_))
        ));
    }
}
