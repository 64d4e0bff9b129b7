use std::sync::Arc;

use http::Method;

use super::{first_param, Lookup, ParamVec, Router};
use crate::context::Context;
use crate::error::{Error, RouteError};

fn noop(_: &mut Context) -> Result<(), Error> {
    Ok(())
}

fn matched(router: &Router, method: Method, path: &str) -> Option<(String, Vec<(String, String)>)> {
    match router.lookup(&method, path) {
        Lookup::Found {
            params, pattern, ..
        } => Some((
            pattern.to_string(),
            params
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        )),
        _ => None,
    }
}

fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
    items
        .iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect()
}

#[test]
fn test_exact_static_match() {
    let mut router = Router::new();
    router.get("/", noop);
    router.get("/hello", noop);
    assert_eq!(matched(&router, Method::GET, "/").unwrap().0, "/");
    assert!(matched(&router, Method::GET, "/hello").unwrap().1.is_empty());
    assert!(matched(&router, Method::GET, "/hello/there").is_none());
    assert!(matched(&router, Method::GET, "/hell").is_none());
}

#[test]
fn test_param_captures_one_segment() {
    let mut router = Router::new();
    router.get("/users/:id", noop);
    let (_, params) = matched(&router, Method::GET, "/users/42").unwrap();
    assert_eq!(params, pairs(&[("id", "42")]));
    assert!(matched(&router, Method::GET, "/users/42/extra").is_none());
    assert!(matched(&router, Method::GET, "/users").is_none());
}

#[test]
fn test_multiple_params_in_order() {
    let mut router = Router::new();
    router.get("/users/:id/phone/:num", noop);
    let (pattern, params) = matched(&router, Method::GET, "/users/7/phone/555-1234").unwrap();
    assert_eq!(pattern, "/users/:id/phone/:num");
    assert_eq!(params, pairs(&[("id", "7"), ("num", "555-1234")]));
}

#[test]
fn test_catch_all_keeps_slashes() {
    let mut router = Router::new();
    router.get("/static/index", noop);
    router.get("/static/*filepath", noop);
    let (pattern, params) = matched(&router, Method::GET, "/static/index").unwrap();
    assert_eq!(pattern, "/static/index");
    assert!(params.is_empty());
    let (_, params) = matched(&router, Method::GET, "/static/js/app/main.js").unwrap();
    assert_eq!(params, pairs(&[("filepath", "js/app/main.js")]));
    // greedy: the static `index` branch is taken and has no `deeper` child
    assert!(matched(&router, Method::GET, "/static/index/deeper").is_none());
}

#[test]
fn test_static_match_ignores_case() {
    let mut router = Router::new();
    router.get("/users/:id", noop);
    let (_, params) = matched(&router, Method::GET, "/Users/42").unwrap();
    assert_eq!(params, pairs(&[("id", "42")]));
}

#[test]
fn test_encoded_segments_are_decoded() {
    let mut router = Router::new();
    router.get("/users/:name", noop);
    router.get("/café", noop);
    router.get("/files/*path", noop);
    let (_, params) = matched(&router, Method::GET, "/users/john%20doe").unwrap();
    assert_eq!(params, pairs(&[("name", "john doe")]));
    assert_eq!(matched(&router, Method::GET, "/caf%C3%A9").unwrap().0, "/café");
    let (_, params) = matched(&router, Method::GET, "/users/a%2Fb").unwrap();
    assert_eq!(params, pairs(&[("name", "a/b")]));
    let (_, params) = matched(&router, Method::GET, "/files/q%201/r.txt").unwrap();
    assert_eq!(params, pairs(&[("path", "q 1/r.txt")]));
}

#[test]
fn test_trailing_and_duplicate_slashes_ignored() {
    let mut router = Router::new();
    router.get("/users//list/", noop);
    assert!(matched(&router, Method::GET, "/users/list").is_some());
    assert!(matched(&router, Method::GET, "/users/list/").is_some());
    assert!(matched(&router, Method::GET, "//users/list").is_some());
}

#[test]
fn test_methods_are_independent() {
    let mut router = Router::new();
    router.post("/items", noop);
    router.get("/other", noop);
    assert!(matched(&router, Method::POST, "/items").is_some());
    assert!(matched(&router, Method::GET, "/other").is_some());
    match router.lookup(&Method::GET, "/items") {
        Lookup::MethodNotAllowed { allowed } => assert_eq!(allowed, vec![Method::POST]),
        other => panic!("expected 405, got {other:?}"),
    }
    assert!(matches!(
        router.lookup(&Method::GET, "/nowhere"),
        Lookup::NotFound
    ));
}

#[test]
fn test_per_method_param_names() {
    let mut router = Router::new();
    router.get("/u/:id", noop);
    router.post("/u/:uid", noop);
    assert_eq!(
        matched(&router, Method::GET, "/u/1").unwrap().1,
        pairs(&[("id", "1")])
    );
    assert_eq!(
        matched(&router, Method::POST, "/u/1").unwrap().1,
        pairs(&[("uid", "1")])
    );
}

#[test]
fn test_duplicate_param_names_first_wins() {
    let mut router = Router::new();
    router.get("/org/:id/user/:id", noop);
    let mut params = ParamVec::new();
    assert!(router.find(&Method::GET, "/org/1/user/2", &mut params).is_some());
    assert_eq!(params.len(), 2);
    assert_eq!(first_param(&params, "id"), Some("1"));
}

#[test]
fn test_last_registration_wins() {
    let mut router = Router::new();
    router.get("/dup", |ctx: &mut Context| ctx.string(200, "first"));
    router.get("/dup", |ctx: &mut Context| ctx.string(200, "second"));
    assert_eq!(router.len(), 1);

    let mut params = ParamVec::new();
    let handler = router.find(&Method::GET, "/dup", &mut params).unwrap();
    let recorder = crate::server::ResponseRecorder::new();
    let mut ctx = Context::new(Arc::default());
    ctx.reset(http::Request::new(Vec::new()), Box::new(recorder.clone()));
    handler.call(&mut ctx).unwrap();
    assert_eq!(recorder.body_string(), "second");
}

#[test]
fn test_greedy_no_backtracking() {
    let mut router = Router::new();
    router.get("/a/b/c", noop);
    router.get("/a/:x/d", noop);
    assert!(matched(&router, Method::GET, "/a/b/c").is_some());
    assert!(matched(&router, Method::GET, "/a/q/d").is_some());
    assert!(matched(&router, Method::GET, "/a/b/d").is_none());
}

#[test]
fn test_all_registers_seven_methods() {
    let mut router = Router::new();
    router.all("/any", noop);
    assert_eq!(router.len(), 7);
    for method in [Method::GET, Method::POST, Method::HEAD, Method::OPTIONS] {
        assert!(matched(&router, method, "/any").is_some());
    }
    assert!(matched(&router, Method::TRACE, "/any").is_none());
}

#[test]
fn test_unsupported_method() {
    let mut router = Router::new();
    let brew = Method::from_bytes(b"BREW").unwrap();
    assert_eq!(
        router.try_add(brew.clone(), "/pot", noop),
        Err(RouteError::UnsupportedMethod(brew.clone()))
    );
    assert!(matches!(router.lookup(&brew, "/pot"), Lookup::NotFound));

    router.get("/pot", noop);
    match router.lookup(&brew, "/pot") {
        Lookup::MethodNotAllowed { allowed } => assert_eq!(allowed, vec![Method::GET]),
        other => panic!("expected 405, got {other:?}"),
    }
}

#[test]
#[should_panic(expected = "must begin with '/'")]
fn test_add_panics_on_bad_pattern() {
    let mut router = Router::new();
    router.get("users", noop);
}

#[test]
fn test_routes_listing() {
    let mut router = Router::new();
    router.get("/users/:id", noop);
    router.delete("/users/:uid", noop);
    let mut routes = router.routes();
    routes.sort_by(|a, b| a.method.as_str().cmp(b.method.as_str()));
    assert_eq!(routes.len(), 2);
    assert_eq!(routes[0].method, Method::DELETE);
    assert_eq!(routes[0].pattern, "/users/:uid");
    assert_eq!(routes[1].tree_path, "/users/:id|uid");
}
