use brrtmux::context::Context;
use brrtmux::dispatcher::Dispatcher;
use brrtmux::DispatcherConfig;
use http::{Method, StatusCode};

mod common;
use common::{body_text, request};

fn app(limit: usize) -> Dispatcher {
    let mut app = Dispatcher::new(DispatcherConfig {
        max_request_body_size: limit,
        ..DispatcherConfig::default()
    });
    app.post("/upload", |ctx: &mut Context| {
        let len = ctx.body()?.len();
        ctx.string(200, &len.to_string())
    });
    app.post("/ignore", |ctx: &mut Context| ctx.string(204, ""));
    app
}

#[test]
fn test_body_within_limit() {
    let response = app(64).handle(request(Method::POST, "/upload", vec![b'a'; 64]));
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(&response), "64");
}

#[test]
fn test_body_over_limit_is_rejected() {
    let response = app(64).handle(request(Method::POST, "/upload", vec![b'a'; 65]));
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body_text(&response), "Payload Too Large");
}

#[test]
fn test_limit_only_applies_when_body_is_read() {
    let response = app(4).handle(request(Method::POST, "/ignore", vec![b'a'; 128]));
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[test]
fn test_form_respects_limit() {
    let mut app = app(16);
    app.post("/form", |ctx: &mut Context| {
        let name = ctx.form("name")?.unwrap_or_default();
        ctx.string(200, &name)
    });
    let ok = app.handle(request(Method::POST, "/form", b"name=ferris".to_vec()));
    assert_eq!(body_text(&ok), "ferris");
    let big = app.handle(request(
        Method::POST,
        "/form",
        b"name=ferris&padding=xxxxxxxxxxxx".to_vec(),
    ));
    assert_eq!(big.status(), StatusCode::PAYLOAD_TOO_LARGE);
}
