use std::io;
use std::sync::Arc;

use http::{Request, StatusCode};
use parking_lot::Mutex;

use super::Dispatcher;
use crate::config::DispatcherConfig;
use crate::context::Context;
use crate::error::Error;
use crate::logging::{init_logger_with_writer, LogConfig};

#[derive(Clone, Default)]
struct Capture(Arc<Mutex<Vec<u8>>>);

impl io::Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn get(path: &str) -> Request<Vec<u8>> {
    Request::get(path).body(Vec::new()).unwrap()
}

fn assert_send_sync<T: Send + Sync>() {}

#[test]
fn test_dispatcher_is_shareable() {
    assert_send_sync::<Dispatcher>();
}

#[test]
fn test_logs_go_to_configured_logger() {
    let capture = Capture::default();
    let sink = capture.clone();
    let log = LogConfig {
        enabled: true,
        filter: "brrtmux=debug".into(),
        ..LogConfig::default()
    };
    let logger = init_logger_with_writer(&log, move || sink.clone()).unwrap();
    let mut app = Dispatcher::new(DispatcherConfig::default().with_logger(logger));
    app.get("/users/:id", |ctx: &mut Context| ctx.string(200, "ok"));
    app.get("/users/:id", |ctx: &mut Context| ctx.string(200, "again"));
    app.get("/boom", |_: &mut Context| -> Result<(), Error> {
        Err(Error::http(StatusCode::IM_A_TEAPOT, "short and stout"))
    });

    assert_eq!(app.handle(get("/boom")).status(), StatusCode::IM_A_TEAPOT);

    let text = String::from_utf8_lossy(&capture.0.lock()).into_owned();
    assert!(text.contains("Route registered"));
    assert!(text.contains("Replaced existing route handler"));
    assert!(text.contains("Request failed"));
}

#[test]
fn test_registration_reuses_router_without_cloning() {
    let mut app = Dispatcher::default();
    app.get("/a", |ctx: &mut Context| ctx.string(200, "a"));
    app.post("/a", |ctx: &mut Context| ctx.string(201, "a"));
    app.use_fn(|ctx, next| next.run(ctx));
    app.get("/b", |ctx: &mut Context| ctx.string(200, "b"));
    assert_eq!(app.router().len(), 3);
    assert_eq!(app.middleware_count(), 1);
    assert_eq!(app.handle(get("/b")).body(), b"b");
}

#[test]
fn test_try_add_reports_bad_patterns() {
    let mut app = Dispatcher::default();
    assert!(app
        .try_add(http::Method::GET, "no-slash", |ctx: &mut Context| ctx.string(200, ""))
        .is_err());
    // the chain is rebuilt even after a rejected registration
    app.get("/ok", |ctx: &mut Context| ctx.string(200, "ok"));
    assert_eq!(app.handle(get("/ok")).status(), StatusCode::OK);
}
