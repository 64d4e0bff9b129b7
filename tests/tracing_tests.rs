use brrtmux::context::Context;
use brrtmux::dispatcher::Dispatcher;
use brrtmux::error::Error;
use brrtmux::middleware::AccessLog;
use brrtmux::DispatcherConfig;
use http::StatusCode;

mod common;
use common::get;
use tracing_util::TestTracing;

fn app(tracing: &TestTracing, filter: &str) -> Dispatcher {
    let config = DispatcherConfig::default().with_logger(tracing.logger(filter));
    let mut app = Dispatcher::new(config);
    app.use_middleware(AccessLog);
    app.get("/pets/:id", |ctx: &mut Context| ctx.string(200, "rex"));
    app.get("/broken", |_: &mut Context| -> Result<(), Error> {
        Err(Error::http(StatusCode::SERVICE_UNAVAILABLE, "down"))
    });
    app
}

#[test]
fn test_access_log_event_per_request() {
    let tracing = TestTracing::init();
    let app = app(&tracing, "info");
    app.handle(get("/pets/12345"));

    let events = tracing.events_with_message("Request completed");
    assert_eq!(events.len(), 1);
    let event = &events[0];
    assert_eq!(event["level"], "INFO");
    assert_eq!(event["fields"]["status"], 200);
    assert_eq!(event["fields"]["bytes"], 3);
    assert_eq!(event["span"]["name"], "request");
    assert_eq!(event["span"]["method"], "GET");
    assert_eq!(event["span"]["path"], "/pets/12345");
}

#[test]
fn test_failed_request_logged_as_warning() {
    let tracing = TestTracing::init();
    let app = app(&tracing, "info");
    let response = app.handle(get("/broken"));
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let failed = tracing.events_with_message("Request failed");
    let levels: Vec<&str> = failed.iter().filter_map(|e| e["level"].as_str()).collect();
    // one from the access log, one from the default error handler
    assert!(levels.contains(&"WARN"));
    assert!(levels.contains(&"ERROR"));
    assert!(tracing.events_with_message("Request completed").is_empty());
}

#[test]
fn test_registration_logged_at_debug() {
    let tracing = TestTracing::init();
    let _app = app(&tracing, "brrtmux=debug");
    assert!(!tracing.events_with_message("Route registered").is_empty());

    let quiet = TestTracing::init();
    let _app = app(&quiet, "warn");
    assert!(quiet.events().is_empty());
}

#[test]
fn test_default_logger_is_silent() {
    let mut app = Dispatcher::default();
    app.use_middleware(AccessLog);
    app.get("/", common::noop);
    // nothing installed globally either; the request still succeeds
    assert_eq!(app.handle(get("/")).status(), StatusCode::OK);
}
