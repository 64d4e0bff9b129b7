use serde_json::{json, Map, Value};

use crate::context::Context;
use crate::error::Error;
use crate::handler::Handler;
use crate::middleware::request_id;

/// Handler that answers with a JSON description of the request it received.
///
/// Used by `brrtmux probe` to show how a route table resolves a request.
pub(crate) struct EchoHandler {
    name: String,
}

impl EchoHandler {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Handler for EchoHandler {
    fn call(&self, ctx: &mut Context) -> Result<(), Error> {
        let params: Map<String, Value> = ctx
            .params()
            .iter()
            .map(|(k, v)| (k.to_string(), Value::String(v.clone())))
            .collect();
        let query: Vec<Value> = ctx
            .request()
            .uri()
            .query()
            .map(|q| {
                url::form_urlencoded::parse(q.as_bytes())
                    .map(|(k, v)| json!([k, v]))
                    .collect()
            })
            .unwrap_or_default();
        let body = ctx.body()?;
        let body = (!body.is_empty()).then(|| String::from_utf8_lossy(body).into_owned());

        let response = json!({
            "handler": self.name,
            "method": ctx.method().as_str(),
            "path": ctx.path(),
            "params": params,
            "query": query,
            "request_id": request_id(ctx),
            "body": body,
        });
        ctx.json(200, &response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::Dispatcher;
    use crate::middleware::RequestIdMiddleware;
    use http::Request;

    #[test]
    fn test_echo_describes_request() {
        let mut app = Dispatcher::default();
        app.use_middleware(RequestIdMiddleware);
        app.post("/users/:id", EchoHandler::new("update_user"));
        let response = app.handle(
            Request::post("/users/42?verbose=1&verbose=2")
                .body(b"hi".to_vec())
                .unwrap(),
        );
        let value: Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(value["handler"], "update_user");
        assert_eq!(value["method"], "POST");
        assert_eq!(value["params"]["id"], "42");
        assert_eq!(value["query"], json!([["verbose", "1"], ["verbose", "2"]]));
        assert_eq!(value["body"], "hi");
        assert_eq!(value["request_id"].as_str().map(str::len), Some(26));
    }
}
