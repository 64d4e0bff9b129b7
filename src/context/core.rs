use http::header::{HeaderName, HeaderValue, CONTENT_TYPE, LOCATION};
use http::{Method, Request, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::any::Any;
use std::sync::Arc;
use tracing::debug;

use super::store::Store;
use crate::config::DispatcherConfig;
use crate::error::{Error, StoreError};
use crate::router::{first_param, ParamVec};
use crate::server::{RawWriter, ResponseWriter};

/// Per-request state handed to every middleware and handler.
///
/// A `Context` is recycled through the dispatcher's pool: [`Context::reset`] binds
/// it to a new request and writer, and everything request-scoped (parameters, the
/// query cache, the store) starts empty again.
pub struct Context {
    config: Arc<DispatcherConfig>,
    request: Request<Vec<u8>>,
    writer: ResponseWriter,
    query: Option<Vec<(String, String)>>,
    params: ParamVec,
    store: Option<Store>,
}

impl Context {
    /// An idle context; bind it with [`Context::reset`] before use.
    #[must_use]
    pub fn new(config: Arc<DispatcherConfig>) -> Self {
        Self {
            config,
            request: Request::default(),
            writer: ResponseWriter::default(),
            query: None,
            params: ParamVec::new(),
            store: None,
        }
    }

    /// Bind to `request` and `raw`, dropping all state from the previous request.
    pub fn reset(&mut self, request: Request<Vec<u8>>, raw: Box<dyn RawWriter>) {
        self.clear();
        self.request = request;
        self.writer.bind(raw);
    }

    /// Drop the request and transport handles so an idle context holds nothing
    /// request-specific.
    pub(crate) fn release(&mut self) {
        self.clear();
        self.request = Request::default();
        self.writer.release();
    }

    fn clear(&mut self) {
        self.query = None;
        self.params.clear();
        self.store = None;
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    // ---- request -------------------------------------------------------------

    pub fn request(&self) -> &Request<Vec<u8>> {
        &self.request
    }

    pub fn method(&self) -> &Method {
        self.request.method()
    }

    /// Request path as sent, still percent-encoded. Route parameters are decoded.
    pub fn path(&self) -> &str {
        self.request.uri().path()
    }

    /// Request header as text; `None` when absent or not visible ASCII.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.request
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
    }

    /// Value of the path parameter `name`. With duplicate names the first one wins.
    pub fn param(&self, name: &str) -> Option<&str> {
        first_param(&self.params, name)
    }

    /// Path parameter parsed as an integer.
    pub fn param_int(&self, name: &str) -> Result<i64, Error> {
        let value = self.param(name).unwrap_or_default();
        value.parse().map_err(|_| Error::InvalidParam {
            name: name.to_owned(),
            value: value.to_owned(),
        })
    }

    /// All path parameters in order of appearance.
    pub fn params(&self) -> &ParamVec {
        &self.params
    }

    pub(crate) fn params_mut(&mut self) -> &mut ParamVec {
        &mut self.params
    }

    /// First value of query parameter `key`.
    ///
    /// The query string is decoded on the first call and cached for the rest of
    /// the request.
    pub fn query(&mut self, key: &str) -> Option<&str> {
        let request = &self.request;
        let pairs = self.query.get_or_insert_with(|| {
            request
                .uri()
                .query()
                .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
                .unwrap_or_default()
        });
        pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Query parameter parsed as an integer.
    pub fn query_int(&mut self, key: &str) -> Result<i64, Error> {
        let value = self.query(key).unwrap_or_default().to_owned();
        value.parse().map_err(|_| Error::InvalidParam {
            name: key.to_owned(),
            value,
        })
    }

    /// Query parameter parsed as an integer, or `default` when missing or malformed.
    pub fn query_int_or(&mut self, key: &str, default: i64) -> i64 {
        self.query(key)
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    /// Request body, refused when larger than `max_request_body_size`.
    pub fn body(&self) -> Result<&[u8], Error> {
        let body = self.request.body();
        let limit = self.config.max_request_body_size;
        if body.len() > limit {
            return Err(Error::PayloadTooLarge {
                size: body.len(),
                limit,
            });
        }
        Ok(body)
    }

    /// Decode the request body as JSON.
    pub fn bind_json<T: DeserializeOwned>(&self) -> Result<T, Error> {
        serde_json::from_slice(self.body()?).map_err(Error::InvalidBody)
    }

    /// First value of the urlencoded form field `name` from the request body.
    pub fn form(&self, name: &str) -> Result<Option<String>, Error> {
        Ok(url::form_urlencoded::parse(self.body()?)
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.into_owned()))
    }

    // ---- response ------------------------------------------------------------

    pub fn writer(&self) -> &ResponseWriter {
        &self.writer
    }

    pub fn writer_mut(&mut self) -> &mut ResponseWriter {
        &mut self.writer
    }

    /// Commit `code`. Ignored when the response was already committed.
    pub fn set_status(&mut self, code: u16) -> Result<(), Error> {
        self.writer.write_header(status_code(code)?)?;
        Ok(())
    }

    pub fn status(&self) -> StatusCode {
        self.writer.status()
    }

    pub fn is_committed(&self) -> bool {
        self.writer.is_committed()
    }

    /// Set a response header; an empty `value` removes it.
    ///
    /// Has no effect once the response is committed.
    pub fn set_header(&mut self, name: &str, value: &str) -> Result<(), Error> {
        if self.writer.is_committed() {
            debug!(header = %name, "Ignoring header set on committed response");
            return Ok(());
        }
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| Error::InvalidHeader(format!("{name}: {e}")))?;
        if value.is_empty() {
            self.writer.headers_mut().remove(&name);
            return Ok(());
        }
        let value = HeaderValue::from_str(value)
            .map_err(|e| Error::InvalidHeader(format!("{name}: {e}")))?;
        self.writer.headers_mut().insert(name, value);
        Ok(())
    }

    /// Write raw body bytes.
    pub fn write(&mut self, buf: &[u8]) -> Result<usize, Error> {
        self.writer.write(buf)
    }

    /// Respond with `code` and a plain-text body.
    pub fn string(&mut self, code: u16, body: &str) -> Result<(), Error> {
        let status = status_code(code)?;
        self.default_content_type("text/plain; charset=utf-8");
        self.writer.write_header(status)?;
        self.writer.write(body.as_bytes())?;
        Ok(())
    }

    /// Respond with `code` and `value` encoded as JSON.
    pub fn json<T: Serialize + ?Sized>(&mut self, code: u16, value: &T) -> Result<(), Error> {
        let status = status_code(code)?;
        let body = serde_json::to_vec(value)?;
        self.default_content_type("application/json");
        self.writer.write_header(status)?;
        self.writer.write(&body)?;
        Ok(())
    }

    /// Redirect to `location`. `code` must be 300..=308 or 201.
    pub fn redirect(&mut self, code: u16, location: &str) -> Result<(), Error> {
        if !(300..=308).contains(&code) && code != 201 {
            return Err(Error::InvalidRedirect(code));
        }
        let status = status_code(code)?;
        self.set_header(LOCATION.as_str(), location)?;
        self.writer.write_header(status)?;
        Ok(())
    }

    fn default_content_type(&mut self, value: &'static str) {
        if !self.writer.is_committed() {
            self.writer
                .headers_mut()
                .entry(CONTENT_TYPE)
                .or_insert(HeaderValue::from_static(value));
        }
    }

    // ---- store ---------------------------------------------------------------

    /// Store `value` under `key` for the rest of this request.
    pub fn set<T: Any + Send + Sync>(&mut self, key: impl Into<String>, value: T) {
        self.store.get_or_insert_with(Store::default).set(key, value);
    }

    pub fn get<T: Any>(&self, key: &str) -> Result<&T, StoreError> {
        match &self.store {
            Some(store) => store.get(key),
            None => Err(StoreError::Missing(key.to_owned())),
        }
    }

    pub fn get_mut<T: Any>(&mut self, key: &str) -> Result<&mut T, StoreError> {
        match &mut self.store {
            Some(store) => store.get_mut(key),
            None => Err(StoreError::Missing(key.to_owned())),
        }
    }

    pub fn take<T: Any>(&mut self, key: &str) -> Result<T, StoreError> {
        match &mut self.store {
            Some(store) => store.take(key),
            None => Err(StoreError::Missing(key.to_owned())),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.store.as_ref().is_some_and(|s| s.contains(key))
    }
}

fn status_code(code: u16) -> Result<StatusCode, Error> {
    StatusCode::from_u16(code).map_err(|_| {
        Error::http(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("invalid status code {code}"),
        )
    })
}
