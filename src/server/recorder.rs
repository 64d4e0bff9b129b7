use http::header::HeaderMap;
use http::{Response, StatusCode};
use parking_lot::Mutex;
use std::io::{self, Cursor};
use std::sync::Arc;

use super::response::{Connection, RawWriter};

#[derive(Default)]
struct Recorded {
    status: Option<StatusCode>,
    headers: HeaderMap,
    body: Vec<u8>,
    head_writes: usize,
    flushes: usize,
    hijacked: bool,
}

/// In-memory [`RawWriter`] that records everything written to it.
///
/// Clones share the same recording, so a caller can keep one clone and hand the
/// other to the dispatcher.
#[derive(Clone, Default)]
pub struct ResponseRecorder {
    inner: Arc<Mutex<Recorded>>,
}

impl ResponseRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Committed status, `None` if the status line was never written.
    pub fn status(&self) -> Option<StatusCode> {
        self.inner.lock().status
    }

    pub fn headers(&self) -> HeaderMap {
        self.inner.lock().headers.clone()
    }

    pub fn body(&self) -> Vec<u8> {
        self.inner.lock().body.clone()
    }

    pub fn body_string(&self) -> String {
        String::from_utf8_lossy(&self.inner.lock().body).into_owned()
    }

    /// How many times the status line was sent.
    pub fn head_writes(&self) -> usize {
        self.inner.lock().head_writes
    }

    pub fn flushes(&self) -> usize {
        self.inner.lock().flushes
    }

    pub fn is_hijacked(&self) -> bool {
        self.inner.lock().hijacked
    }

    /// Snapshot as an `http::Response`; an unwritten status reads as `200 OK`.
    pub fn to_response(&self) -> Response<Vec<u8>> {
        let rec = self.inner.lock();
        let mut response = Response::new(rec.body.clone());
        *response.status_mut() = rec.status.unwrap_or(StatusCode::OK);
        *response.headers_mut() = rec.headers.clone();
        response
    }
}

impl RawWriter for ResponseRecorder {
    fn write_head(&mut self, status: StatusCode, headers: &HeaderMap) -> io::Result<()> {
        let mut rec = self.inner.lock();
        rec.status = Some(status);
        rec.headers = headers.clone();
        rec.head_writes += 1;
        Ok(())
    }

    fn write_body(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.lock().body.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.lock().flushes += 1;
        Ok(())
    }

    fn hijack(&mut self) -> io::Result<Box<dyn Connection>> {
        self.inner.lock().hijacked = true;
        Ok(Box::new(Cursor::new(Vec::new())))
    }
}
