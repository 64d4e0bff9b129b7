//! Response writer wrapper.
//!
//! [`RawWriter`] is the transport side: whatever actually puts bytes on the wire.
//! [`ResponseWriter`] decorates it to capture the status code and body size exactly
//! once, so later middleware (access logs, metrics) can read them back without
//! touching the transport.
//!
//! Rules:
//! - The status defaults to `200 OK`; the first body write commits it if nothing
//!   else did.
//! - The status line and headers are committed once. Later `write_header` calls are
//!   ignored and reported as `false`.
//! - `flush` and `hijack` pass straight through to the transport. A hijacked writer
//!   refuses further writes.

use http::header::HeaderMap;
use http::StatusCode;
use std::io;
use tracing::debug;

use crate::error::Error;

/// A raw connection taken over from the transport (protocol upgrades, tunnels).
pub trait Connection: io::Read + io::Write + Send {}

impl<T: io::Read + io::Write + Send> Connection for T {}

/// Transport-facing response sink.
pub trait RawWriter: Send {
    /// Send the status line and headers.
    fn write_head(&mut self, status: StatusCode, headers: &HeaderMap) -> io::Result<()>;

    /// Send part of the body.
    fn write_body(&mut self, buf: &[u8]) -> io::Result<usize>;

    /// Push buffered bytes to the client (streaming responses).
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }

    /// Take over the underlying connection.
    fn hijack(&mut self) -> io::Result<Box<dyn Connection>> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "connection hijacking is not supported by this transport",
        ))
    }
}

/// Status and size capturing wrapper around a [`RawWriter`].
pub struct ResponseWriter {
    raw: Option<Box<dyn RawWriter>>,
    headers: HeaderMap,
    status: StatusCode,
    committed: bool,
    hijacked: bool,
    bytes_written: usize,
}

impl Default for ResponseWriter {
    fn default() -> Self {
        Self {
            raw: None,
            headers: HeaderMap::new(),
            status: StatusCode::OK,
            committed: false,
            hijacked: false,
            bytes_written: 0,
        }
    }
}

impl ResponseWriter {
    /// Wrap `raw`.
    #[must_use]
    pub fn new(raw: Box<dyn RawWriter>) -> Self {
        let mut writer = Self::default();
        writer.raw = Some(raw);
        writer
    }

    /// Rebind to a new transport, clearing all captured state.
    pub(crate) fn bind(&mut self, raw: Box<dyn RawWriter>) {
        self.release();
        self.raw = Some(raw);
    }

    /// Drop the transport and clear all captured state.
    pub(crate) fn release(&mut self) -> Option<Box<dyn RawWriter>> {
        self.headers.clear();
        self.status = StatusCode::OK;
        self.committed = false;
        self.hijacked = false;
        self.bytes_written = 0;
        self.raw.take()
    }

    fn raw(&mut self) -> Result<&mut Box<dyn RawWriter>, Error> {
        if self.hijacked {
            return Err(Error::Hijacked);
        }
        self.raw.as_mut().ok_or(Error::Unbound)
    }

    /// Status that was (or will be) sent.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Response headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Mutable response headers. Changes made after [`is_committed`](Self::is_committed)
    /// turns true never reach the client.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Whether the status line has been sent.
    #[must_use]
    pub fn is_committed(&self) -> bool {
        self.committed
    }

    /// Whether the connection was taken over.
    #[must_use]
    pub fn is_hijacked(&self) -> bool {
        self.hijacked
    }

    /// Body bytes written so far.
    #[must_use]
    pub fn bytes_written(&self) -> usize {
        self.bytes_written
    }

    /// Commit `status` and the current headers.
    ///
    /// Returns `Ok(false)` without touching the transport when the response was
    /// already committed.
    pub fn write_header(&mut self, status: StatusCode) -> Result<bool, Error> {
        if self.committed {
            debug!(
                requested = status.as_u16(),
                committed = self.status.as_u16(),
                "Ignoring status write on committed response"
            );
            return Ok(false);
        }
        let headers = std::mem::take(&mut self.headers);
        let result = self.raw().and_then(|raw| raw.write_head(status, &headers).map_err(Error::from));
        self.headers = headers;
        result?;
        self.status = status;
        self.committed = true;
        Ok(true)
    }

    /// Write body bytes, committing `200 OK` first if nothing was committed yet.
    pub fn write(&mut self, buf: &[u8]) -> Result<usize, Error> {
        if !self.committed {
            self.write_header(self.status)?;
        }
        let n = self.raw()?.write_body(buf)?;
        self.bytes_written += n;
        Ok(n)
    }

    /// Flush the transport, committing headers first.
    pub fn flush(&mut self) -> Result<(), Error> {
        if !self.committed {
            self.write_header(self.status)?;
        }
        self.raw()?.flush()?;
        Ok(())
    }

    /// Take over the underlying connection.
    ///
    /// The response counts as committed afterwards and further writes fail with
    /// [`Error::Hijacked`].
    pub fn hijack(&mut self) -> Result<Box<dyn Connection>, Error> {
        let conn = self.raw()?.hijack()?;
        self.hijacked = true;
        self.committed = true;
        Ok(conn)
    }

    /// Commit whatever status is pending if the handler never wrote anything.
    pub(crate) fn finish(&mut self) -> Result<(), Error> {
        if self.hijacked || self.raw.is_none() {
            return Ok(());
        }
        if !self.committed {
            self.write_header(self.status)?;
        }
        self.raw()?.flush()?;
        Ok(())
    }
}

impl io::Write for ResponseWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        ResponseWriter::write(self, buf).map_err(into_io)
    }

    fn flush(&mut self) -> io::Result<()> {
        ResponseWriter::flush(self).map_err(into_io)
    }
}

fn into_io(err: Error) -> io::Error {
    match err {
        Error::Io(e) => e,
        other => io::Error::other(other.to_string()),
    }
}
