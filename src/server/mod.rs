//! Transport boundary.
//!
//! The dispatcher never touches sockets. A transport hands it an
//! `http::Request<Vec<u8>>` plus a [`RawWriter`] for the response; the
//! [`ResponseWriter`] wrapped around that writer is what handlers see.
//! [`ResponseRecorder`] is an in-memory `RawWriter` for tests and tools.

mod recorder;
mod response;

pub use recorder::ResponseRecorder;
pub use response::{Connection, RawWriter, ResponseWriter};
