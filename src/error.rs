//! Error taxonomy.
//!
//! Three families, matching when they can happen:
//!
//! - [`RouteError`] - route registration faults. Registration runs before serving, so
//!   the panicking registration helpers turn these into a startup abort.
//! - [`Error`] - request-time failures reported by handlers or by the context helpers.
//!   They travel back up the middleware chain to the dispatcher's [`ErrorHandler`].
//! - [`StoreError`] - typed retrieval failures from the per-request key/value store.
//!
//! [`ErrorHandler`]: crate::dispatcher::ErrorHandler

use http::{Method, StatusCode};
use thiserror::Error;

/// Route registration faults.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    /// The path was empty.
    #[error("route path cannot be empty")]
    EmptyPath,

    /// The path did not begin with `/`.
    #[error("route path `{0}` must begin with '/'")]
    MissingLeadingSlash(String),

    /// A `:` or `*` segment had no name after the marker.
    #[error("route path `{path}` has an unnamed parameter segment")]
    UnnamedParameter {
        /// The offending pattern
        path: String,
    },

    /// Something followed a catch-all segment.
    #[error("route path `{path}`: catch-all `*{name}` must be the last segment")]
    CatchAllNotLast {
        /// The offending pattern
        path: String,
        /// Name of the catch-all parameter
        name: String,
    },

    /// A parameter child and a catch-all child would share one node.
    #[error("route path `{path}`: segment `{segment}` conflicts with an existing {existing} segment at the same position")]
    Conflict {
        /// The offending pattern
        path: String,
        /// The segment being inserted
        segment: String,
        /// Kind of the segment already present
        existing: &'static str,
    },

    /// The method is not one of the nine routable HTTP methods.
    #[error("unsupported http method `{0}`")]
    UnsupportedMethod(Method),
}

/// Typed store retrieval failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Nothing is stored under the key.
    #[error("no value stored under `{0}`")]
    Missing(String),

    /// A value exists but has a different type.
    #[error("value under `{key}` is a `{found}`, not a `{expected}`")]
    TypeMismatch {
        /// The key looked up
        key: String,
        /// Type requested by the caller
        expected: &'static str,
        /// Type actually stored
        found: &'static str,
    },
}

/// Request-time errors.
#[derive(Debug, Error)]
pub enum Error {
    /// A handler-chosen HTTP failure.
    #[error("{status}: {message}")]
    Http {
        /// Status to report
        status: StatusCode,
        /// Message for the response body
        message: String,
    },

    /// The request body exceeded `max_request_body_size`.
    #[error("request body of {size} bytes exceeds the limit of {limit} bytes")]
    PayloadTooLarge {
        /// Actual body size
        size: usize,
        /// Configured limit
        limit: usize,
    },

    /// `redirect` was called with a status that is not a redirect.
    #[error("cannot redirect with status code {0}")]
    InvalidRedirect(u16),

    /// A path or query parameter could not be parsed.
    #[error("parameter `{name}` value `{value}` is not a valid integer")]
    InvalidParam {
        /// Parameter name
        name: String,
        /// Raw value
        value: String,
    },

    /// A response header name or value was not valid HTTP.
    #[error("invalid response header: {0}")]
    InvalidHeader(String),

    /// The connection was hijacked; the writer can no longer be used.
    #[error("response writer used after the connection was hijacked")]
    Hijacked,

    /// No writer is bound to the context.
    #[error("no response writer bound to the context")]
    Unbound,

    /// Typed store failure.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Transport I/O failure.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The request body was not valid JSON for the expected type.
    #[error("invalid JSON request body: {0}")]
    InvalidBody(#[source] serde_json::Error),

    /// JSON encoding of a response value failed.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Anything else a handler wants to report.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Shorthand for [`Error::Http`].
    pub fn http(status: StatusCode, message: impl Into<String>) -> Self {
        Error::Http {
            status,
            message: message.into(),
        }
    }

    /// The status an error handler should answer with.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Error::Http { status, .. } => *status,
            Error::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Error::InvalidParam { .. } | Error::InvalidBody(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            Error::http(StatusCode::UNAUTHORIZED, "nope").status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            Error::PayloadTooLarge { size: 2, limit: 1 }.status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(Error::Hijacked.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_json_decode_and_encode_statuses_differ() {
        let decode = serde_json::from_str::<u32>("nope").unwrap_err();
        assert_eq!(Error::InvalidBody(decode).status(), StatusCode::BAD_REQUEST);
        let mut map = std::collections::BTreeMap::new();
        map.insert(vec![1u8], 1);
        let encode = serde_json::to_string(&map).unwrap_err();
        assert_eq!(Error::from(encode).status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_route_error_messages() {
        let err = RouteError::MissingLeadingSlash("users".into());
        assert_eq!(err.to_string(), "route path `users` must begin with '/'");
        let err = RouteError::UnsupportedMethod(Method::from_bytes(b"BREW").unwrap());
        assert!(err.to_string().contains("BREW"));
    }
}
