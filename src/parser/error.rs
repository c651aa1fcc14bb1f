//! Error types for the HTTP parser.

use thiserror::Error;

use crate::parser::method::Method;
use crate::server::StatusCode;

/// Errors that can occur during HTTP request parsing.
#[derive(Debug, Error)]
pub enum Error {
    /// The request line does not have the `METHOD TARGET VERSION` shape.
    #[error("Malformed request line: {0}")]
    MalformedRequestLine(String),

    /// The HTTP version is not `HTTP/1.x`.
    #[error("Unsupported HTTP version: {0}")]
    UnsupportedVersion(String),

    /// The request line is well formed but the method is not GET.
    #[error("Unsupported HTTP method: {0}")]
    UnsupportedMethod(Method),

    /// The request is empty.
    #[error("Empty request")]
    EmptyRequest,
}

impl Error {
    /// The status code sent back to the client for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Error::UnsupportedMethod(_) => StatusCode::MethodNotAllowed,
            Error::MalformedRequestLine(_) | Error::UnsupportedVersion(_) | Error::EmptyRequest => {
                StatusCode::BadRequest
            }
        }
    }
}
