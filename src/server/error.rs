//! Error types for the HTTP server.

use std::path::PathBuf;

use thiserror::Error;

use crate::parser::Error as ParserError;
use crate::server::response::StatusCode;

/// Errors that can occur during HTTP server operation.
///
/// Per-request variants map onto a response status through [`Error::status`];
/// the configuration variants only occur at startup.
#[derive(Debug, Error)]
pub enum Error {
    /// Error parsing the request line.
    #[error("Parse error: {0}")]
    ParseError(#[from] ParserError),

    /// The request target could not be decoded.
    #[error("Bad request target: {0}")]
    BadTarget(String),

    /// The target escapes the document root, or names a directory without an index.
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// Requested resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The target has a denylisted extension.
    #[error("Unsupported resource: {0}")]
    UnsupportedResource(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Internal server error.
    #[error("Internal server error: {0}")]
    InternalError(String),

    /// The document root is missing or not a directory.
    #[error("Invalid document root {path}: {reason}")]
    DocumentRoot { path: PathBuf, reason: String },

    /// Any other invalid configuration value.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// JSON configuration could not be deserialized.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl Error {
    /// The status code sent back to the client for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Error::ParseError(e) => e.status(),
            Error::BadTarget(_) => StatusCode::BadRequest,
            Error::AccessDenied(_) => StatusCode::Forbidden,
            Error::NotFound(_) => StatusCode::NotFound,
            Error::UnsupportedResource(_) => StatusCode::NotImplemented,
            Error::IoError(_)
            | Error::InternalError(_)
            | Error::DocumentRoot { .. }
            | Error::InvalidConfig(_)
            | Error::JsonError(_) => StatusCode::InternalServerError,
        }
    }
}
