//! HTTP request-line parsing and representation.

use std::borrow::Cow;
use std::str::FromStr;

use crate::parser::error::Error;
use crate::parser::method::Method;
use crate::parser::version::HttpVersion;

/// Represents the request line of an HTTP request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// The HTTP method (always GET once parsing succeeds)
    pub method: Method,
    /// The raw request target, still percent-encoded and including any query
    pub target: String,
    /// The HTTP version
    pub version: HttpVersion,
}

impl HttpRequest {
    /// Create a new HTTP request.
    pub fn new(method: Method, target: impl Into<String>, version: HttpVersion) -> Self {
        Self {
            method,
            target: target.into(),
            version,
        }
    }

    /// The request line as it would appear on the wire, without terminator.
    pub fn request_line(&self) -> String {
        format!("{} {} {}", self.method, self.target, self.version)
    }
}

/// Return the first line of `input` for logging, lossily decoded and
/// stripped of its terminator.
pub(crate) fn first_line(input: &[u8]) -> Cow<'_, str> {
    let line = match input.iter().position(|&b| b == b'\n') {
        Some(end) => &input[..end],
        None => input,
    };
    match String::from_utf8_lossy(line) {
        Cow::Borrowed(s) => Cow::Borrowed(s.trim()),
        Cow::Owned(s) => Cow::Owned(s.trim().to_string()),
    }
}

/// Parse an HTTP request line from a byte slice.
///
/// Only the first line is examined; anything after the first `\n` is ignored.
/// A malformed line or version is reported before an unsupported method, so a
/// broken request always yields 400 rather than 405.
///
/// # Arguments
///
/// * `input` - A byte slice containing at least the request line
///
/// # Returns
///
/// The parsed request, or an error if the request line is invalid or the
/// method is not GET
pub fn parse_request(input: &[u8]) -> Result<HttpRequest, Error> {
    if input.is_empty() {
        return Err(Error::EmptyRequest);
    }

    // Cut at the first line terminator and drop a trailing CR
    let line = match input.iter().position(|&b| b == b'\n') {
        Some(end) => &input[..end],
        None => input,
    };
    let line = line.strip_suffix(b"\r").unwrap_or(line);

    let request_line = match std::str::from_utf8(line) {
        Ok(s) => s,
        Err(_) => return Err(Error::MalformedRequestLine("Invalid UTF-8".to_string())),
    };

    // Split the request line into method, target, and version
    let parts: Vec<&str> = request_line.split_whitespace().collect();
    if parts.len() != 3 {
        return Err(Error::MalformedRequestLine(request_line.to_string()));
    }

    let method = Method::from_str(parts[0])?;
    let target = parts[1];
    let version = HttpVersion::from_str(parts[2])?;

    if method != Method::GET {
        return Err(Error::UnsupportedMethod(method));
    }

    Ok(HttpRequest::new(method, target, version))
}
