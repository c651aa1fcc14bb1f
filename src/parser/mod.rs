//! HTTP request-line parser module.
//!
//! This module extracts the method, target and version from the raw bytes
//! received on a connection. Headers and bodies are not needed for static
//! serving and are left unparsed.

mod request;
mod method;
mod version;
mod error;

// Re-export public items
pub use request::HttpRequest;
pub use method::Method;
pub use version::HttpVersion;
pub use error::Error;

// Re-export the parse_request function
pub use request::parse_request;
pub(crate) use request::first_line;
