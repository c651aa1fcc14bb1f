//! HTTP request methods.

use std::fmt;
use std::str::FromStr;

use crate::parser::error::Error;

/// HTTP request methods as defined in RFC 7231 and common extensions.
///
/// Only [`Method::GET`] is served; the others are recognised so they can be
/// reported in logs and error messages.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Method {
    /// GET method: Requests a representation of the specified resource.
    GET,
    /// POST method: Submits data to be processed to the identified resource.
    POST,
    /// PUT method: Replaces all current representations of the target resource with the request payload.
    PUT,
    /// DELETE method: Deletes the specified resource.
    DELETE,
    /// HEAD method: Same as GET but only transfers the status line and header section.
    HEAD,
    /// OPTIONS method: Describes the communication options for the target resource.
    OPTIONS,
    /// PATCH method: Applies partial modifications to a resource.
    PATCH,
    /// Any other method token.
    Extension(String),
}

// Method names are case-sensitive: "get" is an extension method, not GET.
impl FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GET" => Ok(Method::GET),
            "POST" => Ok(Method::POST),
            "PUT" => Ok(Method::PUT),
            "DELETE" => Ok(Method::DELETE),
            "HEAD" => Ok(Method::HEAD),
            "OPTIONS" => Ok(Method::OPTIONS),
            "PATCH" => Ok(Method::PATCH),
            "" => Err(Error::MalformedRequestLine("empty method".to_string())),
            _ => Ok(Method::Extension(s.to_string())),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Extension(name) => f.write_str(name),
            _ => write!(f, "{self:?}"),
        }
    }
}
