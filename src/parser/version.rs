//! HTTP protocol versions.

use std::fmt;
use std::str::FromStr;

use crate::parser::error::Error;

/// An HTTP/1.x protocol version. Only the minor digit varies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpVersion {
    minor: u8,
}

impl HttpVersion {
    pub const HTTP_10: HttpVersion = HttpVersion { minor: 0 };
    pub const HTTP_11: HttpVersion = HttpVersion { minor: 1 };

    /// The minor version digit.
    pub fn minor(&self) -> u8 {
        self.minor
    }
}

impl FromStr for HttpVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Exactly `HTTP/1.<digit>`
        match s.strip_prefix("HTTP/1.").map(str::as_bytes) {
            Some([digit]) if digit.is_ascii_digit() => Ok(HttpVersion { minor: digit - b'0' }),
            _ => Err(Error::UnsupportedVersion(s.to_string())),
        }
    }
}

impl fmt::Display for HttpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP/1.{}", self.minor)
    }
}
