//! A minimal concurrent static-file HTTP server.
//!
//! This library serves files from a document root over HTTP/1.1, one GET
//! request per connection, with traversal protection and per-status error
//! pages.
//!
//! # Features
//!
//! - Request-line parsing with 400/405 classification
//! - Sandboxed path resolution (percent-decoding, `..` collapsing, symlink-aware containment)
//! - Streaming file responses with a fixed header order and `Connection: close`
//! - Custom `<status>.html` error pages with generated fallbacks
//! - One task per connection, optional connection limit, graceful shutdown
//!
//! # Examples
//!
//! ## Parsing a request line
//!
//! ```
//! use microstatic::{parse_request, Method, ParserError};
//!
//! let request = parse_request(b"GET /index.html HTTP/1.1\r\nHost: example.com\r\n\r\n").unwrap();
//! assert_eq!(request.method, Method::GET);
//! assert_eq!(request.target, "/index.html");
//!
//! match parse_request(b"POST /index.html HTTP/1.1\r\n\r\n") {
//!     Err(ParserError::UnsupportedMethod(method)) => println!("Method not allowed: {method}"),
//!     other => panic!("unexpected: {other:?}"),
//! }
//! ```
//!
//! ## Running a server
//!
//! ```no_run
//! use microstatic::{HttpServer, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), microstatic::ServerError> {
//!     let config = ServerConfig::new("localhost", 8080, "www")?;
//!     HttpServer::new(config).start().await
//! }
//! ```

// Export the parser module
pub mod parser;

// Export the server module
pub mod server;

// Re-export commonly used items for convenience
pub use parser::{Error as ParserError, HttpRequest, HttpVersion, Method, parse_request};
pub use server::{
    ConfigFile, ConnectionHandler, Error as ServerError, HttpServer, MimeLookup, MimeTable, PathResolver,
    ServerConfig, ShutdownSignal, StatusCode,
};
