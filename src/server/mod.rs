//! Static-file HTTP server implementation for microstatic-rs.
//!
//! This module wires the request parser, path resolver, error pages and
//! response writer into a per-connection handler, and runs one handler task
//! per accepted connection.

mod response;
mod config;
mod error;
mod error_pages;
mod handler;
mod http_server;
mod mime;
mod resolver;

// Re-export public items
pub use response::{Delivery, ResponseHead, ResponseWriter, StatusCode};
pub use config::{ConfigFile, ServerConfig};
pub use error::Error;
pub use error_pages::{ErrorPage, ErrorPages};
pub use handler::ConnectionHandler;
pub use http_server::{HttpServer, ShutdownSignal};
pub use mime::{MimeLookup, MimeTable};
pub use resolver::PathResolver;
