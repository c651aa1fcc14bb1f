//! HTTP response framing and delivery.

use std::io;
use std::path::Path;
use std::time::{Duration, SystemTime};

use log::{debug, warn};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;

use crate::server::config::ServerConfig;
use crate::server::error::Error;
use crate::server::error_pages::ErrorPages;
use crate::server::mime::MimeLookup;

/// HTTP status codes with their standard reason phrases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCode {
    Ok = 200,
    BadRequest = 400,
    Forbidden = 403,
    NotFound = 404,
    MethodNotAllowed = 405,
    InternalServerError = 500,
    NotImplemented = 501,
    ServiceUnavailable = 503,
}

impl StatusCode {
    /// The numeric status code.
    pub fn code(&self) -> u16 {
        *self as u16
    }

    /// Get the reason phrase for this status code.
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::Forbidden => "Forbidden",
            StatusCode::NotFound => "Not Found",
            StatusCode::MethodNotAllowed => "Method Not Allowed",
            StatusCode::InternalServerError => "Internal Server Error",
            StatusCode::NotImplemented => "Not Implemented",
            StatusCode::ServiceUnavailable => "Service Unavailable",
        }
    }

    /// One-sentence explanation used in generated error pages.
    pub fn description(&self) -> &'static str {
        match self {
            StatusCode::Ok => "The request succeeded.",
            StatusCode::BadRequest => "Malformed request.",
            StatusCode::Forbidden => "Access denied.",
            StatusCode::NotFound => "The requested file was not found on this server.",
            StatusCode::MethodNotAllowed => "Method not supported.",
            StatusCode::InternalServerError => "Internal server error.",
            StatusCode::NotImplemented => "This resource type is not served.",
            StatusCode::ServiceUnavailable => "Server is at capacity, please try again later.",
        }
    }
}

/// Outcome of a best-effort write. Never an error: a dropped response only
/// means the peer went away or stalled past the write timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// The whole response was written.
    Sent,
    /// Writing stopped early; the connection should just be closed.
    Dropped,
}

/// The status line and header block of a response.
#[derive(Debug, Clone)]
pub struct ResponseHead {
    pub status: StatusCode,
    pub date: SystemTime,
    pub server: String,
    pub content_type: String,
    pub content_length: u64,
}

impl ResponseHead {
    /// Create a response head dated now.
    pub fn new(
        status: StatusCode,
        server: impl Into<String>,
        content_type: impl Into<String>,
        content_length: u64,
    ) -> Self {
        Self {
            status,
            date: SystemTime::now(),
            server: server.into(),
            content_type: content_type.into(),
            content_length,
        }
    }

    /// Convert the head to bytes, ending with the blank separator line.
    ///
    /// Header order is fixed: Date, Server, Content-Type, Content-Length,
    /// Connection.
    pub fn to_bytes(&self) -> Vec<u8> {
        format!(
            "HTTP/1.1 {code} {reason}\r\n\
             Date: {date}\r\n\
             Server: {server}\r\n\
             Content-Type: {content_type}\r\n\
             Content-Length: {length}\r\n\
             Connection: close\r\n\
             \r\n",
            code = self.status.code(),
            reason = self.status.reason_phrase(),
            date = httpdate::fmt_http_date(self.date),
            server = self.server,
            content_type = self.content_type,
            length = self.content_length,
        )
        .into_bytes()
    }
}

/// Writes one response onto a connection.
pub struct ResponseWriter<'a, S> {
    stream: &'a mut S,
    server_name: &'a str,
    chunk_size: usize,
    write_timeout: Duration,
}

impl<'a, S> ResponseWriter<'a, S>
where
    S: AsyncWrite + Unpin,
{
    /// Create a writer using the framing settings from `config`.
    pub fn new(stream: &'a mut S, config: &'a ServerConfig) -> Self {
        Self {
            stream,
            server_name: config.server_name(),
            chunk_size: config.chunk_size(),
            write_timeout: config.write_timeout(),
        }
    }

    /// Write `buf` fully, bounded by the write timeout.
    async fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        match timeout(self.write_timeout, self.stream.write_all(buf)).await {
            Ok(result) => result,
            Err(_) => Err(io::Error::new(io::ErrorKind::TimedOut, "write timed out")),
        }
    }

    async fn flush(&mut self) -> io::Result<()> {
        match timeout(self.write_timeout, self.stream.flush()).await {
            Ok(result) => result,
            Err(_) => Err(io::Error::new(io::ErrorKind::TimedOut, "flush timed out")),
        }
    }

    /// Stream the file at `path` as a 200 response.
    ///
    /// Errors opening or inspecting the file are returned before anything is
    /// written, so the caller can still answer with a 500. Once the head is
    /// on the wire every failure ends in [`Delivery::Dropped`].
    pub async fn send_file(&mut self, path: &Path, mime: &dyn MimeLookup) -> Result<Delivery, Error> {
        let file = File::open(path).await?;
        let metadata = file.metadata().await?;
        if !metadata.is_file() {
            return Err(Error::NotFound(path.display().to_string()));
        }
        let length = metadata.len();

        let content_type = mime.content_type_for(path);
        let head = ResponseHead::new(StatusCode::Ok, self.server_name, content_type, length);
        if let Err(e) = self.write_all(&head.to_bytes()).await {
            debug!("Client went away before headers were sent: {e}");
            return Ok(Delivery::Dropped);
        }

        // Never send more than was announced, even if the file grows meanwhile
        let mut body = file.take(length);
        let mut buf = vec![0; self.chunk_size];
        let mut sent: u64 = 0;
        loop {
            let n = match body.read(&mut buf).await {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) => {
                    warn!("Error reading {path}: {e}", path = path.display());
                    return Ok(Delivery::Dropped);
                }
            };
            if let Err(e) = self.write_all(&buf[..n]).await {
                debug!("Aborting transfer of {path}: {e}", path = path.display());
                return Ok(Delivery::Dropped);
            }
            sent += n as u64;
        }

        if sent < length {
            warn!(
                "{path} shrank while being sent ({sent} of {length} bytes)",
                path = path.display()
            );
            return Ok(Delivery::Dropped);
        }

        match self.flush().await {
            Ok(()) => Ok(Delivery::Sent),
            Err(_) => Ok(Delivery::Dropped),
        }
    }

    /// Send an error page for `status`. Failures are swallowed.
    pub async fn send_error(&mut self, status: StatusCode, pages: &ErrorPages) -> Delivery {
        let page = pages.content(status).await;
        let head = ResponseHead::new(status, self.server_name, page.content_type, page.body.len() as u64);

        let mut bytes = head.to_bytes();
        bytes.extend_from_slice(&page.body);
        if self.write_all(&bytes).await.is_err() || self.flush().await.is_err() {
            debug!("Could not deliver {code} response", code = status.code());
            return Delivery::Dropped;
        }
        Delivery::Sent
    }
}
