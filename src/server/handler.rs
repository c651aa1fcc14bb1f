//! Per-connection request handling.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info, warn};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;

use crate::parser::parse_request;
use crate::parser::first_line;
use crate::server::config::ServerConfig;
use crate::server::error::Error;
use crate::server::error_pages::ErrorPages;
use crate::server::mime::{MimeLookup, MimeTable};
use crate::server::resolver::PathResolver;
use crate::server::response::{Delivery, ResponseWriter, StatusCode};

/// Longest a rejected connection is read from before the refusal is sent.
const REJECT_DRAIN_TIMEOUT: Duration = Duration::from_millis(250);

/// Longest a rejected connection is held in total.
const REJECT_DEADLINE: Duration = Duration::from_secs(1);

/// Handles one connection: read, parse, resolve, respond, close.
///
/// Shared read-only between all connection tasks.
pub struct ConnectionHandler {
    config: Arc<ServerConfig>,
    resolver: PathResolver,
    error_pages: ErrorPages,
    mime: Arc<dyn MimeLookup>,
}

impl ConnectionHandler {
    /// Create a handler using the default MIME table.
    pub fn new(config: Arc<ServerConfig>) -> Self {
        Self {
            resolver: PathResolver::from_config(&config),
            error_pages: ErrorPages::new(config.document_root()),
            mime: Arc::new(MimeTable::default()),
            config,
        }
    }

    /// Replace the content-type lookup.
    pub fn with_mime_lookup(mut self, mime: Arc<dyn MimeLookup>) -> Self {
        self.mime = mime;
        self
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Serve a single request on `stream`, then close it.
    ///
    /// Takes ownership so the stream is closed exactly once, when this
    /// returns. Returns the status sent, or `None` if the connection was
    /// dropped without a response (timeout, empty read, peer gone).
    pub async fn handle<S>(&self, mut stream: S, peer: SocketAddr) -> Option<StatusCode>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let status = self.serve(&mut stream, peer).await;
        let _ = timeout(self.config.write_timeout(), stream.shutdown()).await;
        status
    }

    /// Answer `status` without serving the request, then close. Used for
    /// connections over the configured limit, so the whole exchange is held
    /// to a short deadline regardless of the configured timeouts.
    pub async fn reject<S>(&self, mut stream: S, peer: SocketAddr, status: StatusCode) -> Option<StatusCode>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let exchange = async {
            // Consume what the client already sent so closing does not reset the connection
            let _ = timeout(
                REJECT_DRAIN_TIMEOUT.min(self.config.read_timeout()),
                read_request(&mut stream, self.config.read_buffer_size()),
            )
            .await;
            ResponseWriter::new(&mut stream, &self.config)
                .send_error(status, &self.error_pages)
                .await
        };
        let delivery = timeout(REJECT_DEADLINE, exchange).await.unwrap_or(Delivery::Dropped);
        let _ = timeout(REJECT_DRAIN_TIMEOUT, stream.shutdown()).await;
        debug!("Rejected {peer} with {code}", code = status.code());
        (delivery == Delivery::Sent).then_some(status)
    }

    async fn serve<S>(&self, stream: &mut S, peer: SocketAddr) -> Option<StatusCode>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let buf = match timeout(
            self.config.read_timeout(),
            read_request(stream, self.config.read_buffer_size()),
        )
        .await
        {
            Ok(Ok(buf)) if buf.is_empty() => {
                debug!("{peer} closed the connection without sending a request");
                return None;
            }
            Ok(Ok(buf)) => buf,
            Ok(Err(e)) => {
                debug!("Error reading from {peer}: {e}");
                return None;
            }
            Err(_) => {
                debug!("Timed out waiting for a request from {peer}");
                return None;
            }
        };

        info!("{peer} - {line}", line = first_line(&buf));

        let mut writer = ResponseWriter::new(stream, &self.config);
        let (status, delivery) = match self.respond(&buf, &mut writer).await {
            Ok(delivery) => (StatusCode::Ok, delivery),
            Err(e) => {
                let status = e.status();
                match status {
                    StatusCode::InternalServerError => error!("Error handling request from {peer}: {e}"),
                    StatusCode::Forbidden => warn!("Refused request from {peer}: {e}"),
                    _ => debug!("Request from {peer} failed: {e}"),
                }
                (status, writer.send_error(status, &self.error_pages).await)
            }
        };

        match delivery {
            Delivery::Sent => Some(status),
            Delivery::Dropped => {
                debug!("Response to {peer} was not fully delivered");
                None
            }
        }
    }

    async fn respond<S>(&self, buf: &[u8], writer: &mut ResponseWriter<'_, S>) -> Result<Delivery, Error>
    where
        S: AsyncWrite + Unpin,
    {
        let request = parse_request(buf)?;
        let path = self.resolver.resolve(&request.target).await?;
        writer.send_file(&path, self.mime.as_ref()).await
    }
}

/// Read until the request line is complete, the peer stops sending, or
/// `limit` bytes have arrived.
async fn read_request<S>(stream: &mut S, limit: usize) -> io::Result<Vec<u8>>
where
    S: AsyncRead + Unpin,
{
    let mut buf = vec![0; limit];
    let mut filled = 0;
    while filled < limit {
        let n = stream.read(&mut buf[filled..]).await?;
        if n == 0 {
            break;
        }
        let start = filled;
        filled += n;
        if buf[start..filled].contains(&b'\n') {
            break;
        }
    }
    buf.truncate(filled);
    Ok(buf)
}
