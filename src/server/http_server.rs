//! Connection acceptor and dispatcher.

use std::net::SocketAddr;
use std::sync::Arc;

use log::{debug, error, info, warn};
use tokio::net::{TcpListener, TcpStream};
use tokio::signal;
use tokio::sync::{watch, Semaphore};
use tokio::task::JoinSet;

use crate::server::config::ServerConfig;
use crate::server::error::Error;
use crate::server::handler::ConnectionHandler;
use crate::server::mime::MimeLookup;
use crate::server::response::StatusCode;

/// Cooperative stop request shared between the accept loop and whoever
/// wants to stop it.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    tx: Arc<watch::Sender<bool>>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Ask the server to stop accepting connections.
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once [`ShutdownSignal::trigger`] has been called.
    pub async fn triggered(&self) {
        let mut rx = self.tx.subscribe();
        while !*rx.borrow_and_update() {
            if rx.changed().await.is_err() {
                return;
            }
        }
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// A static-file HTTP server.
pub struct HttpServer {
    config: Arc<ServerConfig>,
    handler: Arc<ConnectionHandler>,
    shutdown: ShutdownSignal,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ServerConfig) -> Self {
        let config = Arc::new(config);
        Self {
            handler: Arc::new(ConnectionHandler::new(config.clone())),
            config,
            shutdown: ShutdownSignal::new(),
        }
    }

    /// Replace the content-type lookup used for served files.
    pub fn with_mime_lookup(mut self, mime: Arc<dyn MimeLookup>) -> Self {
        self.handler = Arc::new(ConnectionHandler::new(self.config.clone()).with_mime_lookup(mime));
        self
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// A handle that stops [`HttpServer::serve`] when triggered.
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.clone()
    }

    /// Bind the configured address.
    pub async fn bind(&self) -> Result<TcpListener, Error> {
        let listener = TcpListener::bind((self.config.host(), self.config.port())).await?;
        info!(
            "Serving {root} on http://{addr}",
            root = self.config.document_root().display(),
            addr = listener.local_addr()?
        );
        Ok(listener)
    }

    /// Set up a Ctrl+C handler for graceful shutdown.
    fn setup_ctrl_c_handler(shutdown: ShutdownSignal) {
        tokio::spawn(async move {
            match signal::ctrl_c().await {
                Ok(()) => {
                    info!("Received Ctrl+C, initiating graceful shutdown");
                    shutdown.trigger();
                }
                Err(e) => {
                    error!("Error setting up Ctrl+C handler: {e}");
                }
            }
        });
    }

    /// Bind, install the Ctrl+C handler and serve until shutdown.
    pub async fn start(&self) -> Result<(), Error> {
        let listener = self.bind().await?;
        Self::setup_ctrl_c_handler(self.shutdown.clone());
        self.serve(listener).await
    }

    /// Accept connections on `listener` until the shutdown signal fires.
    ///
    /// Each connection gets its own task. Accept errors are logged and
    /// retried; they never stop the loop.
    pub async fn serve(&self, listener: TcpListener) -> Result<(), Error> {
        let semaphore = self
            .config
            .max_connections()
            .map(|limit| Arc::new(Semaphore::new(limit)));
        let mut tasks = JoinSet::new();

        loop {
            tokio::select! {
                _ = self.shutdown.triggered() => {
                    info!("Shutting down server...");
                    break;
                }

                // Reap finished connection tasks
                Some(res) = tasks.join_next(), if !tasks.is_empty() => {
                    if let Err(e) = res {
                        error!("Connection task failed: {e}");
                    }
                }

                accept_result = listener.accept() => {
                    match accept_result {
                        Ok((socket, addr)) => self.dispatch(socket, addr, semaphore.as_ref(), &mut tasks),
                        Err(e) => Self::handle_accept_error(e).await,
                    }
                }
            }
        }

        drop(listener);
        self.perform_shutdown(&mut tasks).await;
        Ok(())
    }

    /// Spawn a handler task for a new connection.
    fn dispatch(
        &self,
        socket: TcpStream,
        addr: SocketAddr,
        semaphore: Option<&Arc<Semaphore>>,
        tasks: &mut JoinSet<()>,
    ) {
        let handler = self.handler.clone();

        let permit = match semaphore.map(|s| s.clone().try_acquire_owned()) {
            Some(Ok(permit)) => Some(permit),
            Some(Err(_)) => {
                warn!("Connection limit reached, rejecting connection from {addr}");
                tasks.spawn(async move {
                    handler.reject(socket, addr, StatusCode::ServiceUnavailable).await;
                });
                return;
            }
            None => None,
        };

        tasks.spawn(async move {
            // Released when the connection is done
            let _permit = permit;
            handler.handle(socket, addr).await;
        });
    }

    async fn handle_accept_error(e: std::io::Error) {
        error!("Error accepting connection: {e}");
        // Usually fd exhaustion; back off before retrying
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
    }

    /// Wait for in-flight connections, then leave any stragglers running.
    async fn perform_shutdown(&self, tasks: &mut JoinSet<()>) {
        info!("Waiting for {len} active connections to complete...", len = tasks.len());
        let drained = tokio::time::timeout(self.config.shutdown_grace(), async {
            while let Some(res) = tasks.join_next().await {
                if let Err(e) = res {
                    error!("Task failed during shutdown: {e}");
                }
            }
        })
        .await;

        if drained.is_err() {
            warn!("{len} connections still active, leaving them to finish on their own", len = tasks.len());
            tasks.detach_all();
        }
        debug!("Listener closed");
        info!("Server shutdown complete");
    }
}
