//! Server configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::server::error::Error;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_SERVER_NAME: &str = "microstatic";

/// Environment variables that override values from a config file.
pub const ENV_HOST: &str = "MICROSTATIC_HOST";
pub const ENV_PORT: &str = "MICROSTATIC_PORT";
pub const ENV_ROOT: &str = "MICROSTATIC_ROOT";

/// HTTP server configuration.
///
/// Immutable once built. The document root is checked and canonicalized by
/// [`ServerConfig::new`], so a server can never start without one.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    host: String,
    port: u16,
    document_root: PathBuf,
    read_timeout: Duration,
    write_timeout: Duration,
    read_buffer_size: usize,
    chunk_size: usize,
    max_connections: Option<usize>,
    blocked_extensions: Vec<String>,
    server_name: String,
    shutdown_grace: Duration,
}

impl ServerConfig {
    /// Create a configuration serving `document_root` on `host:port`.
    ///
    /// Fails if the document root does not exist or is not a directory.
    pub fn new(host: impl Into<String>, port: u16, document_root: impl AsRef<Path>) -> Result<Self, Error> {
        let document_root = canonical_root(document_root.as_ref())?;
        Ok(Self {
            host: host.into(),
            port,
            document_root,
            read_timeout: Duration::from_secs(10),
            write_timeout: Duration::from_secs(10),
            read_buffer_size: 4096,
            chunk_size: 4096,
            max_connections: None,
            blocked_extensions: vec!["php".to_string(), "jsp".to_string(), "asp".to_string()],
            server_name: DEFAULT_SERVER_NAME.to_string(),
            shutdown_grace: Duration::from_secs(30),
        })
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    /// Largest request prefix read from a connection. Raised to at least 1.
    pub fn with_read_buffer_size(mut self, size: usize) -> Self {
        self.read_buffer_size = size.max(1);
        self
    }

    /// Size of the chunks a file body is streamed in. Raised to at least 1.
    pub fn with_chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size.max(1);
        self
    }

    /// Bound the number of connections handled at once. `None` is unbounded.
    pub fn with_max_connections(mut self, limit: Option<usize>) -> Self {
        self.max_connections = limit;
        self
    }

    /// Replace the extension denylist. Leading dots and case are ignored.
    pub fn with_blocked_extensions<I, E>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: AsRef<str>,
    {
        self.blocked_extensions = extensions
            .into_iter()
            .map(|ext| ext.as_ref().trim_start_matches('.').to_ascii_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect();
        self
    }

    pub fn with_server_name(mut self, name: impl Into<String>) -> Self {
        self.server_name = name.into();
        self
    }

    pub fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// The canonical document root.
    pub fn document_root(&self) -> &Path {
        &self.document_root
    }

    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    pub fn write_timeout(&self) -> Duration {
        self.write_timeout
    }

    pub fn read_buffer_size(&self) -> usize {
        self.read_buffer_size
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn max_connections(&self) -> Option<usize> {
        self.max_connections
    }

    /// Lowercase extensions, without dots, that are never served.
    pub fn blocked_extensions(&self) -> &[String] {
        &self.blocked_extensions
    }

    pub fn server_name(&self) -> &str {
        &self.server_name
    }

    pub fn shutdown_grace(&self) -> Duration {
        self.shutdown_grace
    }
}

fn canonical_root(path: &Path) -> Result<PathBuf, Error> {
    let root = std::fs::canonicalize(path).map_err(|e| Error::DocumentRoot {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    if !root.is_dir() {
        return Err(Error::DocumentRoot {
            path: path.to_path_buf(),
            reason: "not a directory".to_string(),
        });
    }
    Ok(root)
}

/// On-disk form of [`ServerConfig`]. Every field is optional.
///
/// ```json
/// { "host": "0.0.0.0", "port": 8080, "document_root": "www", "blocked_extensions": ["php"] }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub document_root: Option<PathBuf>,
    pub read_timeout_secs: Option<u64>,
    pub write_timeout_secs: Option<u64>,
    pub read_buffer_size: Option<usize>,
    pub chunk_size: Option<usize>,
    pub max_connections: Option<usize>,
    pub blocked_extensions: Option<Vec<String>>,
    pub server_name: Option<String>,
    pub shutdown_grace_secs: Option<u64>,
}

impl ConfigFile {
    /// Parse a JSON config document.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Override host, port and document root from `lookup`, normally
    /// `std::env::var`.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup(ENV_HOST) {
            self.host = Some(host);
        }
        if let Some(port) = lookup(ENV_PORT) {
            let port = port
                .trim()
                .parse()
                .map_err(|_| Error::InvalidConfig(format!("{ENV_PORT} is not a port number: {port}")))?;
            self.port = Some(port);
        }
        if let Some(root) = lookup(ENV_ROOT) {
            self.document_root = Some(PathBuf::from(root));
        }
        Ok(self)
    }

    /// Apply overrides from the process environment.
    pub fn with_env(self) -> Result<Self, Error> {
        self.with_overrides(|name| std::env::var(name).ok())
    }

    /// Validate and build the runtime configuration. The document root
    /// defaults to `www`.
    pub fn into_config(self) -> Result<ServerConfig, Error> {
        for (name, value) in [
            ("read_buffer_size", self.read_buffer_size),
            ("chunk_size", self.chunk_size),
            ("max_connections", self.max_connections),
        ] {
            if value == Some(0) {
                return Err(Error::InvalidConfig(format!("{name} must be greater than zero")));
            }
        }

        let root = self.document_root.unwrap_or_else(|| PathBuf::from("www"));
        let mut config = ServerConfig::new(
            self.host.unwrap_or_else(|| DEFAULT_HOST.to_string()),
            self.port.unwrap_or(DEFAULT_PORT),
            root,
        )?
        .with_max_connections(self.max_connections);

        if let Some(secs) = self.read_timeout_secs {
            config = config.with_read_timeout(Duration::from_secs(secs));
        }
        if let Some(secs) = self.write_timeout_secs {
            config = config.with_write_timeout(Duration::from_secs(secs));
        }
        if let Some(size) = self.read_buffer_size {
            config = config.with_read_buffer_size(size);
        }
        if let Some(size) = self.chunk_size {
            config = config.with_chunk_size(size);
        }
        if let Some(extensions) = self.blocked_extensions {
            config = config.with_blocked_extensions(extensions);
        }
        if let Some(name) = self.server_name {
            config = config.with_server_name(name);
        }
        if let Some(secs) = self.shutdown_grace_secs {
            config = config.with_shutdown_grace(Duration::from_secs(secs));
        }
        Ok(config)
    }
}
