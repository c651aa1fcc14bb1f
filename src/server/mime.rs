//! Content-type lookup by file extension.

use std::collections::HashMap;
use std::path::Path;

/// Fallback content type for unknown extensions.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Read-only extension to content-type mapping used when serving files.
pub trait MimeLookup: Send + Sync {
    /// Content type for a lowercase extension without the leading dot.
    fn lookup(&self, extension: &str) -> Option<String>;

    /// Content type for `path`, defaulting to `application/octet-stream`.
    fn content_type_for(&self, path: &Path) -> String {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| self.lookup(&ext.to_ascii_lowercase()))
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string())
    }
}

/// The standard `mime_guess` table plus explicit overrides.
#[derive(Debug, Clone)]
pub struct MimeTable {
    overrides: HashMap<String, String>,
}

impl MimeTable {
    /// An empty table backed only by `mime_guess`.
    pub fn empty() -> Self {
        Self {
            overrides: HashMap::new(),
        }
    }

    /// Add or replace an override for `extension`.
    pub fn with_override(mut self, extension: impl AsRef<str>, content_type: impl Into<String>) -> Self {
        let extension = extension.as_ref().trim_start_matches('.').to_ascii_lowercase();
        self.overrides.insert(extension, content_type.into());
        self
    }
}

impl Default for MimeTable {
    fn default() -> Self {
        Self::empty()
            .with_override("css", "text/css")
            .with_override("html", "text/html")
            .with_override("htm", "text/html")
    }
}

impl MimeLookup for MimeTable {
    fn lookup(&self, extension: &str) -> Option<String> {
        if let Some(content_type) = self.overrides.get(extension) {
            return Some(content_type.clone());
        }
        mime_guess::from_ext(extension).first_raw().map(str::to_string)
    }
}
