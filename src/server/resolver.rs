//! Maps request targets onto files inside the document root.

use std::io;
use std::path::{Path, PathBuf};

use crate::server::config::ServerConfig;
use crate::server::error::Error;

/// File served for `/` and for directories.
pub const INDEX_FILE: &str = "index.html";

/// Resolves raw request targets to files inside a canonical document root.
///
/// Every path returned by [`PathResolver::resolve`] is a regular file whose
/// canonical form lies under the root, compared component by component.
#[derive(Debug, Clone)]
pub struct PathResolver {
    root: PathBuf,
    blocked_extensions: Vec<String>,
}

impl PathResolver {
    /// Create a resolver for `root`, which must already be canonical.
    pub fn new(root: impl Into<PathBuf>, blocked_extensions: &[String]) -> Self {
        Self {
            root: root.into(),
            blocked_extensions: blocked_extensions.to_vec(),
        }
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(config.document_root(), config.blocked_extensions())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve `raw_target` to a servable file.
    ///
    /// Fails with `BadTarget` for undecodable targets, `AccessDenied` for
    /// anything outside the root or a directory without an index,
    /// `UnsupportedResource` for denylisted extensions and `NotFound` when no
    /// regular file exists.
    pub async fn resolve(&self, raw_target: &str) -> Result<PathBuf, Error> {
        let decoded = decode_target(raw_target)?;

        if !decoded.starts_with('/') || decoded.starts_with("//") || has_foreign_separator(&decoded) {
            return Err(Error::AccessDenied(format!("not an absolute path: {raw_target}")));
        }

        let mut segments = normalize(&decoded)
            .ok_or_else(|| Error::AccessDenied(format!("escapes document root: {raw_target}")))?;
        if segments.is_empty() {
            segments.push(INDEX_FILE);
        }

        let candidate: PathBuf = segments.iter().collect();
        if self.is_blocked(&candidate) {
            return Err(Error::UnsupportedResource(raw_target.to_string()));
        }

        let mut path = self.canonical_inside(&self.root.join(&candidate), raw_target).await?;
        let mut metadata = tokio::fs::metadata(&path).await?;

        if metadata.is_dir() {
            let index = self
                .canonical_inside(&path.join(INDEX_FILE), raw_target)
                .await
                .map_err(|_| Error::AccessDenied(format!("directory without index: {raw_target}")))?;
            metadata = tokio::fs::metadata(&index).await?;
            if !metadata.is_file() {
                return Err(Error::AccessDenied(format!("directory without index: {raw_target}")));
            }
            path = index;
        }

        if !metadata.is_file() {
            return Err(Error::NotFound(raw_target.to_string()));
        }

        // A symlink may point at a denylisted file under an innocent name
        if self.is_blocked(&path) {
            return Err(Error::UnsupportedResource(raw_target.to_string()));
        }

        Ok(path)
    }

    /// Canonicalize `candidate` and check it is contained in the root.
    async fn canonical_inside(&self, candidate: &Path, raw_target: &str) -> Result<PathBuf, Error> {
        let canonical = match tokio::fs::canonicalize(candidate).await {
            Ok(path) => path,
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                return Err(Error::AccessDenied(raw_target.to_string()));
            }
            Err(_) => return Err(Error::NotFound(raw_target.to_string())),
        };

        // Component-wise, so `/srv/www-secret` is not inside `/srv/www`
        if !canonical.starts_with(&self.root) {
            return Err(Error::AccessDenied(format!("escapes document root: {raw_target}")));
        }
        Ok(canonical)
    }

    fn is_blocked(&self, path: &Path) -> bool {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) => self
                .blocked_extensions
                .iter()
                .any(|blocked| blocked.eq_ignore_ascii_case(ext)),
            None => false,
        }
    }
}

/// Drop query and fragment, then percent-decode the path.
pub(crate) fn decode_target(raw_target: &str) -> Result<String, Error> {
    let path = raw_target
        .split(['?', '#'])
        .next()
        .unwrap_or_default();

    // urlencoding passes broken escapes through untouched; refuse them instead
    let bytes = path.as_bytes();
    let well_formed = bytes.iter().enumerate().filter(|(_, b)| **b == b'%').all(|(i, _)| {
        bytes
            .get(i + 1..i + 3)
            .is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit))
    });
    if !well_formed {
        return Err(Error::BadTarget(format!("invalid percent-encoding: {raw_target}")));
    }

    let decoded = urlencoding::decode(path)
        .map_err(|_| Error::BadTarget(format!("target is not UTF-8: {raw_target}")))?;
    if decoded.contains('\0') {
        return Err(Error::BadTarget(format!("NUL byte in target: {raw_target}")));
    }
    Ok(decoded.into_owned())
}

/// A backslash only separates path components on Windows; elsewhere it is
/// an ordinary file name character.
fn has_foreign_separator(path: &str) -> bool {
    cfg!(windows) && path.contains('\\')
}

/// Collapse `.` and `..` segments. `None` if `..` climbs above the root.
pub(crate) fn normalize(path: &str) -> Option<Vec<&str>> {
    let mut segments = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop()?;
            }
            _ => segments.push(segment),
        }
    }
    Some(segments)
}
