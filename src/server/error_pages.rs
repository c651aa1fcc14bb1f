//! Error page bodies, custom or generated.

use std::path::PathBuf;

use log::warn;

use crate::server::response::StatusCode;

/// Content type of every error page.
pub const ERROR_PAGE_CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// Body and content type for an error response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorPage {
    pub body: Vec<u8>,
    pub content_type: &'static str,
}

/// Looks up `<root>/<code>.html` and falls back to a generated page.
#[derive(Debug, Clone)]
pub struct ErrorPages {
    root: PathBuf,
}

impl ErrorPages {
    /// Serve custom pages from `root`, which should be the canonical document root.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Body and content type for `status`.
    pub async fn content(&self, status: StatusCode) -> ErrorPage {
        let body = match self.custom_page(status).await {
            Some(body) => body,
            None => Self::generated(status).into_bytes(),
        };
        ErrorPage {
            body,
            content_type: ERROR_PAGE_CONTENT_TYPE,
        }
    }

    async fn custom_page(&self, status: StatusCode) -> Option<Vec<u8>> {
        let path = self.root.join(format!("{}.html", status.code()));
        let metadata = tokio::fs::metadata(&path).await.ok()?;
        if !metadata.is_file() {
            return None;
        }
        match tokio::fs::read(&path).await {
            Ok(body) => Some(body),
            Err(e) => {
                warn!("Custom error page {path} is unreadable: {e}", path = path.display());
                None
            }
        }
    }

    /// The built-in page for `status`.
    pub fn generated(status: StatusCode) -> String {
        let code = status.code();
        let reason = status.reason_phrase();
        format!(
            "<!DOCTYPE html>\n<html>\n<head><title>{code} {reason}</title></head>\n\
             <body>\n<h1>{code} {reason}</h1>\n<p>{description}</p>\n</body>\n</html>\n",
            description = status.description(),
        )
    }
}
