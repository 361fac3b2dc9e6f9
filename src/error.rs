//! Error types for vdl

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for vdl operations
#[derive(Debug, Error)]
pub enum VdlError {
    #[error("External tool unavailable: {0}")]
    ToolUnavailable(String),

    #[error("Fetch failed: {0}")]
    Fetch(String),

    #[error("Thumbnail unavailable: {0}")]
    Thumbnail(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("No format selected")]
    MissingFormat,

    #[error("Output directory does not exist: {0:?}")]
    MissingOutputDir(PathBuf),

    #[error("A download is already running")]
    DownloadInProgress,

    #[error("Download failed: {0}")]
    Download(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("URL parsing error: {0}")]
    UrlError(#[from] url::ParseError),
}

impl VdlError {
    /// Check if error is retryable by re-invoking the operation
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            VdlError::Fetch(_) | VdlError::Thumbnail(_) | VdlError::HttpError(_)
        )
    }

    /// Check if the error comes from the external tool boundary
    pub fn is_tool_error(&self) -> bool {
        matches!(
            self,
            VdlError::ToolUnavailable(_) | VdlError::Fetch(_) | VdlError::Download(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(VdlError::Fetch("listing failed".into()).is_retryable());
        assert!(VdlError::Thumbnail("404".into()).is_retryable());
        assert!(!VdlError::DownloadInProgress.is_retryable());
        assert!(!VdlError::MissingFormat.is_retryable());
    }

    #[test]
    fn test_tool_errors() {
        assert!(VdlError::ToolUnavailable("not found".into()).is_tool_error());
        assert!(VdlError::Download("exit 1".into()).is_tool_error());
        assert!(!VdlError::InvalidUrl("nope".into()).is_tool_error());
    }
}
