//! One-shot invocations of the external fetch tool
//!
//! The tool is a yt-dlp compatible binary treated as a black box: it is
//! probed once at startup and then invoked per request for metadata and
//! format listings. Downloads go through the supervisor instead.

use crate::core::catalog::FormatCatalog;
use crate::core::metadata::{parse_metadata, VideoMetadata};
use crate::error::VdlError;
use crate::tool::listing::parse_listing;
use std::path::{Path, PathBuf};
use std::process::Output;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info};

/// Default name of the external tool binary
pub const TOOL_NAME: &str = "yt-dlp";

/// Default timeout for one-shot invocations
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Invokes the external tool for version, metadata and listing requests
#[derive(Debug, Clone)]
pub struct ToolRunner {
    path: PathBuf,
    timeout: Duration,
}

impl ToolRunner {
    /// Locate the tool in common install locations and build a runner
    pub fn discover() -> Self {
        Self::with_path(find_tool())
    }

    /// Build a runner for an explicit tool path
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            path,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Override the invocation timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Path of the tool binary this runner invokes
    pub fn tool_path(&self) -> &Path {
        &self.path
    }

    /// Probe the tool; returns its version string when available
    pub async fn version(&self) -> Result<String, VdlError> {
        let output = self
            .run(&["--version"])
            .await
            .map_err(|e| VdlError::ToolUnavailable(e.to_string()))?;

        if output.status.success() {
            let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
            info!("{} available, version {}", TOOL_NAME, version);
            Ok(version)
        } else {
            Err(VdlError::ToolUnavailable(stderr_text(&output)))
        }
    }

    /// Fetch single-line JSON metadata for a URL
    pub async fn fetch_metadata(&self, url: &str) -> Result<VideoMetadata, VdlError> {
        let output = self.run(&["-j", "--no-warnings", url]).await?;
        if !output.status.success() {
            return Err(VdlError::Fetch(stderr_text(&output)));
        }
        parse_metadata(&String::from_utf8_lossy(&output.stdout))
    }

    /// Fetch and parse the format listing for a URL
    ///
    /// A listing with zero usable rows is a valid empty catalog; only a
    /// failed invocation is an error.
    pub async fn fetch_listing(&self, url: &str) -> Result<FormatCatalog, VdlError> {
        let output = self.run(&["-F", "--no-warnings", url]).await?;
        if !output.status.success() {
            return Err(VdlError::Fetch(stderr_text(&output)));
        }
        Ok(parse_listing(&String::from_utf8_lossy(&output.stdout)))
    }

    async fn run(&self, args: &[&str]) -> Result<Output, VdlError> {
        debug!("invoking {:?} {:?}", self.path, args);
        let mut cmd = Command::new(&self.path);
        cmd.args(args);
        let result = tokio::time::timeout(self.timeout, cmd.output()).await;

        match result {
            Ok(output) => Ok(output?),
            Err(_) => Err(VdlError::Fetch(format!(
                "{} invocation timed out after {:?}",
                TOOL_NAME, self.timeout
            ))),
        }
    }
}

impl Default for ToolRunner {
    fn default() -> Self {
        Self::discover()
    }
}

fn stderr_text(output: &Output) -> String {
    let text = String::from_utf8_lossy(&output.stderr).trim().to_string();
    if text.is_empty() {
        format!("tool exited with {}", output.status)
    } else {
        text
    }
}

/// Find the tool binary in common install paths, falling back to PATH
fn find_tool() -> PathBuf {
    let common_paths = [
        "/opt/homebrew/bin/yt-dlp",
        "/usr/local/bin/yt-dlp",
        "/usr/bin/yt-dlp",
    ];

    for path in common_paths {
        if Path::new(path).exists() {
            debug!("found {} at {}", TOOL_NAME, path);
            return PathBuf::from(path);
        }
    }

    #[cfg(unix)]
    if let Ok(output) = std::process::Command::new("which").arg(TOOL_NAME).output() {
        if output.status.success() {
            let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
            if !path.is_empty() {
                debug!("found {} via which: {}", TOOL_NAME, path);
                return PathBuf::from(path);
            }
        }
    }

    // Last resort: hope it's in PATH.
    PathBuf::from(TOOL_NAME)
}
