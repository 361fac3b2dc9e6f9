//! Video metadata structures and retrieval

use crate::error::VdlError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Timeout for the independent thumbnail fetch
const THUMBNAIL_TIMEOUT: Duration = Duration::from_secs(10);

/// Metadata for one video, immutable per fetch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoMetadata {
    /// Video title
    pub title: String,
    /// Duration in seconds, when the source reports one
    pub duration: Option<f64>,
    /// Uploader/channel name
    pub uploader: Option<String>,
    /// Thumbnail URL
    pub thumbnail: Option<String>,
}

impl VideoMetadata {
    /// Render the duration as `MM:SS`, or `HH:MM:SS` past one hour
    pub fn duration_string(&self) -> String {
        match self.duration {
            Some(seconds) => format_duration(seconds),
            None => "Unknown".to_string(),
        }
    }
}

/// Parse the tool's single-line JSON metadata output
pub fn parse_metadata(json_str: &str) -> Result<VideoMetadata, VdlError> {
    let json: serde_json::Value = serde_json::from_str(json_str)?;

    let metadata = VideoMetadata {
        title: json["title"].as_str().unwrap_or("Unknown Title").to_string(),
        duration: json["duration"].as_f64(),
        uploader: json["uploader"].as_str().map(|s| s.to_string()),
        thumbnail: json["thumbnail"].as_str().map(|s| s.to_string()),
    };
    debug!("parsed metadata for '{}'", metadata.title);
    Ok(metadata)
}

/// Format a duration in seconds as a readable clock value
pub fn format_duration(seconds: f64) -> String {
    let total = seconds as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;

    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{:02}:{:02}", minutes, seconds)
    }
}

/// Fetch the thumbnail bytes for a metadata record
///
/// Independent of the metadata fetch: failure here is reported but must not
/// invalidate the rest of the metadata.
pub async fn fetch_thumbnail(url: &str) -> Result<Vec<u8>, VdlError> {
    let client = reqwest::Client::builder()
        .timeout(THUMBNAIL_TIMEOUT)
        .build()?;

    let response = client.get(url).send().await?;
    if response.status() != reqwest::StatusCode::OK {
        return Err(VdlError::Thumbnail(format!(
            "unexpected status {} for {}",
            response.status(),
            url
        )));
    }

    Ok(response.bytes().await?.to_vec())
}
