//! Format catalog structures and selection state

use serde::{Deserialize, Serialize};

/// Sentinel for listing fields that could not be extracted
pub const NOT_AVAILABLE: &str = "N/A";

/// Sentinel resolution for audio-only listing rows
pub const AUDIO_ONLY: &str = "audio only";

/// User intent for a download
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DownloadKind {
    /// Muxed video+audio download
    Video,
    /// Audio-only extraction
    Audio,
}

impl DownloadKind {
    /// Human-readable label
    pub fn as_str(&self) -> &'static str {
        match self {
            DownloadKind::Video => "video",
            DownloadKind::Audio => "audio",
        }
    }
}

/// One row of the external tool's format listing, normalized
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormatRecord {
    /// Opaque format identifier, unique within a listing
    pub id: String,
    /// Container extension token
    pub extension: String,
    /// `WxH`, `Np`, `"audio only"` or `"N/A"`
    pub resolution: String,
    /// Parsed size token (possibly `~`-prefixed) or `"N/A"`
    pub filesize: String,
    /// `<number>fps` or `"N/A"`
    pub fps: String,
    /// Known video codec, `"none"` or `"unknown"`
    pub video_codec: String,
    /// Known audio codec, `"none"` or `"unknown"`
    pub audio_codec: String,
    /// `<int>k` or `"N/A"`
    pub audio_bitrate: String,
    /// Video codec when present, audio codec otherwise
    pub display_codec: String,
    /// Original listing line, kept for diagnostics
    pub raw_line: String,
}

impl FormatRecord {
    /// Check if this record describes an audio-only stream
    pub fn is_audio_only(&self) -> bool {
        self.resolution == AUDIO_ONLY || self.video_codec == "none"
    }

    /// Short human-readable summary used by presentation layers
    pub fn summary(&self, kind: DownloadKind) -> String {
        let mut parts = Vec::new();
        match kind {
            DownloadKind::Video => {
                if self.resolution != NOT_AVAILABLE {
                    parts.push(format!("Resolution: {}", self.resolution));
                }
                if self.fps != NOT_AVAILABLE {
                    parts.push(format!("FPS: {}", self.fps));
                }
                if self.video_codec != "unknown" {
                    parts.push(format!("Video: {}", self.video_codec));
                }
            }
            DownloadKind::Audio => {
                if self.audio_bitrate != NOT_AVAILABLE {
                    parts.push(format!("Bitrate: {}", self.audio_bitrate));
                }
                if self.audio_codec != "unknown" {
                    parts.push(format!("Audio: {}", self.audio_codec));
                }
            }
        }
        if self.filesize != NOT_AVAILABLE {
            parts.push(format!("Size: {}", self.filesize));
        }
        if parts.is_empty() {
            "No details available".to_string()
        } else {
            parts.join(" | ")
        }
    }
}

/// All format records for one video, partitioned by classification
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FormatCatalog {
    /// Video-capable records, sorted by descending resolution key
    pub video: Vec<FormatRecord>,
    /// Audio-only records, sorted by descending bitrate
    pub audio: Vec<FormatRecord>,
}

impl FormatCatalog {
    /// Records for one download kind
    pub fn records(&self, kind: DownloadKind) -> &[FormatRecord] {
        match kind {
            DownloadKind::Video => &self.video,
            DownloadKind::Audio => &self.audio,
        }
    }

    /// Check if both buckets are empty
    pub fn is_empty(&self) -> bool {
        self.video.is_empty() && self.audio.is_empty()
    }

    /// Total record count across both buckets
    pub fn len(&self) -> usize {
        self.video.len() + self.audio.len()
    }
}

/// Holds the current catalog and the selected format id
#[derive(Debug, Default)]
pub struct FormatStore {
    catalog: FormatCatalog,
    kind: Option<DownloadKind>,
    selected: Option<String>,
}

impl FormatStore {
    /// Create an empty store with no catalog and no selection
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the catalog wholesale; resets selection for the active kind
    pub fn publish(&mut self, catalog: FormatCatalog) {
        self.catalog = catalog;
        self.reset_selection();
    }

    /// Drop the catalog and selection, e.g. after a failed listing fetch
    pub fn clear(&mut self) {
        self.catalog = FormatCatalog::default();
        self.selected = None;
    }

    /// Switch the active download kind; re-reads the existing catalog only
    pub fn set_kind(&mut self, kind: DownloadKind) {
        self.kind = Some(kind);
        self.reset_selection();
    }

    /// Active download kind, if one was chosen
    pub fn kind(&self) -> Option<DownloadKind> {
        self.kind
    }

    /// Records for the given kind; empty slice when the catalog is unset
    pub fn records_for(&self, kind: DownloadKind) -> &[FormatRecord] {
        self.catalog.records(kind)
    }

    /// Records for the active kind
    pub fn records(&self) -> &[FormatRecord] {
        match self.kind {
            Some(kind) => self.records_for(kind),
            None => &[],
        }
    }

    /// Select a format id; ignored unless present in the active kind's records
    pub fn select(&mut self, id: &str) -> bool {
        if self.records().iter().any(|r| r.id == id) {
            self.selected = Some(id.to_string());
            true
        } else {
            false
        }
    }

    /// Currently selected format id
    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    fn reset_selection(&mut self) {
        self.selected = self.records().first().map(|r| r.id.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str) -> FormatRecord {
        FormatRecord {
            id: id.to_string(),
            extension: "mp4".to_string(),
            resolution: "1280x720".to_string(),
            filesize: NOT_AVAILABLE.to_string(),
            fps: NOT_AVAILABLE.to_string(),
            video_codec: "h264".to_string(),
            audio_codec: "none".to_string(),
            audio_bitrate: NOT_AVAILABLE.to_string(),
            display_codec: "h264".to_string(),
            raw_line: String::new(),
        }
    }

    fn audio_record(id: &str) -> FormatRecord {
        FormatRecord {
            resolution: AUDIO_ONLY.to_string(),
            video_codec: "none".to_string(),
            audio_codec: "mp4a".to_string(),
            audio_bitrate: "128k".to_string(),
            display_codec: "mp4a".to_string(),
            extension: "m4a".to_string(),
            ..record(id)
        }
    }

    fn catalog() -> FormatCatalog {
        FormatCatalog {
            video: vec![record("137"), record("136")],
            audio: vec![audio_record("140")],
        }
    }

    #[test]
    fn test_publish_selects_first_of_active_kind() {
        let mut store = FormatStore::new();
        store.set_kind(DownloadKind::Video);
        store.publish(catalog());
        assert_eq!(store.selected(), Some("137"));
    }

    #[test]
    fn test_kind_switch_reselects_without_refetch() {
        let mut store = FormatStore::new();
        store.set_kind(DownloadKind::Video);
        store.publish(catalog());

        store.set_kind(DownloadKind::Audio);
        assert_eq!(store.kind(), Some(DownloadKind::Audio));
        assert_eq!(store.selected(), Some("140"));
        assert_eq!(store.records().len(), 1);
        // The other bucket stays readable without a kind switch.
        assert_eq!(store.records_for(DownloadKind::Video).len(), 2);

        store.set_kind(DownloadKind::Video);
        assert_eq!(store.selected(), Some("137"));
    }

    #[test]
    fn test_empty_kind_clears_selection() {
        let mut store = FormatStore::new();
        store.set_kind(DownloadKind::Audio);
        store.publish(FormatCatalog {
            video: vec![record("137")],
            audio: vec![],
        });
        assert!(store.records().is_empty());
        assert_eq!(store.selected(), None);
    }

    #[test]
    fn test_select_unknown_id_is_ignored() {
        let mut store = FormatStore::new();
        store.set_kind(DownloadKind::Video);
        store.publish(catalog());

        assert!(!store.select("999"));
        assert_eq!(store.selected(), Some("137"));
        assert!(store.select("136"));
        assert_eq!(store.selected(), Some("136"));
    }

    #[test]
    fn test_clear_drops_catalog_and_selection() {
        let mut store = FormatStore::new();
        store.set_kind(DownloadKind::Video);
        store.publish(catalog());
        store.clear();
        assert!(store.records().is_empty());
        assert_eq!(store.selected(), None);
    }

    #[test]
    fn test_record_summary() {
        let mut rec = record("137");
        rec.fps = "30fps".to_string();
        rec.filesize = "10.5MiB".to_string();
        assert_eq!(
            rec.summary(DownloadKind::Video),
            "Resolution: 1280x720 | FPS: 30fps | Video: h264 | Size: 10.5MiB"
        );

        let rec = audio_record("140");
        assert!(rec.is_audio_only());
        assert_eq!(
            rec.summary(DownloadKind::Audio),
            "Bitrate: 128k | Audio: mp4a"
        );
    }
}
