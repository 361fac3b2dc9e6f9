//! Format-listing parsing
//!
//! Turns the tabular text of a `-F` listing into a [`FormatCatalog`].
//! Field extraction is deliberately line-local: the listing's columns shift
//! between extractors, so every field is matched against the whole line.

use crate::core::catalog::{FormatCatalog, FormatRecord, AUDIO_ONLY, NOT_AVAILABLE};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

lazy_static! {
    static ref RES_WXH_RE: Regex = Regex::new(r"\b(\d{3,4}x\d{3,4})\b").unwrap();
    static ref RES_P_RE: Regex = Regex::new(r"\b(\d{3,4}p)\b").unwrap();
    static ref VCODEC_NONE_RE: Regex = Regex::new(r"\bvcodec\s*:\s*none\b").unwrap();
    static ref FILESIZE_RE: Regex =
        Regex::new(r"\b(\d+(?:\.\d+)?(?:KiB|MiB|GiB|TiB|KB|MB|GB|TB))\b").unwrap();
    static ref FILESIZE_APPROX_RE: Regex =
        Regex::new(r"~(\d+(?:\.\d+)?(?:KB|MB|GB|TB))").unwrap();
    static ref FPS_RE: Regex = Regex::new(r"\b(\d+(?:\.\d+)?)fps\b").unwrap();
    static ref ABR_RE: Regex = Regex::new(r"\b(\d+)k\b").unwrap();
    static ref HEADER_RE: Regex = Regex::new(r"^\s*ID\s+EXT").unwrap();
    static ref FIRST_INT_RE: Regex = Regex::new(r"(\d+)").unwrap();
}

/// Video codecs recognized in listing lines, in match order
const VIDEO_CODECS: [&str; 8] = ["h264", "h265", "vp9", "vp8", "av01", "avc1", "hevc", "none"];

/// Audio codecs recognized in listing lines, in match order
const AUDIO_CODECS: [&str; 6] = ["aac", "mp3", "opus", "vorbis", "mp4a", "none"];

/// Container extensions that always mean an audio-only format
const AUDIO_EXTENSIONS: [&str; 6] = ["m4a", "mp3", "aac", "ogg", "opus", "wav"];

/// Extract the resolution field from a listing line
///
/// Prefers an explicit `WxH` pair, then an `Np` shorthand, then the
/// audio-only markers.
pub fn resolution_from_line(line: &str) -> String {
    if let Some(caps) = RES_WXH_RE.captures(line) {
        return caps[1].to_string();
    }
    if let Some(caps) = RES_P_RE.captures(line) {
        return caps[1].to_string();
    }
    if line.to_lowercase().contains(AUDIO_ONLY) || VCODEC_NONE_RE.is_match(line) {
        return AUDIO_ONLY.to_string();
    }
    NOT_AVAILABLE.to_string()
}

/// Extract the filesize token, including `~`-prefixed approximate sizes
pub fn filesize_from_line(line: &str) -> String {
    if let Some(caps) = FILESIZE_RE.captures(line) {
        return caps[1].to_string();
    }
    if let Some(caps) = FILESIZE_APPROX_RE.captures(line) {
        return format!("~{}", &caps[1]);
    }
    NOT_AVAILABLE.to_string()
}

/// Extract the frame rate as `<number>fps`
pub fn fps_from_line(line: &str) -> String {
    match FPS_RE.captures(line) {
        Some(caps) => format!("{}fps", &caps[1]),
        None => NOT_AVAILABLE.to_string(),
    }
}

/// Extract the video codec; first known token wins
pub fn video_codec_from_line(line: &str) -> String {
    codec_from_line(line, &VIDEO_CODECS)
}

/// Extract the audio codec; first known token wins
pub fn audio_codec_from_line(line: &str) -> String {
    codec_from_line(line, &AUDIO_CODECS)
}

fn codec_from_line(line: &str, codecs: &[&str]) -> String {
    let lower = line.to_lowercase();
    for codec in codecs {
        if lower.contains(codec) {
            return codec.to_string();
        }
    }
    "unknown".to_string()
}

/// Extract the audio bitrate as `<int>k`
pub fn audio_bitrate_from_line(line: &str) -> String {
    match ABR_RE.captures(line) {
        Some(caps) => format!("{}k", &caps[1]),
        None => NOT_AVAILABLE.to_string(),
    }
}

/// Numeric sort key for a resolution field; higher means better
pub fn resolution_sort_key(resolution: &str) -> u32 {
    if resolution == AUDIO_ONLY {
        return 0;
    }
    if resolution == NOT_AVAILABLE {
        return 1;
    }
    FIRST_INT_RE
        .captures(resolution)
        .and_then(|caps| caps[1].parse().ok())
        .unwrap_or(0)
}

/// Numeric sort key for an audio bitrate field; 0 when absent
pub fn bitrate_sort_key(bitrate: &str) -> u32 {
    FIRST_INT_RE
        .captures(bitrate)
        .and_then(|caps| caps[1].parse().ok())
        .unwrap_or(0)
}

/// Classification outcome for one listing line
enum Bucket {
    Video,
    Audio,
    Dropped,
}

fn classify(record: &FormatRecord) -> Bucket {
    let lower = record.raw_line.to_lowercase();

    let is_audio_only = record.video_codec == "none"
        || lower.contains(AUDIO_ONLY)
        || record.resolution == AUDIO_ONLY
        || AUDIO_EXTENSIONS.contains(&record.extension.as_str())
        || (record.resolution == NOT_AVAILABLE
            && record.audio_codec != "none"
            && record.audio_codec != "unknown");
    if is_audio_only {
        return Bucket::Audio;
    }

    let is_video_capable = record.audio_codec == "none"
        || lower.contains("video only")
        || (record.resolution != AUDIO_ONLY && record.resolution != NOT_AVAILABLE);
    if is_video_capable {
        return Bucket::Video;
    }

    // Ambiguous leftovers: a documented heuristic, not a complete
    // classification. Combined streams with both codecs land in video.
    if record.audio_codec != "none" && record.video_codec != "none" {
        Bucket::Video
    } else if record.audio_codec != "none" {
        Bucket::Audio
    } else {
        Bucket::Dropped
    }
}

/// Parse the full listing text into a classified, sorted catalog
///
/// Header, log-prefix and malformed lines are skipped silently; a listing
/// with zero usable rows yields an empty catalog, not an error.
pub fn parse_listing(text: &str) -> FormatCatalog {
    let mut catalog = FormatCatalog::default();

    let candidates = text.lines().filter(|line| {
        !line.trim().is_empty()
            && !line.starts_with("format")
            && !HEADER_RE.is_match(line)
            && !line.starts_with('[')
    });

    for line in candidates {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 3 {
            continue;
        }

        let video_codec = video_codec_from_line(line);
        let audio_codec = audio_codec_from_line(line);
        let display_codec = if video_codec != "none" {
            video_codec.clone()
        } else {
            audio_codec.clone()
        };

        let record = FormatRecord {
            id: parts[0].to_string(),
            extension: parts[1].to_string(),
            resolution: resolution_from_line(line),
            filesize: filesize_from_line(line),
            fps: fps_from_line(line),
            video_codec,
            audio_codec,
            audio_bitrate: audio_bitrate_from_line(line),
            display_codec,
            raw_line: line.to_string(),
        };

        match classify(&record) {
            Bucket::Video => catalog.video.push(record),
            Bucket::Audio => catalog.audio.push(record),
            Bucket::Dropped => {
                debug!("dropped unclassifiable listing line: {}", record.raw_line);
            }
        }
    }

    // Stable descending sorts keep the listing order for equal keys.
    catalog
        .video
        .sort_by(|a, b| resolution_sort_key(&b.resolution).cmp(&resolution_sort_key(&a.resolution)));
    catalog
        .audio
        .sort_by(|a, b| bitrate_sort_key(&b.audio_bitrate).cmp(&bitrate_sort_key(&a.audio_bitrate)));

    debug!(
        video = catalog.video.len(),
        audio = catalog.audio.len(),
        "parsed format listing"
    );
    catalog
}
