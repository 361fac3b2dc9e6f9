//! Safe filename generation utilities

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref INVALID_CHARS_RE: Regex = Regex::new(r#"[<>:"/\\|?*\x00-\x1f]"#).unwrap();
}

/// Convert a video title into a filename safe for common filesystems
///
/// Used for files we write ourselves (the saved thumbnail); downloaded media
/// names come from the tool's own output template.
pub fn to_safe_filename(title: &str, extension: &str) -> String {
    let mut safe = INVALID_CHARS_RE.replace_all(title, "_").to_string();

    safe = safe
        .trim_matches(|c: char| c == '.' || c == ' ')
        .to_string();

    // Stay well under the 255-byte limit most filesystems impose.
    if safe.len() > 200 {
        safe.truncate(200);
        safe = safe.trim_end().to_string();
    }

    if safe.is_empty() {
        safe = "video".to_string();
    }

    if extension.is_empty() {
        safe
    } else {
        format!("{}.{}", safe, extension.trim_start_matches('.'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_safe_filename() {
        assert_eq!(
            to_safe_filename("Talk: Rust in Production", "jpg"),
            "Talk_ Rust in Production.jpg"
        );
        assert_eq!(
            to_safe_filename("a/b\\c?d", "jpg"),
            "a_b_c_d.jpg"
        );
        assert_eq!(to_safe_filename("", "jpg"), "video.jpg");
        assert_eq!(to_safe_filename("...trimmed... ", "jpg"), "trimmed.jpg");
        assert_eq!(to_safe_filename("no extension", ""), "no extension");
        assert_eq!(to_safe_filename("dotted", ".jpg"), "dotted.jpg");
    }

    #[test]
    fn test_long_title_is_truncated() {
        let title = "x".repeat(400);
        let name = to_safe_filename(&title, "jpg");
        assert!(name.len() <= 204);
        assert!(name.ends_with(".jpg"));
    }
}
