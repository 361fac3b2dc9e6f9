//! URL validation helpers

use crate::error::VdlError;
use url::Url;

/// Validate that a string is an http(s) URL before handing it to the tool
pub fn validate_url(input: &str) -> Result<(), VdlError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(VdlError::InvalidUrl("empty URL".to_string()));
    }

    let parsed = Url::parse(trimmed)?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(VdlError::InvalidUrl(format!(
            "unsupported scheme '{}'",
            scheme
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("https://www.youtube.com/watch?v=abc123").is_ok());
        assert!(validate_url("http://example.com/video").is_ok());
        assert!(validate_url("  https://example.com/video  ").is_ok());

        assert!(matches!(
            validate_url(""),
            Err(VdlError::InvalidUrl(_))
        ));
        assert!(matches!(
            validate_url("ftp://example.com/video"),
            Err(VdlError::InvalidUrl(_))
        ));
        assert!(matches!(
            validate_url("not a url"),
            Err(VdlError::UrlError(_))
        ));
    }
}
