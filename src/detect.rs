//! HTML input detection and validation.

use crate::error::{Error, Result};
use regex::Regex;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

fn tag_regex() -> &'static Regex {
    static TAG: OnceLock<Regex> = OnceLock::new();
    TAG.get_or_init(|| Regex::new(r"<[A-Za-z!/?][^>]*>").expect("tag pattern is valid"))
}

/// Check whether the content contains at least one markup tag.
///
/// A tag must open with a name, `!`, `/` or `?`, so comparisons such as
/// `a < b and c > d` do not count.
pub fn looks_like_html(content: &str) -> bool {
    tag_regex().is_match(content)
}

/// Validate HTML content before any render surface is acquired.
///
/// # Returns
/// * `Ok(())` if the content is non-empty and contains markup
/// * `Err(Error::InvalidInput)` with a user-facing message otherwise
///
/// # Example
/// ```
/// use flowpage::detect::validate_html;
///
/// assert!(validate_html("<p>Hello</p>").is_ok());
/// assert!(validate_html("   ").is_err());
/// ```
pub fn validate_html(content: &str) -> Result<()> {
    if content.trim().is_empty() {
        return Err(Error::InvalidInput(
            "HTML content cannot be empty".to_string(),
        ));
    }

    if !looks_like_html(content) {
        return Err(Error::InvalidInput(
            "Content does not appear to contain HTML tags".to_string(),
        ));
    }

    Ok(())
}

/// Validate raw bytes as HTML text.
///
/// Bytes must be valid UTF-8 and pass [`validate_html`].
pub fn validate_html_bytes(data: &[u8]) -> Result<&str> {
    let content = std::str::from_utf8(data).map_err(|_| {
        Error::InvalidInput("HTML content must be a non-empty UTF-8 string".to_string())
    })?;
    validate_html(content)?;
    Ok(content)
}

/// Read and validate an HTML file.
pub fn read_html_file<P: AsRef<Path>>(path: P) -> Result<String> {
    let data = fs::read(path)?;
    let content = validate_html_bytes(&data)?;
    Ok(content.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_accepts_fragment() {
        assert!(validate_html("<p>Hello</p>").is_ok());
        assert!(validate_html("<!DOCTYPE html><html><body>x</body></html>").is_ok());
    }

    #[test]
    fn test_validate_rejects_empty() {
        let result = validate_html("");
        assert!(matches!(result, Err(Error::InvalidInput(ref m)) if m.contains("empty")));

        let result = validate_html(" \n\t ");
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_validate_rejects_plain_text() {
        let result = validate_html("just some words");
        assert!(matches!(result, Err(Error::InvalidInput(ref m)) if m.contains("HTML tags")));
    }

    #[test]
    fn test_validate_bytes_rejects_invalid_utf8() {
        let result = validate_html_bytes(&[0xFF, 0xFE, 0x3C]);
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_looks_like_html() {
        assert!(looks_like_html("text <b>bold</b>"));
        assert!(!looks_like_html("a < b and c > d"));
        assert!(!looks_like_html(""));
    }

    #[test]
    fn test_looks_like_html_tag_forms() {
        assert!(looks_like_html("<!DOCTYPE html>"));
        assert!(looks_like_html("</div>"));
        assert!(looks_like_html("<?xml version=\"1.0\"?>"));
        assert!(!looks_like_html("x <= 3 and y >= 2"));
        assert!(!looks_like_html("< p >"));
        assert!(validate_html("if a < b then c > d").is_err());
    }
}
