//! Document ID extraction from URLs and bare IDs.

use docfeedback_core::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;

/// Tried in order; path shapes come before the bare-ID fallback.
static REFERENCE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"/document/d/([a-zA-Z0-9_-]+)",
        r"/d/([a-zA-Z0-9_-]+)",
        r"docs\.google\.com/.*[?&]id=([a-zA-Z0-9_-]+)",
        r"^([a-zA-Z0-9_-]+)$",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// Extract a document ID from a Docs URL or a bare ID.
pub fn extract_document_id(reference: &str) -> Result<String> {
    let reference = reference.trim();

    REFERENCE_PATTERNS
        .iter()
        .find_map(|re| re.captures(reference))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| Error::InvalidReference(reference.to_string()))
}

/// Canonical edit URL for a document ID.
pub fn document_url(document_id: &str) -> String {
    format!("https://docs.google.com/document/d/{}/edit", document_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_style_url() {
        let id = extract_document_id("https://docs.google.com/document/d/ABC123/edit").unwrap();
        assert_eq!(id, "ABC123");
    }

    #[test]
    fn test_path_style_with_query_and_fragment() {
        let id = extract_document_id(
            "https://docs.google.com/document/d/1PrPKPnSKlS69438XdS0qHBnqUSQ2zO6DNrxFxsu5Au8/edit?usp=sharing#heading=h.1",
        )
        .unwrap();
        assert_eq!(id, "1PrPKPnSKlS69438XdS0qHBnqUSQ2zO6DNrxFxsu5Au8");
    }

    #[test]
    fn test_short_drive_path() {
        let id = extract_document_id("https://drive.google.com/file/d/xyz_-789/view").unwrap();
        assert_eq!(id, "xyz_-789");
    }

    #[test]
    fn test_query_style_url() {
        let id = extract_document_id("https://docs.google.com/open?id=QueryId_42").unwrap();
        assert_eq!(id, "QueryId_42");

        let id = extract_document_id("https://docs.google.com/a/school.kr/open?authuser=0&id=Second-Param")
            .unwrap();
        assert_eq!(id, "Second-Param");
    }

    #[test]
    fn test_bare_id_with_whitespace() {
        let id = extract_document_id("  19EZcsfkxY0awvZGAkRtv3fZyknxOUb_qr9mNm2-uSVo \n").unwrap();
        assert_eq!(id, "19EZcsfkxY0awvZGAkRtv3fZyknxOUb_qr9mNm2-uSVo");
    }

    #[test]
    fn test_full_url_is_not_taken_as_bare_id() {
        let id = extract_document_id("https://docs.google.com/document/d/ABC123/edit").unwrap();
        assert_ne!(id, "https://docs.google.com/document/d/ABC123/edit");
    }

    #[test]
    fn test_unrelated_strings_fail() {
        for input in [
            "https://example.com/articles/42",
            "not a document link",
            "",
            "https://docs.google.com/spreadsheets/u/0/",
        ] {
            let err = extract_document_id(input).unwrap_err();
            assert!(matches!(err, Error::InvalidReference(_)), "input: {input}");
        }
    }

    #[test]
    fn test_document_url() {
        assert_eq!(
            document_url("ABC123"),
            "https://docs.google.com/document/d/ABC123/edit"
        );
    }
}
