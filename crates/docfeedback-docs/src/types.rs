//! Document and feedback types.

use serde::{Deserialize, Serialize};

/// One paragraph of document text with its index range.
///
/// `start`/`end` are the Docs API's UTF-16 indices, half-open. They are only
/// valid against the revision they were read from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextSegment {
    pub text: String,
    pub start: usize,
    pub end: usize,
}

impl TextSegment {
    pub fn new(text: impl Into<String>, start: usize, end: usize) -> Self {
        Self {
            text: text.into(),
            start,
            end,
        }
    }

    /// Length of the trimmed text in characters.
    pub fn meaningful_len(&self) -> usize {
        self.text.trim().chars().count()
    }

    /// Insertion point just before the paragraph's closing newline.
    pub fn insertion_point(&self) -> usize {
        self.end.saturating_sub(1).max(self.start)
    }
}

/// A document as read from the document source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentHandle {
    pub id: String,
    pub title: String,
    #[serde(rename = "revisionId", skip_serializing_if = "Option::is_none")]
    pub revision_id: Option<String>,
    pub segments: Vec<TextSegment>,
}

impl DocumentHandle {
    /// All segment texts joined by newlines.
    pub fn full_text(&self) -> String {
        self.segments
            .iter()
            .map(|s| s.text.trim_end_matches('\n'))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// Feedback ready for delivery. Consumed once by a patcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedbackItem {
    pub label: String,
    pub content: String,
    /// Insertion index for the inline variant.
    pub target: usize,
}

impl FeedbackItem {
    pub fn new(label: impl Into<String>, content: impl Into<String>, target: usize) -> Self {
        Self {
            label: label.into(),
            content: content.into(),
            target,
        }
    }
}

/// How feedback is written back to the document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMode {
    /// Styled text inserted into the body.
    #[default]
    Inline,
    /// Drive comments attached to the file.
    Comment,
}

impl std::fmt::Display for DeliveryMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Inline => write!(f, "inline"),
            Self::Comment => write!(f, "comment"),
        }
    }
}

impl std::str::FromStr for DeliveryMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "inline" | "insert" => Ok(Self::Inline),
            "comment" | "comments" => Ok(Self::Comment),
            other => Err(format!("Unknown delivery mode: {}", other)),
        }
    }
}

/// Someone who owns the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentOwner {
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// One sharing grant on the file (`anyone`/`user`/`group`/`domain`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessGrant {
    #[serde(rename = "type")]
    pub grantee: String,
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// What the configured Google identity may do with a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentAccess {
    pub document_id: String,
    pub name: String,
    pub can_comment: bool,
    pub can_edit: bool,
    pub can_share: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<DocumentOwner>,
    /// Only listed when the caller may see them.
    pub permissions: Vec<AccessGrant>,
    /// `None` when the comment listing failed.
    pub comment_count: Option<usize>,
    /// Identity the document must be shared with, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub principal: Option<String>,
}

impl DocumentAccess {
    /// Whether feedback can be written back in `mode`.
    pub fn can_deliver(&self, mode: DeliveryMode) -> bool {
        match mode {
            DeliveryMode::Inline => self.can_edit,
            DeliveryMode::Comment => self.can_comment,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meaningful_len_counts_characters() {
        let seg = TextSegment::new("  짧은 글\n", 1, 10);
        assert_eq!(seg.meaningful_len(), 4);
    }

    #[test]
    fn test_insertion_point() {
        assert_eq!(TextSegment::new("abc\n", 5, 9).insertion_point(), 8);
        assert_eq!(TextSegment::new("", 5, 5).insertion_point(), 5);
    }

    #[test]
    fn test_full_text_joins_paragraphs() {
        let doc = DocumentHandle {
            id: "d".into(),
            title: "t".into(),
            revision_id: None,
            segments: vec![
                TextSegment::new("첫 문단\n", 1, 6),
                TextSegment::new("둘째 문단\n", 6, 12),
            ],
        };
        assert_eq!(doc.full_text(), "첫 문단\n둘째 문단");
    }

    #[test]
    fn test_delivery_mode_parse() {
        assert_eq!("comment".parse::<DeliveryMode>().unwrap(), DeliveryMode::Comment);
        assert_eq!(" Inline ".parse::<DeliveryMode>().unwrap(), DeliveryMode::Inline);
        assert!("email".parse::<DeliveryMode>().is_err());
    }

    #[test]
    fn test_comment_only_access_cannot_insert() {
        let access = DocumentAccess {
            document_id: "d".into(),
            name: "과제".into(),
            can_comment: true,
            can_edit: false,
            can_share: false,
            owner: None,
            permissions: vec![AccessGrant {
                grantee: "anyone".into(),
                role: "commenter".into(),
                email: None,
            }],
            comment_count: Some(0),
            principal: None,
        };
        assert!(access.can_deliver(DeliveryMode::Comment));
        assert!(!access.can_deliver(DeliveryMode::Inline));

        let json = serde_json::to_value(&access).unwrap();
        assert_eq!(json["canComment"], true);
        assert_eq!(json["permissions"][0]["type"], "anyone");
        assert!(json.get("principal").is_none());
    }
}
