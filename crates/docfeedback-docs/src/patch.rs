//! Inline feedback: `documents.batchUpdate` request construction.
//!
//! Every insertion shifts the indices after it, so requests are emitted in
//! descending target order. Each insert is immediately followed by the style
//! edit for the range it just created, which is valid at that point in the
//! batch. The API applies the batch atomically.

use serde::Serialize;

use crate::types::FeedbackItem;

pub const SEPARATOR_WIDTH: usize = 50;
pub const STYLE_FIELDS: &str = "foregroundColor,backgroundColor,italic";

/// Request body for `documents.batchUpdate`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchUpdate {
    pub requests: Vec<DocsRequest>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub write_control: Option<WriteControl>,
}

impl BatchUpdate {
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    /// Insert requests in the order they will be applied.
    pub fn insertions(&self) -> impl Iterator<Item = &InsertText> {
        self.requests.iter().filter_map(|r| match r {
            DocsRequest::InsertText(insert) => Some(insert),
            DocsRequest::UpdateTextStyle(_) => None,
        })
    }
}

/// Reject the batch if the document changed since it was read.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteControl {
    pub required_revision_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DocsRequest {
    InsertText(InsertText),
    UpdateTextStyle(UpdateTextStyle),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsertText {
    pub location: Location,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Location {
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTextStyle {
    pub range: IndexRange,
    pub text_style: TextStyle,
    pub fields: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexRange {
    pub start_index: usize,
    pub end_index: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextStyle {
    pub foreground_color: OptionalColor,
    pub background_color: OptionalColor,
    pub italic: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionalColor {
    pub color: Color,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Color {
    pub rgb_color: RgbColor,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RgbColor {
    pub red: f32,
    pub green: f32,
    pub blue: f32,
}

impl OptionalColor {
    fn rgb(red: f32, green: f32, blue: f32) -> Self {
        Self {
            color: Color {
                rgb_color: RgbColor { red, green, blue },
            },
        }
    }
}

/// Blue italic text on a pale blue background.
fn feedback_style() -> TextStyle {
    TextStyle {
        foreground_color: OptionalColor::rgb(0.0, 0.0, 0.8),
        background_color: OptionalColor::rgb(0.95, 0.95, 1.0),
        italic: true,
    }
}

/// Text block inserted for one feedback item.
pub fn format_block(item: &FeedbackItem) -> String {
    format!(
        "\n\n[AI 평가 - {}]\n{}\n{}\n",
        item.label,
        item.content,
        "-".repeat(SEPARATOR_WIDTH)
    )
}

/// Length in the Docs API's index units (UTF-16 code units).
pub fn utf16_len(text: &str) -> usize {
    text.encode_utf16().count()
}

/// Build the batch for a set of items read from `revision_id`.
///
/// Items sharing a target keep their relative order in the final document.
pub fn build_inline_batch(items: &[FeedbackItem], revision_id: Option<&str>) -> BatchUpdate {
    let mut order: Vec<usize> = (0..items.len()).collect();
    order.sort_by(|&a, &b| items[b].target.cmp(&items[a].target).then(b.cmp(&a)));

    let mut requests = Vec::with_capacity(items.len() * 2);
    for idx in order {
        let item = &items[idx];
        let text = format_block(item);
        let len = utf16_len(&text);

        requests.push(DocsRequest::InsertText(InsertText {
            location: Location { index: item.target },
            text,
        }));
        requests.push(DocsRequest::UpdateTextStyle(UpdateTextStyle {
            range: IndexRange {
                start_index: item.target,
                end_index: item.target + len,
            },
            text_style: feedback_style(),
            fields: STYLE_FIELDS.into(),
        }));
    }

    BatchUpdate {
        requests,
        write_control: revision_id.map(|rev| WriteControl {
            required_revision_id: rev.to_string(),
        }),
    }
}
