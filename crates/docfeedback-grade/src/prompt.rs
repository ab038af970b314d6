//! Prompt templates for whole-document and per-segment feedback.

use docfeedback_chat::ChatMessage;
use docfeedback_docs::DeliveryMode;

use crate::rubric::{Genre, RubricCategory};

pub const DOCUMENT_MAX_TOKENS: usize = 3000;
pub const SEGMENT_MAX_TOKENS: usize = 500;
pub const TEMPERATURE: f64 = 0.7;
pub const TRUNCATION_MARKER: &str = "...(이하 생략)";

/// One LLM call: messages plus sampling parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptSpec {
    pub system: String,
    pub user: String,
    pub max_tokens: usize,
    pub temperature: f64,
}

impl PromptSpec {
    pub fn messages(&self) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(self.system.clone()),
            ChatMessage::user(self.user.clone()),
        ]
    }
}

/// Cut `text` to `max_chars` characters and append the marker.
/// Returns whether truncation happened.
pub fn truncate_for_prompt(text: &str, max_chars: usize) -> (String, bool) {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => (format!("{}{}", &text[..byte_idx], TRUNCATION_MARKER), true),
        None => (text.to_string(), false),
    }
}

/// Whole-document evaluation prompt.
///
/// In comment mode the model is asked to answer under the rubric headings
/// so the reply can be split per category.
pub fn document_prompt(
    genre: Genre,
    text: &str,
    custom_instructions: Option<&str>,
    max_chars: usize,
    mode: DeliveryMode,
) -> PromptSpec {
    let rubric = genre.rubric();
    let name = rubric.name;
    let (body, _) = truncate_for_prompt(text, max_chars);

    let mut user = format!(
        "다음은 {name}입니다. {name}의 일반적인 구조적 원리에 따라 평가해주세요.\n\n\
         평가 기준:\n구조: {}\n초점: {}\n",
        rubric.structure.join(", "),
        rubric.criteria
    );

    if let Some(extra) = custom_instructions.map(str::trim).filter(|s| !s.is_empty()) {
        user.push_str(&format!("\n추가 지시사항: {extra}\n"));
    }

    user.push_str(&format!("\n문서 전체 내용:\n{body}\n\n"));

    match mode {
        DeliveryMode::Inline => {
            user.push_str(&format!(
                "위 {name}에 대해 다음 사항을 포함하여 종합적으로 평가해주세요:\n\
                 1. 장르에 맞는 구조를 갖추었는지\n\
                 2. 각 부분이 적절히 구성되었는지\n\
                 3. 개선이 필요한 부분\n\
                 4. 잘된 점\n"
            ));
        }
        DeliveryMode::Comment => {
            user.push_str(&format!(
                "위 {name}에 대해 아래 항목별 제목을 그대로 사용하여 평가해주세요:\n"
            ));
            for (i, category) in RubricCategory::headings().enumerate() {
                user.push_str(&format!("{}. {}\n", i + 1, category.label()));
            }
        }
    }
    user.push_str("\n평가는 구체적이고 건설적으로 작성해주세요.");

    PromptSpec {
        system: format!("당신은 {name} 평가 전문가입니다. 학생들의 글을 건설적으로 평가해주세요."),
        user,
        max_tokens: DOCUMENT_MAX_TOKENS,
        temperature: TEMPERATURE,
    }
}

/// Per-paragraph prompt. `index` is 1-based.
pub fn segment_prompt(genre: Genre, index: usize, text: &str, max_chars: usize) -> PromptSpec {
    let rubric = genre.rubric();
    let name = rubric.name;
    let (body, _) = truncate_for_prompt(text.trim(), max_chars);

    let user = format!(
        "이것은 {name}의 일부분(섹션 {index})입니다.\n\
         현재 분석 중인 부분이 {name}의 어느 구조에 해당하는지 파악하고,\n\
         해당 부분에 맞는 구체적인 피드백을 제공해주세요.\n\n\
         {name}의 구조: {}\n\n\
         분석할 내용:\n{body}\n\n\
         위 내용에 대해 2-3문장으로 구체적이고 건설적인 피드백을 작성해주세요.\n\
         개선 제안을 포함해주세요.",
        rubric.structure.join(", ")
    );

    PromptSpec {
        system: format!("당신은 {name} 평가 전문가입니다."),
        user,
        max_tokens: SEGMENT_MAX_TOKENS,
        temperature: TEMPERATURE,
    }
}
