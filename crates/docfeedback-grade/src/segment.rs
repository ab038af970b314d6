//! Split one feedback blob into rubric categories by keyword.
//!
//! Greedy and order-dependent: the first category whose keyword appears in
//! a line becomes current, and every following line is filed there until
//! another line switches it. A passing mention of a keyword ("내용이 좋다")
//! moves the cursor just like a heading does.

use std::collections::BTreeMap;

use crate::rubric::{RubricCategory, CLASSIFIER};

fn classify(line: &str) -> Option<RubricCategory> {
    let lower = line.to_lowercase();
    CLASSIFIER
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(category, _)| *category)
}

/// Bucket trimmed, non-empty lines by category. Empty categories are absent.
pub fn segment_feedback(text: &str) -> BTreeMap<RubricCategory, String> {
    let mut buckets: BTreeMap<RubricCategory, Vec<&str>> = BTreeMap::new();
    let mut current = RubricCategory::Overall;

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if let Some(category) = classify(line) {
            current = category;
        }
        buckets.entry(current).or_default().push(line);
    }

    buckets
        .into_iter()
        .map(|(category, lines)| (category, lines.join("\n")))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_keywords_goes_to_overall() {
        let out = segment_feedback("전반적으로 잘 썼습니다.\n\n   \n앞으로도 기대됩니다.");
        assert_eq!(out.len(), 1);
        assert_eq!(
            out[&RubricCategory::Overall],
            "전반적으로 잘 썼습니다.\n앞으로도 기대됩니다."
        );
    }

    #[test]
    fn test_switch_at_heading_lines() {
        let text = "\
## 구조와 논리성
서론이 명확합니다.
본론이 길어요.
결론이 급합니다.
## 형식과 표현
맞는 말입니다.
띄어쓰기를 확인하세요.";
        let out = segment_feedback(text);

        assert_eq!(out.len(), 2);
        assert_eq!(
            out[&RubricCategory::StructureLogic],
            "## 구조와 논리성\n서론이 명확합니다.\n본론이 길어요.\n결론이 급합니다."
        );
        assert_eq!(
            out[&RubricCategory::FormExpression],
            "## 형식과 표현\n맞는 말입니다.\n띄어쓰기를 확인하세요."
        );
    }

    #[test]
    fn test_preamble_stays_in_overall() {
        let out = segment_feedback("총평입니다.\n1. 창의성과 독창성\n참신합니다.");
        assert_eq!(out[&RubricCategory::Overall], "총평입니다.");
        assert_eq!(
            out[&RubricCategory::Originality],
            "1. 창의성과 독창성\n참신합니다."
        );
    }

    #[test]
    fn test_english_keywords_are_case_insensitive() {
        let out = segment_feedback("STRUCTURE\nok\nCitation style\nAPA");
        assert_eq!(out[&RubricCategory::StructureLogic], "STRUCTURE\nok");
        assert_eq!(out[&RubricCategory::AcademicWriting], "Citation style\nAPA");
    }

    #[test]
    fn test_incidental_keyword_moves_cursor() {
        let text = "구조와 논리성\n문단 구성이 좋습니다.\n다만 내용이 반복됩니다.\n마무리를 보완하세요.";
        let out = segment_feedback(text);
        assert_eq!(
            out[&RubricCategory::StructureLogic],
            "구조와 논리성\n문단 구성이 좋습니다."
        );
        assert_eq!(
            out[&RubricCategory::ContentDepth],
            "다만 내용이 반복됩니다.\n마무리를 보완하세요."
        );
    }

    #[test]
    fn test_first_match_wins_across_categories() {
        // "표현" and "구조" both present; structure-logic is tested first.
        let out = segment_feedback("표현과 구조 모두 점검");
        assert!(out.contains_key(&RubricCategory::StructureLogic));
        assert!(!out.contains_key(&RubricCategory::FormExpression));
    }

    #[test]
    fn test_single_category_buffer_is_stable() {
        let text = "내용의 충실성\n근거가 구체적입니다.\n자료 출처를 밝히세요.";
        let first = segment_feedback(text);
        let buffer = &first[&RubricCategory::ContentDepth];
        let second = segment_feedback(buffer);
        assert_eq!(second.len(), 1);
        assert_eq!(&second[&RubricCategory::ContentDepth], buffer);
    }
}
