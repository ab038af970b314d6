//! Genres and rubric categories.

use serde::{Deserialize, Serialize};

use docfeedback_core::Error;

/// Fixed evaluation dimensions. Declaration order is the classifier order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RubricCategory {
    /// Default bucket for text before any category heading.
    Overall,
    StructureLogic,
    ContentDepth,
    AcademicWriting,
    Originality,
    FormExpression,
    FurtherSuggestions,
}

/// Categories tested against each line, top to bottom; first match wins.
pub const CLASSIFIER: &[(RubricCategory, &[&str])] = &[
    (RubricCategory::StructureLogic, &["구조", "논리", "structure", "logic"]),
    (
        RubricCategory::ContentDepth,
        &["내용", "충실", "근거", "자료", "content", "evidence"],
    ),
    (
        RubricCategory::AcademicWriting,
        &["학술", "인용", "참고문헌", "academic", "citation"],
    ),
    (RubricCategory::Originality, &["창의", "독창", "originality", "creativ"]),
    (
        RubricCategory::FormExpression,
        &["형식", "표현", "문법", "맞춤법", "grammar", "expression"],
    ),
    (
        RubricCategory::FurtherSuggestions,
        &["추가 제안", "제안사항", "suggestion"],
    ),
];

impl RubricCategory {
    /// Korean heading used in prompts and feedback labels.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Overall => "전체 평가",
            Self::StructureLogic => "구조와 논리성",
            Self::ContentDepth => "내용의 충실성",
            Self::AcademicWriting => "학술적 글쓰기",
            Self::Originality => "창의성과 독창성",
            Self::FormExpression => "형식과 표현",
            Self::FurtherSuggestions => "추가 제안사항",
        }
    }

    /// Categories the model is asked to address, in heading order.
    pub fn headings() -> impl Iterator<Item = RubricCategory> {
        CLASSIFIER.iter().map(|(c, _)| *c)
    }
}

impl std::fmt::Display for RubricCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Writing genre selected by the teacher.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Genre {
    #[default]
    Reflection,
    Critique,
    Report,
    ResearchPaper,
    Argumentative,
}

/// Prompt text attached to a genre.
#[derive(Debug, Clone, Serialize)]
pub struct GenreRubric {
    pub genre: Genre,
    pub name: &'static str,
    pub description: &'static str,
    pub structure: &'static [&'static str],
    pub criteria: &'static str,
}

pub const GENRES: &[GenreRubric] = &[
    GenreRubric {
        genre: Genre::Reflection,
        name: "감상문",
        description: "독서감상문, 영화감상문 등 작품에 대한 개인적 감상을 표현하는 글",
        structure: &[
            "도입부: 작품 소개와 첫인상",
            "전개부: 인상 깊은 장면/내용과 개인적 감상",
            "결론부: 작품이 주는 교훈이나 의미",
        ],
        criteria: "개인적 감상의 진정성, 구체적 근거 제시, 감정 표현의 적절성",
    },
    GenreRubric {
        genre: Genre::Critique,
        name: "비평문",
        description: "문학작품, 예술작품 등을 객관적으로 분석하고 평가하는 글",
        structure: &[
            "서론: 작품 소개와 비평의 관점 제시",
            "본론: 작품의 특징 분석과 평가",
            "결론: 종합적 평가와 의의",
        ],
        criteria: "분석의 객관성, 평가 기준의 명확성, 논리적 일관성",
    },
    GenreRubric {
        genre: Genre::Report,
        name: "보고서",
        description: "조사, 실험, 관찰 등의 결과를 체계적으로 정리한 글",
        structure: &[
            "서론: 목적과 배경 설명",
            "방법: 조사/실험 방법 설명",
            "결과: 데이터와 발견사항 제시",
            "논의: 결과 해석과 의미 분석",
            "결론: 요약과 제언",
        ],
        criteria: "객관성, 정확성, 체계성, 데이터의 신뢰성",
    },
    GenreRubric {
        genre: Genre::ResearchPaper,
        name: "소논문",
        description: "특정 주제에 대한 학술적 연구를 담은 글",
        structure: &[
            "서론: 연구 배경, 목적, 연구 문제",
            "이론적 배경: 선행연구 검토",
            "연구 방법: 연구 설계와 방법론",
            "연구 결과: 분석 결과 제시",
            "논의 및 결론: 시사점과 한계",
        ],
        criteria: "학술적 엄밀성, 논리적 타당성, 독창성, 인용의 정확성",
    },
    GenreRubric {
        genre: Genre::Argumentative,
        name: "논설문",
        description: "특정 주제에 대한 주장과 논거를 제시하는 글",
        structure: &[
            "서론: 논제 제시와 주장 예고",
            "본론: 논거 제시와 반박 고려",
            "결론: 주장 강조와 설득",
        ],
        criteria: "주장의 명확성, 논거의 타당성, 반박 고려, 설득력",
    },
];

impl Genre {
    pub fn rubric(&self) -> &'static GenreRubric {
        GENRES
            .iter()
            .find(|r| r.genre == *self)
            .unwrap_or(&GENRES[0])
    }

    pub fn slug(&self) -> &'static str {
        match self {
            Self::Reflection => "reflection",
            Self::Critique => "critique",
            Self::Report => "report",
            Self::ResearchPaper => "research-paper",
            Self::Argumentative => "argumentative",
        }
    }

    pub fn name(&self) -> &'static str {
        self.rubric().name
    }
}

impl std::fmt::Display for Genre {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Genre {
    type Err = Error;

    /// Accepts the Korean name or the slug.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        GENRES
            .iter()
            .find(|r| r.name == s || r.genre.slug().eq_ignore_ascii_case(s))
            .map(|r| r.genre)
            .ok_or_else(|| Error::UnknownGenre(s.to_string()))
    }
}
