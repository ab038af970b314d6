//! Demo document source used when the live API is unavailable.
//!
//! Reads return a fixed sample essay under the requested ID. Writes always
//! succeed and are recorded so callers can show what would have been sent.

use async_trait::async_trait;
use docfeedback_core::{Result, ServiceMode};
use parking_lot::Mutex;
use serde::Serialize;
use tracing::info;

use crate::patch::{utf16_len, BatchUpdate};
use crate::service::DocumentService;
use crate::types::{DocumentAccess, DocumentHandle, TextSegment};

const SAMPLE_TITLE: &str = "[데모] 인공지능 시대의 글쓰기 교육";

const SAMPLE_PARAGRAPHS: &[&str] = &[
    "인공지능 시대의 글쓰기 교육",
    "최근 생성형 인공지능이 빠르게 보급되면서 학생들이 글을 쓰는 방식도 크게 달라지고 있다. \
     과제를 대신 작성해 주는 도구가 등장하자 글쓰기 교육이 더 이상 필요 없다는 주장까지 나온다. \
     그러나 나는 인공지능 시대일수록 글쓰기 교육이 더욱 중요해진다고 생각한다.",
    "첫째, 글쓰기는 생각을 정리하는 과정이다. 인공지능이 문장을 만들어 줄 수는 있지만 \
     무엇을 말하고 싶은지 결정하는 것은 여전히 글쓴이의 몫이다. \
     스스로 논리를 세워 보지 않은 학생은 인공지능이 만든 글이 타당한지도 판단하기 어렵다.",
    "둘째, 비판적으로 읽고 고쳐 쓰는 능력이 필요하다. 인공지능이 제시한 자료에는 \
     사실과 다른 내용이 섞여 있을 수 있으므로 출처를 확인하고 근거를 검토하는 습관이 요구된다.",
    "따라서 학교는 인공지능을 금지하기보다 올바르게 활용하는 글쓰기 교육을 고민해야 한다. \
     도구를 쓰더라도 생각의 주인은 학생 자신이어야 한다.",
];

/// A write the demo source accepted.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RecordedWrite {
    Batch {
        #[serde(rename = "documentId")]
        document_id: String,
        requests: usize,
    },
    Comment {
        #[serde(rename = "documentId")]
        document_id: String,
        content: String,
    },
}

/// In-memory stand-in for the Docs/Drive APIs.
pub struct DemoDocumentService {
    document: DocumentHandle,
    writes: Mutex<Vec<RecordedWrite>>,
}

impl DemoDocumentService {
    /// Demo source serving the built-in sample essay.
    pub fn new() -> Self {
        Self::with_document(Self::sample_document())
    }

    /// Demo source serving a caller-provided document.
    pub fn with_document(document: DocumentHandle) -> Self {
        Self {
            document,
            writes: Mutex::new(Vec::new()),
        }
    }

    /// The fixed sample, with offsets laid out like a real Docs body.
    pub fn sample_document() -> DocumentHandle {
        let mut index = 1;
        let segments = SAMPLE_PARAGRAPHS
            .iter()
            .map(|p| {
                let text = format!("{}\n", p);
                let start = index;
                index += utf16_len(&text);
                TextSegment::new(text, start, index)
            })
            .collect();

        DocumentHandle {
            id: "demo".into(),
            title: SAMPLE_TITLE.into(),
            revision_id: None,
            segments,
        }
    }

    /// Writes recorded so far.
    pub fn writes(&self) -> Vec<RecordedWrite> {
        self.writes.lock().clone()
    }
}

impl Default for DemoDocumentService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentService for DemoDocumentService {
    fn is_available(&self) -> bool {
        true
    }

    fn mode(&self) -> ServiceMode {
        ServiceMode::Demo
    }

    async fn read(&self, document_id: &str) -> Result<DocumentHandle> {
        info!("Demo mode: serving sample document for {}", document_id);
        Ok(DocumentHandle {
            id: document_id.to_string(),
            ..self.document.clone()
        })
    }

    async fn batch_update(&self, document_id: &str, batch: &BatchUpdate) -> Result<()> {
        info!("Demo mode: recorded {} edit requests", batch.requests.len());
        self.writes.lock().push(RecordedWrite::Batch {
            document_id: document_id.to_string(),
            requests: batch.requests.len(),
        });
        Ok(())
    }

    async fn create_comment(&self, document_id: &str, content: &str) -> Result<String> {
        let mut writes = self.writes.lock();
        writes.push(RecordedWrite::Comment {
            document_id: document_id.to_string(),
            content: content.to_string(),
        });
        Ok(format!("demo-comment-{}", writes.len()))
    }

    async fn check_access(&self, document_id: &str) -> Result<DocumentAccess> {
        let comment_count = self
            .writes
            .lock()
            .iter()
            .filter(|w| matches!(w, RecordedWrite::Comment { document_id: id, .. } if id == document_id))
            .count();

        Ok(DocumentAccess {
            document_id: document_id.to_string(),
            name: self.document.title.clone(),
            can_comment: true,
            can_edit: true,
            can_share: true,
            owner: None,
            permissions: Vec::new(),
            comment_count: Some(comment_count),
            principal: None,
        })
    }
}
