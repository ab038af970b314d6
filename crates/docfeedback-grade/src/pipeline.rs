//! One submission, end to end.
//!
//! Only an invalid reference or a failed read aborts. Every later failure
//! (a generation call, the inline batch, a comment) is logged, recorded as a
//! report warning, and the run carries on with what it has. An access check
//! after the read warns early when the chosen delivery mode will be refused.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use docfeedback_core::{FeedbackConfig, Result};
use docfeedback_docs::reference::document_url;
use docfeedback_docs::{
    build_inline_batch, extract_document_id, post_comments, DeliveryMode, DocumentHandle,
    DocumentService, FeedbackItem,
};
use tracing::{debug, info, warn};

use crate::generator::FeedbackGenerator;
use crate::prompt::{document_prompt, segment_prompt};
use crate::rubric::RubricCategory;
use crate::segment::segment_feedback;
use crate::types::{FeedbackReport, FeedbackRequest, ItemPreview};

/// Pacing and thresholds for a run.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Pause before each per-segment LLM call.
    pub generation_delay: Duration,
    /// Pause between comment writes.
    pub write_delay: Duration,
    pub comment_max_chars: usize,
    /// Segments must be longer than this (trimmed, in characters) to be graded.
    pub min_segment_chars: usize,
}

impl PipelineSettings {
    pub fn from_config(config: &FeedbackConfig) -> Self {
        Self {
            generation_delay: config.generation_delay(),
            write_delay: config.write_delay(),
            comment_max_chars: config.comment_max_chars,
            min_segment_chars: config.min_segment_chars,
        }
    }
}

/// Generated text for one scope, before it is turned into items.
struct ScopeFeedback {
    /// 1-based segment number; `None` for the whole document.
    segment: Option<usize>,
    target: usize,
    text: String,
}

/// Everything a run needs: where documents come from and who writes feedback.
pub struct FeedbackContext {
    docs: Arc<dyn DocumentService>,
    generator: Arc<dyn FeedbackGenerator>,
    settings: PipelineSettings,
}

impl FeedbackContext {
    pub fn new(
        docs: Arc<dyn DocumentService>,
        generator: Arc<dyn FeedbackGenerator>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            docs,
            generator,
            settings,
        }
    }

    pub fn docs(&self) -> &Arc<dyn DocumentService> {
        &self.docs
    }

    /// Grade one document and deliver the feedback.
    pub async fn run(&self, request: &FeedbackRequest) -> Result<FeedbackReport> {
        let document_id = extract_document_id(&request.reference)?;
        info!(
            "Grading {} as {} ({} delivery, {} source)",
            document_id,
            request.genre,
            request.mode,
            self.docs.mode()
        );

        let document = self.docs.read(&document_id).await?;

        let mut report = FeedbackReport {
            submission_id: uuid::Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            document_id: document_id.clone(),
            title: document.title.clone(),
            document_url: document_url(&document_id),
            genre: request.genre,
            mode: request.mode,
            service_mode: self.docs.mode(),
            generator: self.generator.describe(),
            scopes_attempted: 0,
            scopes_succeeded: 0,
            items_planned: 0,
            items_delivered: 0,
            warnings: Vec::new(),
            items: Vec::new(),
            comments: None,
        };

        if document.is_empty() {
            warn!("Document {} has no text to grade", document_id);
            report
                .warnings
                .push("Document has no text to grade".to_string());
            return Ok(report);
        }

        if let Some(warning) = self.preflight(&document_id, request.mode).await {
            warn!("{}", warning);
            report.warnings.push(warning);
        }

        let scopes = self.generate(request, &document, &mut report).await;
        let items = build_items(request.mode, scopes);
        report.items_planned = items.len();
        report.items = items
            .iter()
            .map(|i| ItemPreview {
                label: i.label.clone(),
                content: i.content.clone(),
            })
            .collect();

        if items.is_empty() {
            report
                .warnings
                .push("No feedback was generated; nothing written".to_string());
            return Ok(report);
        }

        match request.mode {
            DeliveryMode::Inline => {
                let batch = build_inline_batch(&items, document.revision_id.as_deref());
                match self.docs.batch_update(&document_id, &batch).await {
                    Ok(()) => {
                        report.items_delivered = items.len();
                        info!("Inserted {} feedback blocks into {}", items.len(), document_id);
                    }
                    Err(e) => {
                        warn!("Inline batch for {} failed: {}", document_id, e);
                        report.warnings.push(format!("Inline insert failed: {}", e));
                    }
                }
            }
            DeliveryMode::Comment => {
                let run = post_comments(
                    self.docs.as_ref(),
                    &document_id,
                    &items,
                    self.settings.comment_max_chars,
                    self.settings.write_delay,
                )
                .await;
                report.items_delivered = run.sent();
                report.warnings.extend(
                    run.errors()
                        .map(|(label, e)| format!("Comment '{}' failed: {}", label, e)),
                );
                report.comments = Some(run);
            }
        }

        Ok(report)
    }

    /// Warning text when the document will refuse `mode`. Check failures are ignored.
    async fn preflight(&self, document_id: &str, mode: DeliveryMode) -> Option<String> {
        let access = match self.docs.check_access(document_id).await {
            Ok(access) => access,
            Err(e) => {
                debug!("Access check for {} skipped: {}", document_id, e);
                return None;
            }
        };
        if access.can_deliver(mode) {
            return None;
        }

        let needed = match mode {
            DeliveryMode::Inline => "edit",
            DeliveryMode::Comment => "comment",
        };
        Some(match &access.principal {
            Some(principal) => format!(
                "Document does not allow {} access; share it with {} to deliver {} feedback",
                needed, principal, mode
            ),
            None => format!(
                "Document does not allow {} access; {} feedback will likely be refused",
                needed, mode
            ),
        })
    }

    /// Overall call first, then one call per meaningful segment.
    async fn generate(
        &self,
        request: &FeedbackRequest,
        document: &DocumentHandle,
        report: &mut FeedbackReport,
    ) -> Vec<ScopeFeedback> {
        let max_chars = self.generator.max_input_chars();
        let mut scopes = Vec::new();

        let prompt = document_prompt(
            request.genre,
            &document.full_text(),
            request.custom_instructions.as_deref(),
            max_chars,
            request.mode,
        );
        report.scopes_attempted += 1;
        match self.generator.generate(&prompt).await {
            Ok(text) => {
                report.scopes_succeeded += 1;
                scopes.push(ScopeFeedback {
                    segment: None,
                    target: document.segments[0].start,
                    text,
                });
            }
            Err(e) => {
                warn!("Overall feedback failed: {}", e);
                report.warnings.push(format!("Overall feedback failed: {}", e));
            }
        }

        for (idx, segment) in document.segments.iter().enumerate() {
            let number = idx + 1;
            if segment.meaningful_len() <= self.settings.min_segment_chars {
                debug!("Skipping short segment {} ({} chars)", number, segment.meaningful_len());
                continue;
            }

            if !self.settings.generation_delay.is_zero() {
                tokio::time::sleep(self.settings.generation_delay).await;
            }

            info!("Analyzing segment {}/{}", number, document.segments.len());
            let prompt = segment_prompt(request.genre, number, &segment.text, max_chars);
            report.scopes_attempted += 1;
            match self.generator.generate(&prompt).await {
                Ok(text) => {
                    report.scopes_succeeded += 1;
                    scopes.push(ScopeFeedback {
                        segment: Some(number),
                        target: segment.insertion_point(),
                        text,
                    });
                }
                Err(e) => {
                    warn!("Segment {} feedback failed: {}", number, e);
                    report
                        .warnings
                        .push(format!("Segment {} feedback failed: {}", number, e));
                }
            }
        }

        scopes
    }
}

fn segment_label(number: usize) -> String {
    format!("섹션 {} 평가", number)
}

/// Inline: one item per scope. Comment: the overall text is split into
/// rubric categories, one item each; segment items follow unchanged.
fn build_items(mode: DeliveryMode, scopes: Vec<ScopeFeedback>) -> Vec<FeedbackItem> {
    let mut items = Vec::new();
    for scope in scopes {
        if scope.text.trim().is_empty() {
            continue;
        }
        match (scope.segment, mode) {
            (Some(number), _) => {
                items.push(FeedbackItem::new(segment_label(number), scope.text, scope.target));
            }
            (None, DeliveryMode::Inline) => {
                items.push(FeedbackItem::new(
                    RubricCategory::Overall.label(),
                    scope.text,
                    scope.target,
                ));
            }
            (None, DeliveryMode::Comment) => {
                for (category, content) in segment_feedback(&scope.text) {
                    items.push(FeedbackItem::new(category.label(), content, scope.target));
                }
            }
        }
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use docfeedback_core::{Error, ReadFailure, ServiceMode, WriteFailure};
    use docfeedback_docs::{BatchUpdate, DemoDocumentService, DocumentAccess, TextSegment};
    use parking_lot::Mutex;

    use crate::prompt::{PromptSpec, DOCUMENT_MAX_TOKENS};
    use crate::rubric::Genre;

    const OVERALL: &str = "## 구조와 논리성\n서론과 결론이 호응합니다.\n## 형식과 표현\n띄어쓰기를 점검하세요.";

    /// Canned replies; fails segment prompts containing `poison`.
    struct CannedGenerator {
        prompts: Mutex<Vec<PromptSpec>>,
        poison: Option<&'static str>,
    }

    impl CannedGenerator {
        fn new(poison: Option<&'static str>) -> Arc<Self> {
            Arc::new(Self {
                prompts: Mutex::new(Vec::new()),
                poison,
            })
        }
    }

    #[async_trait]
    impl FeedbackGenerator for CannedGenerator {
        fn max_input_chars(&self) -> usize {
            3000
        }

        fn describe(&self) -> String {
            "canned".into()
        }

        async fn generate(&self, prompt: &PromptSpec) -> Result<String> {
            self.prompts.lock().push(prompt.clone());
            if prompt.max_tokens == DOCUMENT_MAX_TOKENS {
                return Ok(OVERALL.to_string());
            }
            if let Some(p) = self.poison {
                if prompt.user.contains(p) {
                    return Err(Error::Generation("rate limited".into()));
                }
            }
            Ok("도입이 자연스럽습니다. 예시를 하나 더 들어 보세요.".to_string())
        }
    }

    /// Keeps every batch and comment; can refuse batches or reads.
    struct CapturingDocs {
        document: DocumentHandle,
        batches: Mutex<Vec<BatchUpdate>>,
        comments: Mutex<Vec<String>>,
        fail_batch: bool,
        fail_read: bool,
        can_edit: bool,
    }

    impl CapturingDocs {
        fn new(document: DocumentHandle) -> Arc<Self> {
            Self::failing(document, false, false)
        }

        fn failing(document: DocumentHandle, fail_batch: bool, fail_read: bool) -> Arc<Self> {
            Arc::new(Self {
                document,
                batches: Mutex::new(Vec::new()),
                comments: Mutex::new(Vec::new()),
                fail_batch,
                fail_read,
                can_edit: true,
            })
        }

        /// Shared as commenter only; batches are refused like the real API does.
        fn comment_only(document: DocumentHandle) -> Arc<Self> {
            Arc::new(Self {
                document,
                batches: Mutex::new(Vec::new()),
                comments: Mutex::new(Vec::new()),
                fail_batch: true,
                fail_read: false,
                can_edit: false,
            })
        }
    }

    #[async_trait]
    impl DocumentService for CapturingDocs {
        fn is_available(&self) -> bool {
            true
        }

        fn mode(&self) -> ServiceMode {
            ServiceMode::Live
        }

        async fn read(&self, document_id: &str) -> Result<DocumentHandle> {
            if self.fail_read {
                return Err(Error::read(ReadFailure::NotFound, "404 Not Found"));
            }
            Ok(DocumentHandle {
                id: document_id.to_string(),
                ..self.document.clone()
            })
        }

        async fn batch_update(&self, _document_id: &str, batch: &BatchUpdate) -> Result<()> {
            if self.fail_batch {
                return Err(Error::write(WriteFailure::Failed, "400 Bad Request"));
            }
            self.batches.lock().push(batch.clone());
            Ok(())
        }

        async fn create_comment(&self, _document_id: &str, content: &str) -> Result<String> {
            let mut comments = self.comments.lock();
            comments.push(content.to_string());
            Ok(format!("c{}", comments.len()))
        }

        async fn check_access(&self, document_id: &str) -> Result<DocumentAccess> {
            if self.fail_read {
                return Err(Error::read(ReadFailure::NotFound, "404 Not Found"));
            }
            Ok(DocumentAccess {
                document_id: document_id.to_string(),
                name: self.document.title.clone(),
                can_comment: true,
                can_edit: self.can_edit,
                can_share: false,
                owner: None,
                permissions: Vec::new(),
                comment_count: Some(self.comments.lock().len()),
                principal: Some("feedback-bot@school-ai.iam.gserviceaccount.com".into()),
            })
        }
    }

    fn settings() -> PipelineSettings {
        PipelineSettings {
            generation_delay: Duration::ZERO,
            write_delay: Duration::ZERO,
            comment_max_chars: 1800,
            min_segment_chars: 50,
        }
    }

    fn essay() -> DocumentHandle {
        DocumentHandle {
            id: "essay".into(),
            title: "환경 보호에 대한 나의 생각".into(),
            revision_id: Some("rev-7".into()),
            segments: vec![
                TextSegment::new("제목\n", 1, 4),
                TextSegment::new(format!("{}\n", "가".repeat(60)), 4, 65),
                TextSegment::new(format!("{}\n", "나".repeat(80)), 65, 146),
            ],
        }
    }

    #[tokio::test]
    async fn test_short_single_segment_yields_only_overall() {
        let docs = CapturingDocs::new(DocumentHandle {
            id: "x".into(),
            title: "짧은 글".into(),
            revision_id: None,
            segments: vec![TextSegment::new("짧은 글", 1, 10)],
        });
        let generator = CannedGenerator::new(None);
        let ctx = FeedbackContext::new(docs.clone(), generator.clone(), settings());

        let request = FeedbackRequest::new(
            "https://docs.google.com/document/d/ABC123/edit",
            Genre::Reflection,
            DeliveryMode::Inline,
        );
        let report = ctx.run(&request).await.unwrap();

        assert_eq!(report.document_id, "ABC123");
        assert_eq!(report.scopes_attempted, 1);
        assert_eq!(report.items_planned, 1);
        assert_eq!(report.items_delivered, 1);
        assert_eq!(report.items[0].label, "전체 평가");
        assert!(report.warnings.is_empty());
        assert_eq!(generator.prompts.lock().len(), 1);

        let batches = docs.batches.lock();
        assert_eq!(batches.len(), 1);
        let targets: Vec<usize> = batches[0].insertions().map(|i| i.location.index).collect();
        assert_eq!(targets, vec![1]);
    }

    #[tokio::test]
    async fn test_inline_run_targets_and_revision() {
        let docs = CapturingDocs::new(essay());
        let generator = CannedGenerator::new(None);
        let ctx = FeedbackContext::new(docs.clone(), generator, settings());

        let request = FeedbackRequest::new("essay-doc-id", Genre::Report, DeliveryMode::Inline);
        let report = ctx.run(&request).await.unwrap();

        assert_eq!(report.scopes_attempted, 3);
        assert_eq!(report.scopes_succeeded, 3);
        assert!(report.is_complete());
        let labels: Vec<_> = report.items.iter().map(|i| i.label.as_str()).collect();
        assert_eq!(labels, vec!["전체 평가", "섹션 2 평가", "섹션 3 평가"]);

        let batches = docs.batches.lock();
        let batch = &batches[0];
        assert_eq!(
            batch.write_control.as_ref().map(|w| w.required_revision_id.as_str()),
            Some("rev-7")
        );
        let targets: Vec<usize> = batch.insertions().map(|i| i.location.index).collect();
        assert_eq!(targets, vec![145, 64, 1]);
    }

    #[tokio::test]
    async fn test_segment_failure_is_a_warning() {
        let docs = CapturingDocs::new(essay());
        let generator = CannedGenerator::new(Some("나나나"));
        let ctx = FeedbackContext::new(docs, generator, settings());

        let request = FeedbackRequest::new("essay-doc-id", Genre::Report, DeliveryMode::Inline);
        let report = ctx.run(&request).await.unwrap();

        assert_eq!(report.scopes_attempted, 3);
        assert_eq!(report.scopes_succeeded, 2);
        assert_eq!(report.items_delivered, 2);
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].starts_with("Segment 3 feedback failed"));
    }

    #[tokio::test]
    async fn test_failed_batch_delivers_nothing() {
        let docs = CapturingDocs::failing(essay(), true, false);
        let ctx = FeedbackContext::new(docs, CannedGenerator::new(None), settings());

        let request = FeedbackRequest::new("essay-doc-id", Genre::Report, DeliveryMode::Inline);
        let report = ctx.run(&request).await.unwrap();

        assert_eq!(report.items_planned, 3);
        assert_eq!(report.items_delivered, 0);
        assert!(report.warnings[0].starts_with("Inline insert failed"));
    }

    #[tokio::test]
    async fn test_preflight_warns_when_document_is_not_editable() {
        let docs = CapturingDocs::comment_only(essay());
        let ctx = FeedbackContext::new(docs, CannedGenerator::new(None), settings());

        let request = FeedbackRequest::new("essay-doc-id", Genre::Report, DeliveryMode::Inline);
        let report = ctx.run(&request).await.unwrap();

        assert_eq!(report.items_delivered, 0);
        assert_eq!(report.warnings.len(), 2);
        assert!(report.warnings[0].contains("does not allow edit access"));
        assert!(report.warnings[0].contains("feedback-bot@school-ai.iam.gserviceaccount.com"));
        assert!(report.warnings[1].starts_with("Inline insert failed"));
    }

    #[tokio::test]
    async fn test_preflight_is_quiet_when_mode_is_allowed() {
        let docs = CapturingDocs::comment_only(essay());
        let ctx = FeedbackContext::new(docs, CannedGenerator::new(None), settings());

        let request = FeedbackRequest::new("essay-doc-id", Genre::Report, DeliveryMode::Comment);
        let report = ctx.run(&request).await.unwrap();

        assert!(report.warnings.is_empty());
        assert!(report.is_complete());
    }

    #[tokio::test]
    async fn test_comment_run_splits_overall_by_category() {
        let docs = CapturingDocs::new(essay());
        let generator = CannedGenerator::new(None);
        let ctx = FeedbackContext::new(docs.clone(), generator.clone(), settings());

        let request = FeedbackRequest::new("essay-doc-id", Genre::Critique, DeliveryMode::Comment)
            .with_instructions("근거 위주로");
        let report = ctx.run(&request).await.unwrap();

        let labels: Vec<_> = report.items.iter().map(|i| i.label.as_str()).collect();
        assert_eq!(
            labels,
            vec!["구조와 논리성", "형식과 표현", "섹션 2 평가", "섹션 3 평가"]
        );
        assert_eq!(report.items_delivered, 4);
        assert_eq!(report.comments.as_ref().map(|c| c.total()), Some(4));

        let comments = docs.comments.lock();
        assert!(comments[0].starts_with("[AI 평가 - 구조와 논리성]\n## 구조와 논리성"));
        assert!(docs.batches.lock().is_empty());

        let prompts = generator.prompts.lock();
        assert!(prompts[0].user.contains("추가 지시사항: 근거 위주로"));
        assert!(prompts[0].user.contains("추가 제안사항"));
    }

    #[tokio::test]
    async fn test_read_failure_aborts() {
        let docs = CapturingDocs::failing(essay(), false, true);
        let ctx = FeedbackContext::new(docs, CannedGenerator::new(None), settings());
        let request = FeedbackRequest::new("essay-doc-id", Genre::Report, DeliveryMode::Inline);

        let err = ctx.run(&request).await.unwrap_err();
        assert!(matches!(err, Error::Read { kind: ReadFailure::NotFound, .. }));
    }

    #[tokio::test]
    async fn test_invalid_reference_aborts_before_read() {
        let generator = CannedGenerator::new(None);
        let ctx = FeedbackContext::new(
            Arc::new(DemoDocumentService::new()),
            generator.clone(),
            settings(),
        );
        let request = FeedbackRequest::new("not a doc", Genre::Report, DeliveryMode::Inline);

        assert!(matches!(ctx.run(&request).await, Err(Error::InvalidReference(_))));
        assert!(generator.prompts.lock().is_empty());
    }

    #[tokio::test]
    async fn test_empty_document_reports_warning() {
        let docs = CapturingDocs::new(DocumentHandle {
            id: "x".into(),
            title: "빈 문서".into(),
            revision_id: None,
            segments: Vec::new(),
        });
        let generator = CannedGenerator::new(None);
        let ctx = FeedbackContext::new(docs, generator.clone(), settings());
        let request = FeedbackRequest::new("empty-doc-id", Genre::Report, DeliveryMode::Inline);

        let report = ctx.run(&request).await.unwrap();
        assert_eq!(report.scopes_attempted, 0);
        assert_eq!(report.warnings.len(), 1);
        assert!(generator.prompts.lock().is_empty());
    }

    #[tokio::test]
    async fn test_demo_source_records_writes() {
        let demo = Arc::new(DemoDocumentService::new());
        let ctx = FeedbackContext::new(demo.clone(), CannedGenerator::new(None), settings());
        let request = FeedbackRequest::new("demo-document-1", Genre::Argumentative, DeliveryMode::Inline);

        let report = ctx.run(&request).await.unwrap();
        assert_eq!(report.service_mode, ServiceMode::Demo);
        // Title line is too short; the four body paragraphs are graded.
        assert_eq!(report.scopes_attempted, 5);
        assert_eq!(demo.writes().len(), 1);
    }
}
