//! Google Docs / Drive REST client.

use async_trait::async_trait;
use docfeedback_core::{Error, ReadFailure, Result, ServiceMode, WriteFailure};
use reqwest::{Client, StatusCode};
use serde::de::IgnoredAny;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::auth::GoogleCredentials;
use crate::patch::BatchUpdate;
use crate::service::DocumentService;
use crate::types::{AccessGrant, DocumentAccess, DocumentHandle, DocumentOwner, TextSegment};

const UNTITLED: &str = "제목 없음";

/// Live document service backed by the Docs and Drive APIs.
pub struct GoogleDocsClient {
    client: Client,
    credentials: GoogleCredentials,
    docs_base: String,
    drive_base: String,
}

impl GoogleDocsClient {
    pub fn new(
        client: Client,
        credentials: GoogleCredentials,
        docs_base: &str,
        drive_base: &str,
    ) -> Self {
        Self {
            client,
            credentials,
            docs_base: docs_base.trim_end_matches('/').to_string(),
            drive_base: drive_base.trim_end_matches('/').to_string(),
        }
    }

    fn document_url(&self, document_id: &str) -> String {
        format!("{}/v1/documents/{}", self.docs_base, document_id)
    }

    fn file_url(&self, document_id: &str) -> String {
        format!("{}/drive/v3/files/{}", self.drive_base, document_id)
    }

    /// Number of comments already on the file; `None` when listing fails.
    async fn count_comments(&self, document_id: &str, token: &str) -> Option<usize> {
        let response = self
            .client
            .get(format!("{}/comments", self.file_url(document_id)))
            .query(&[("fields", "comments(id)"), ("pageSize", "100")])
            .bearer_auth(token)
            .send()
            .await;

        let response = match response {
            Ok(r) if r.status().is_success() => r,
            Ok(r) => {
                warn!("Listing comments on {} failed with {}", document_id, r.status());
                return None;
            }
            Err(e) => {
                warn!("Listing comments on {} failed: {}", document_id, e);
                return None;
            }
        };

        match response.json::<RawCommentList>().await {
            Ok(list) => Some(list.comments.len()),
            Err(e) => {
                warn!("Unreadable comment list for {}: {}", document_id, e);
                None
            }
        }
    }
}

#[async_trait]
impl DocumentService for GoogleDocsClient {
    fn is_available(&self) -> bool {
        self.credentials.is_usable()
    }

    fn mode(&self) -> ServiceMode {
        ServiceMode::Live
    }

    async fn read(&self, document_id: &str) -> Result<DocumentHandle> {
        debug!("Reading document {}", document_id);
        let token = self
            .credentials
            .bearer()
            .await
            .map_err(|e| Error::read(ReadFailure::Transient, e.to_string()))?;

        let response = self
            .client
            .get(self.document_url(document_id))
            .bearer_auth(&token)
            .send()
            .await
            .map_err(|e| Error::read(ReadFailure::Transient, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let kind = classify_read_status(status);
            warn!("Read of {} failed with {}: {}", document_id, status, body);
            return Err(Error::read(kind, provider_message(status, &body)));
        }

        let raw: RawDocument = response
            .json()
            .await
            .map_err(|e| Error::read(ReadFailure::Transient, e.to_string()))?;

        let handle = parse_document(document_id, raw);
        info!(
            "Read document '{}' ({} segments)",
            handle.title,
            handle.segments.len()
        );
        Ok(handle)
    }

    async fn batch_update(&self, document_id: &str, batch: &BatchUpdate) -> Result<()> {
        let url = format!("{}:batchUpdate", self.document_url(document_id));
        debug!("Submitting {} edit requests to {}", batch.requests.len(), document_id);
        let token = self
            .credentials
            .bearer()
            .await
            .map_err(|e| Error::write(WriteFailure::Failed, e.to_string()))?;

        let response = self
            .client
            .post(url)
            .bearer_auth(&token)
            .json(batch)
            .send()
            .await
            .map_err(|e| Error::write(WriteFailure::Failed, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::write(
                classify_write_status(status, &body),
                provider_message(status, &body),
            ));
        }
        Ok(())
    }

    async fn create_comment(&self, document_id: &str, content: &str) -> Result<String> {
        let url = format!("{}/comments", self.file_url(document_id));
        let token = self
            .credentials
            .bearer()
            .await
            .map_err(|e| Error::write(WriteFailure::Failed, e.to_string()))?;

        let response = self
            .client
            .post(url)
            .query(&[("fields", "id")])
            .bearer_auth(&token)
            .json(&json!({ "content": content }))
            .send()
            .await
            .map_err(|e| Error::write(WriteFailure::Failed, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::write(
                classify_write_status(status, &body),
                provider_message(status, &body),
            ));
        }

        let created: serde_json::Value = response
            .json()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;
        Ok(created["id"].as_str().unwrap_or_default().to_string())
    }

    async fn check_access(&self, document_id: &str) -> Result<DocumentAccess> {
        let token = self
            .credentials
            .bearer()
            .await
            .map_err(|e| Error::read(ReadFailure::Transient, e.to_string()))?;

        let response = self
            .client
            .get(self.file_url(document_id))
            .query(&[("fields", "name,permissions,capabilities,owners")])
            .bearer_auth(&token)
            .send()
            .await
            .map_err(|e| Error::read(ReadFailure::Transient, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Access check on {} failed with {}: {}", document_id, status, body);
            return Err(Error::read(
                classify_read_status(status),
                provider_message(status, &body),
            ));
        }

        let file: RawFile = response
            .json()
            .await
            .map_err(|e| Error::read(ReadFailure::Transient, e.to_string()))?;
        let comment_count = self.count_comments(document_id, &token).await;

        let access = file.into_access(
            document_id,
            comment_count,
            self.credentials.principal().map(String::from),
        );
        info!(
            "Access to {}: comment={} edit={} share={}",
            document_id, access.can_comment, access.can_edit, access.can_share
        );
        Ok(access)
    }
}

// ---------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawDocument {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    revision_id: Option<String>,
    #[serde(default)]
    body: Option<RawBody>,
}

#[derive(Debug, Default, Deserialize)]
struct RawBody {
    #[serde(default)]
    content: Vec<RawStructuralElement>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawStructuralElement {
    #[serde(default)]
    start_index: usize,
    #[serde(default)]
    end_index: usize,
    #[serde(default)]
    paragraph: Option<RawParagraph>,
}

#[derive(Debug, Deserialize)]
struct RawParagraph {
    #[serde(default)]
    elements: Vec<RawParagraphElement>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawParagraphElement {
    #[serde(default)]
    text_run: Option<RawTextRun>,
}

#[derive(Debug, Deserialize)]
struct RawTextRun {
    #[serde(default)]
    content: String,
}

/// Keep paragraph text runs only; drop whitespace-only runs and empty paragraphs.
pub(crate) fn parse_document(document_id: &str, raw: RawDocument) -> DocumentHandle {
    let segments = raw
        .body
        .unwrap_or_default()
        .content
        .into_iter()
        .filter_map(|element| {
            let paragraph = element.paragraph?;
            let text: String = paragraph
                .elements
                .into_iter()
                .filter_map(|e| e.text_run)
                .map(|run| run.content)
                .filter(|content| !content.trim().is_empty())
                .collect();
            if text.is_empty() {
                return None;
            }
            Some(TextSegment::new(text, element.start_index, element.end_index))
        })
        .collect();

    DocumentHandle {
        id: document_id.to_string(),
        title: raw.title.unwrap_or_else(|| UNTITLED.to_string()),
        revision_id: raw.revision_id,
        segments,
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawFile {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    capabilities: RawCapabilities,
    #[serde(default)]
    owners: Vec<RawUser>,
    #[serde(default)]
    permissions: Vec<RawPermission>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCapabilities {
    #[serde(default)]
    can_comment: bool,
    #[serde(default)]
    can_edit: bool,
    #[serde(default)]
    can_share: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawUser {
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    email_address: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPermission {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    role: String,
    #[serde(default)]
    email_address: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawCommentList {
    #[serde(default)]
    comments: Vec<IgnoredAny>,
}

impl RawFile {
    fn into_access(
        self,
        document_id: &str,
        comment_count: Option<usize>,
        principal: Option<String>,
    ) -> DocumentAccess {
        DocumentAccess {
            document_id: document_id.to_string(),
            name: self.name.unwrap_or_else(|| UNTITLED.to_string()),
            can_comment: self.capabilities.can_comment,
            can_edit: self.capabilities.can_edit,
            can_share: self.capabilities.can_share,
            owner: self.owners.into_iter().next().map(|o| DocumentOwner {
                display_name: o.display_name.unwrap_or_default(),
                email: o.email_address,
            }),
            permissions: self
                .permissions
                .into_iter()
                .map(|p| AccessGrant {
                    grantee: p.kind,
                    role: p.role,
                    email: p.email_address,
                })
                .collect(),
            comment_count,
            principal,
        }
    }
}

fn classify_read_status(status: StatusCode) -> ReadFailure {
    match status {
        StatusCode::NOT_FOUND => ReadFailure::NotFound,
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ReadFailure::PermissionDenied,
        _ => ReadFailure::Transient,
    }
}

fn classify_write_status(status: StatusCode, body: &str) -> WriteFailure {
    let lower = body.to_lowercase();
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => WriteFailure::PermissionDenied,
        StatusCode::PAYLOAD_TOO_LARGE => WriteFailure::TooLong,
        StatusCode::BAD_REQUEST
            if lower.contains("too long") || lower.contains("exceeds") || lower.contains("maximum length") =>
        {
            WriteFailure::TooLong
        }
        _ => WriteFailure::Failed,
    }
}

/// Prefer the API's `error.message`, fall back to the raw body.
fn provider_message(status: StatusCode, body: &str) -> String {
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(String::from))
        .unwrap_or_else(|| body.trim().to_string());
    format!("{}: {}", status, message)
}
