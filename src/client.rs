//! HTTP transport for the two service endpoints.
//!
//! * `POST /upload/`: multipart form, field `file`; answers
//!   `{"path": "...", ...}` once the document is processed.
//! * `POST /ask/`: multipart form, fields `pdf_path` and `question`; answers
//!   with a chunked body of `data: {json}` lines, handed back as a raw byte
//!   stream for [`crate::consumer`] to interpret.
//!
//! Both endpoints report failure as a non-2xx status with a JSON
//! `{"detail": ...}` body.

use crate::config::ClientConfig;
use crate::document::SelectedDocument;
use crate::error::PdfQaError;
use bytes::Bytes;
use futures::StreamExt;
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use std::time::Duration;
use tokio_stream::Stream;
use tracing::{debug, info};

/// A boxed stream of raw answer-body chunks.
pub type AnswerStream = Pin<Box<dyn Stream<Item = Result<Bytes, PdfQaError>> + Send>>;

/// Successful upload response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadReceipt {
    /// Server-side path identifying the document in later questions.
    pub path: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub collection: Option<String>,
    /// Number of text chunks the server indexed.
    #[serde(default)]
    pub chunks: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

/// Thin wrapper over a `reqwest::Client` bound to one service.
#[derive(Debug, Clone)]
pub struct QaClient {
    http: reqwest::Client,
    upload_url: String,
    ask_url: String,
}

impl QaClient {
    pub fn new(config: &ClientConfig) -> Result<Self, PdfQaError> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| PdfQaError::transport("Failed to build HTTP client", e))?;

        Ok(Self {
            http,
            upload_url: config.upload_url(),
            ask_url: config.ask_url(),
        })
    }

    /// Upload a validated PDF and wait for the server to process it.
    pub async fn upload(&self, doc: &SelectedDocument) -> Result<UploadReceipt, PdfQaError> {
        let bytes = tokio::fs::read(&doc.path)
            .await
            .map_err(|source| PdfQaError::Io {
                path: doc.path.clone(),
                source,
            })?;

        let part = Part::bytes(bytes)
            .file_name(doc.name.clone())
            .mime_str("application/pdf")
            .map_err(|e| PdfQaError::transport("Upload failed", e))?;
        let form = Form::new().part("file", part);

        info!("Uploading {} ({} bytes) to {}", doc.name, doc.size, self.upload_url);

        let response = self
            .http
            .post(&self.upload_url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| PdfQaError::transport("Upload failed", e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| PdfQaError::transport("Upload failed", e))?;

        if !status.is_success() {
            return Err(PdfQaError::UploadFailed {
                status: status.as_u16(),
                detail: error_detail(status, &body),
            });
        }

        let receipt: UploadReceipt =
            serde_json::from_str(&body).map_err(|e| PdfQaError::UploadFailed {
                status: status.as_u16(),
                detail: format!("unexpected response: {e}"),
            })?;

        info!(
            "Upload processed: {} ({} chunks)",
            receipt.path,
            receipt.chunks.unwrap_or(0)
        );
        Ok(receipt)
    }

    /// Ask a question about an uploaded document.
    ///
    /// Returns as soon as the response headers arrive; the answer itself is
    /// read from the returned stream.
    pub async fn ask(&self, pdf_path: &str, question: &str) -> Result<AnswerStream, PdfQaError> {
        let form = Form::new()
            .text("pdf_path", pdf_path.to_string())
            .text("question", question.to_string());

        debug!("POST {} ({} chars)", self.ask_url, question.len());

        let response = self
            .http
            .post(&self.ask_url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| PdfQaError::transport("Request failed", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PdfQaError::AskFailed {
                status: status.as_u16(),
                detail: error_detail(status, &body),
            });
        }

        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| PdfQaError::StreamInterrupted(e.to_string())));
        Ok(Box::pin(stream))
    }
}

/// Best human-readable message for a failed request.
///
/// Prefers the JSON `detail` (string as-is, anything else serialised), then
/// a non-empty raw body, then the status line.
fn error_detail(status: StatusCode, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        return match parsed.detail {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        };
    }
    let trimmed = body.trim();
    if !trimmed.is_empty() {
        return trimmed.to_string();
    }
    match status.canonical_reason() {
        Some(reason) => format!("HTTP {} {}", status.as_u16(), reason),
        None => format!("HTTP {}", status.as_u16()),
    }
}
