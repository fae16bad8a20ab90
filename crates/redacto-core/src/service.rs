//! Contract with the remote detection/redaction service
//!
//! The service exposes two single-shot operations:
//!
//! - `POST /analyze-document` with multipart field `file` (raw PDF).
//!   Responds `{ audit_log: [{entity_type, text_found, page}], searchable_base64, preview_base64 }`.
//! - `POST /burn-document` with multipart fields `file` (decoded searchable
//!   PDF) and `approved_log` (JSON array of approved entries).
//!   Responds `{ final_base64 }`.
//!
//! Transport lives in `redacto-client`. Response bodies are validated here,
//! so any shape mismatch becomes a [`ServiceError::MalformedResponse`]
//! instead of leaking into the audit log.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::audit_log::{Detection, DetectionEntry};
use crate::document::Document;
use crate::error::{RedactError, ServiceError};
use crate::transit;

pub const ANALYZE_PATH: &str = "/analyze-document";
pub const BURN_PATH: &str = "/burn-document";

/// Multipart field carrying the document bytes
pub const FILE_FIELD: &str = "file";
/// Multipart field carrying the approved entries as JSON
pub const APPROVED_LOG_FIELD: &str = "approved_log";

/// Intermediate document returned by analyze and required by burn.
///
/// Held decoded and never modified between the two calls.
#[derive(Clone, PartialEq, Eq)]
pub struct SearchablePayload {
    bytes: Arc<[u8]>,
}

impl SearchablePayload {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self {
            bytes: Arc::from(bytes),
        }
    }

    /// Decode the transit form returned by analyze
    pub fn decode(payload: &str) -> Result<Self, RedactError> {
        transit::decode(payload).map(Self::from_bytes)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for SearchablePayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchablePayload")
            .field("size_bytes", &self.bytes.len())
            .finish()
    }
}

/// Validated body of a successful analyze call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    #[serde(rename = "audit_log")]
    pub detections: Vec<Detection>,
    #[serde(rename = "searchable_base64")]
    pub searchable_payload: String,
    #[serde(rename = "preview_base64")]
    pub preview_payload: String,
}

impl AnalyzeResponse {
    pub fn from_slice(body: &[u8]) -> Result<Self, ServiceError> {
        let response: Self = serde_json::from_slice(body)
            .map_err(|e| ServiceError::MalformedResponse(e.to_string()))?;

        if let Some((index, d)) = response
            .detections
            .iter()
            .enumerate()
            .find(|(_, d)| d.page == 0)
        {
            return Err(ServiceError::MalformedResponse(format!(
                "audit_log[{}] ({}) has page 0; pages are 1-based",
                index, d.entity_type
            )));
        }

        Ok(response)
    }
}

/// Validated body of a successful burn call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BurnResponse {
    #[serde(rename = "final_base64")]
    pub final_payload: String,
}

impl BurnResponse {
    pub fn from_slice(body: &[u8]) -> Result<Self, ServiceError> {
        serde_json::from_slice(body).map_err(|e| ServiceError::MalformedResponse(e.to_string()))
    }
}

/// Serialize approved entries for the `approved_log` field
pub fn approved_log_json(entries: &[DetectionEntry]) -> Result<String, ServiceError> {
    serde_json::to_string(entries).map_err(|e| ServiceError::Transport(e.to_string()))
}

/// Pull a human-readable explanation out of an error body.
///
/// Accepts `{"detail": "..."}` and falls back to the JSON rendering when
/// `detail` is structured (validation errors come back as arrays).
pub fn error_detail(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    match value.get("detail")? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::String(_) | Value::Null => None,
        other => Some(other.to_string()),
    }
}

/// The two remote operations the workflow depends on
#[async_trait]
pub trait RedactionService: Send + Sync {
    /// Submit the raw document for PII detection
    async fn analyze(&self, document: &Document) -> Result<AnalyzeResponse, ServiceError>;

    /// Apply `approved` redactions to the searchable document and strip metadata.
    ///
    /// `file_name` is the name the document was uploaded under.
    async fn burn(
        &self,
        searchable: &SearchablePayload,
        file_name: &str,
        approved: &[DetectionEntry],
    ) -> Result<BurnResponse, ServiceError>;
}
