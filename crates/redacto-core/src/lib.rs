//! Review-and-burn PDF redaction workflow
//!
//! An operator uploads a document, reviews the sensitive spans a remote
//! service detected, approves which ones get redacted, and receives a
//! sanitized, metadata-stripped replacement.
//!
//! - [`workflow::RedactionSession`]: the Upload → Review → Done state machine
//! - [`audit_log::AuditLog`]: ordered detections with per-entry approval
//! - [`artifact::ArtifactManager`]: single-live-reference preview/final documents
//! - [`service::RedactionService`]: the two remote calls (analyze, burn)
//! - [`config`]: process-wide endpoint configuration
//! - [`pdf`]: local PDF validation and metadata inspection

pub mod artifact;
pub mod audit_log;
pub mod config;
pub mod document;
pub mod error;
pub mod pdf;
pub mod service;
pub mod transit;
pub mod workflow;

pub use artifact::{ArtifactBackend, ArtifactHandle, ArtifactManager, ArtifactRole};
pub use audit_log::{AuditLog, Detection, DetectionEntry};
pub use config::{ClientConfig, Theme};
pub use document::{redacted_file_name, Document, PDF_CONTENT_TYPE};
pub use error::{ConfigError, RedactError, ServiceError, WorkflowError};
pub use pdf::PdfInfo;
pub use service::{AnalyzeResponse, BurnResponse, RedactionService, SearchablePayload};
pub use workflow::{Download, RedactionSession, SessionView, Step};
