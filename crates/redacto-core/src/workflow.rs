//! Stateful redaction session
//!
//! Holds the workflow state in Rust so a front-end only renders snapshots
//! and forwards operator intent. The session moves through three steps:
//!
//! ```text
//! Upload --analyze--> Review --burn--> Done
//!    ^                  |               |
//!    +------reset-------+-------reset---+
//! ```
//!
//! Failed operations never move the session: it stays where it was with its
//! data intact, records a user-facing message, and the operation can be
//! retried. Only one of analyze/burn may be in flight at a time; a second
//! call while one is pending is rejected with [`WorkflowError::Busy`]. The
//! in-flight flag is only checked and set while the state lock is held.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::artifact::{ArtifactHandle, ArtifactManager, ArtifactRole};
use crate::audit_log::{AuditLog, DetectionEntry};
use crate::document::{redacted_file_name, Document, PDF_CONTENT_TYPE};
use crate::error::{RedactError, ServiceError, WorkflowError};
use crate::service::{AnalyzeResponse, BurnResponse, RedactionService, SearchablePayload};

pub const NO_DOCUMENT_MESSAGE: &str = "Select a PDF document first.";
pub const ANALYZE_FAILED_MESSAGE: &str = "Analysis failed. System timeout or large file.";
pub const PREVIEW_FAILED_MESSAGE: &str = "Failed to render PDF preview.";
pub const BURN_FAILED_MESSAGE: &str = "Sanitization failed.";

/// Which screen of the workflow the session is on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Upload,
    Review,
    Done,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Upload => write!(f, "upload"),
            Step::Review => write!(f, "review"),
            Step::Done => write!(f, "done"),
        }
    }
}

enum Stage {
    Upload {
        document: Option<Document>,
    },
    Review {
        document: Document,
        log: AuditLog,
        searchable: SearchablePayload,
    },
    Done {
        document: Document,
        log: AuditLog,
    },
}

impl Stage {
    fn step(&self) -> Step {
        match self {
            Stage::Upload { .. } => Step::Upload,
            Stage::Review { .. } => Step::Review,
            Stage::Done { .. } => Step::Done,
        }
    }

    fn document(&self) -> Option<&Document> {
        match self {
            Stage::Upload { document } => document.as_ref(),
            Stage::Review { document, .. } | Stage::Done { document, .. } => Some(document),
        }
    }

    fn log(&self) -> Option<&AuditLog> {
        match self {
            Stage::Upload { .. } => None,
            Stage::Review { log, .. } | Stage::Done { log, .. } => Some(log),
        }
    }
}

struct SessionState {
    stage: Stage,
    artifacts: ArtifactManager,
    last_error: Option<String>,
}

impl SessionState {
    fn invalid(&self, operation: &'static str) -> WorkflowError {
        WorkflowError::InvalidState {
            operation,
            state: self.stage.step(),
        }
    }
}

/// Read-only view of the session for rendering
#[derive(Debug, Clone)]
pub struct SessionView {
    pub step: Step,
    pub file_name: Option<String>,
    /// Empty in the upload step
    pub log: AuditLog,
    pub busy: bool,
    pub last_error: Option<String>,
    pub artifact: Option<ArtifactHandle>,
}

/// The sanitized document, ready to be saved
#[derive(Debug, Clone)]
pub struct Download {
    pub file_name: String,
    pub content_type: &'static str,
    pub bytes: Arc<[u8]>,
}

/// Marks an analyze/burn call as in flight; clears the flag when dropped,
/// including when the calling future is abandoned mid-request.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Workflow controller for one operator session.
///
/// Cloning yields another handle to the same session.
#[derive(Clone)]
pub struct RedactionSession {
    state: Arc<Mutex<SessionState>>,
    busy: Arc<AtomicBool>,
    service: Arc<dyn RedactionService>,
}

impl RedactionSession {
    /// Create a session that keeps artifacts in memory
    pub fn new(service: Arc<dyn RedactionService>) -> Self {
        Self::with_artifacts(service, ArtifactManager::in_memory())
    }

    pub fn with_artifacts(service: Arc<dyn RedactionService>, artifacts: ArtifactManager) -> Self {
        Self {
            state: Arc::new(Mutex::new(SessionState {
                stage: Stage::Upload { document: None },
                artifacts,
                last_error: None,
            })),
            busy: Arc::new(AtomicBool::new(false)),
            service,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub async fn step(&self) -> Step {
        self.state.lock().await.stage.step()
    }

    pub async fn last_error(&self) -> Option<String> {
        self.state.lock().await.last_error.clone()
    }

    pub async fn snapshot(&self) -> SessionView {
        let state = self.state.lock().await;
        SessionView {
            step: state.stage.step(),
            file_name: state.stage.document().map(|d| d.name().to_string()),
            log: state.stage.log().cloned().unwrap_or_default(),
            busy: self.is_busy(),
            last_error: state.last_error.clone(),
            artifact: state.artifacts.current().cloned(),
        }
    }

    /// Choose the document to analyze, replacing any pending one
    pub async fn select_document(&self, document: Document) -> Result<(), WorkflowError> {
        let mut guard = self.state.lock().await;
        if self.is_busy() {
            return Err(WorkflowError::Busy);
        }
        let state = &mut *guard;
        match &mut state.stage {
            Stage::Upload { document: pending } => {
                info!(file = %document.name(), size_bytes = document.len(), "document selected");
                *pending = Some(document);
                state.last_error = None;
                Ok(())
            }
            _ => Err(state.invalid("select_document")),
        }
    }

    /// Submit the selected document for detection and move to review
    pub async fn analyze(&self) -> Result<(), WorkflowError> {
        let (_in_flight, document) = {
            let mut guard = self.state.lock().await;
            let state = &mut *guard;
            let Some(in_flight) = InFlight::acquire(&self.busy) else {
                warn!("analyze rejected: request already in flight");
                return Err(WorkflowError::Busy);
            };
            match &state.stage {
                Stage::Upload {
                    document: Some(document),
                } => {
                    let document = document.clone();
                    state.last_error = None;
                    (in_flight, document)
                }
                Stage::Upload { document: None } => {
                    state.last_error = Some(NO_DOCUMENT_MESSAGE.to_string());
                    return Err(WorkflowError::Validation);
                }
                _ => return Err(state.invalid("analyze")),
            }
        };

        info!(file = %document.name(), "analyzing document");
        let result = self.service.analyze(&document).await;

        let mut state = self.state.lock().await;
        if state.stage.step() != Step::Upload {
            return Err(state.invalid("analyze"));
        }
        match Self::apply_analysis(&mut state, document, result) {
            Ok(()) => Ok(()),
            Err((message, err)) => {
                warn!(error = %err, "analysis failed");
                state.last_error = Some(message);
                Err(err)
            }
        }
    }

    fn apply_analysis(
        state: &mut SessionState,
        document: Document,
        result: Result<AnalyzeResponse, ServiceError>,
    ) -> Result<(), (String, WorkflowError)> {
        let response = result.map_err(|err| {
            let message = err
                .detail()
                .map(str::to_string)
                .unwrap_or_else(|| ANALYZE_FAILED_MESSAGE.to_string());
            (message, WorkflowError::Service(err))
        })?;

        let searchable = SearchablePayload::decode(&response.searchable_payload)
            .map_err(|err| (ANALYZE_FAILED_MESSAGE.to_string(), WorkflowError::from(err)))?;

        let preview = state
            .artifacts
            .install_encoded(&response.preview_payload, ArtifactRole::Preview)
            .map_err(|err| (PREVIEW_FAILED_MESSAGE.to_string(), WorkflowError::from(err)))?;

        let log = AuditLog::from_detections(response.detections);
        info!(
            detections = log.len(),
            preview_bytes = preview.size_bytes,
            searchable_bytes = searchable.len(),
            "analysis complete, entering review"
        );

        state.stage = Stage::Review {
            document,
            log,
            searchable,
        };
        state.last_error = None;
        Ok(())
    }

    /// Flip the approval flag of the detection at `index`
    pub async fn toggle_approval(&self, index: usize) -> Result<(), WorkflowError> {
        let mut state = self.state.lock().await;
        if self.is_busy() {
            return Err(WorkflowError::Busy);
        }
        let toggled = match &state.stage {
            Stage::Review { log, .. } => log.toggle(index),
            _ => return Err(state.invalid("toggle_approval")),
        };

        match toggled {
            Ok(updated) => {
                if let Stage::Review { log, .. } = &mut state.stage {
                    *log = updated;
                }
                Ok(())
            }
            Err(err) => {
                state.last_error = Some(format!("No detection at position {}.", index + 1));
                Err(err.into())
            }
        }
    }

    /// Approve or reject every detection at once
    pub async fn set_all_approvals(&self, approved: bool) -> Result<(), WorkflowError> {
        let mut guard = self.state.lock().await;
        if self.is_busy() {
            return Err(WorkflowError::Busy);
        }
        let state = &mut *guard;
        match &mut state.stage {
            Stage::Review { log, .. } => {
                *log = log.set_all(approved);
                Ok(())
            }
            _ => Err(state.invalid("set_all_approvals")),
        }
    }

    /// Send the approved subset for permanent redaction and move to done
    pub async fn burn(&self) -> Result<(), WorkflowError> {
        let (_in_flight, searchable, file_name, approved) = {
            let mut guard = self.state.lock().await;
            let state = &mut *guard;
            let Some(in_flight) = InFlight::acquire(&self.busy) else {
                warn!("burn rejected: request already in flight");
                return Err(WorkflowError::Busy);
            };
            match &state.stage {
                Stage::Review {
                    document,
                    log,
                    searchable,
                } => {
                    let request = (
                        in_flight,
                        searchable.clone(),
                        document.name().to_string(),
                        log.approved_subset(),
                    );
                    state.last_error = None;
                    request
                }
                _ => return Err(state.invalid("burn")),
            }
        };

        info!(approved = approved.len(), "burning approved redactions");
        let result = self.service.burn(&searchable, &file_name, &approved).await;

        let mut state = self.state.lock().await;
        if state.stage.step() != Step::Review {
            return Err(state.invalid("burn"));
        }
        match Self::apply_burn(&mut state, result) {
            Ok(()) => Ok(()),
            Err(err) => {
                warn!(error = %err, "burn failed, preview kept");
                state.last_error = Some(BURN_FAILED_MESSAGE.to_string());
                Err(err)
            }
        }
    }

    fn apply_burn(
        state: &mut SessionState,
        result: Result<BurnResponse, ServiceError>,
    ) -> Result<(), WorkflowError> {
        let response = result?;

        match std::mem::replace(&mut state.stage, Stage::Upload { document: None }) {
            Stage::Review {
                document,
                log,
                searchable,
            } => {
                // A payload that fails to decode or store leaves the preview live.
                match state
                    .artifacts
                    .install_encoded(&response.final_payload, ArtifactRole::Final)
                {
                    Ok(handle) => {
                        state.stage = Stage::Done { document, log };
                        state.last_error = None;
                        info!(final_bytes = handle.size_bytes, "burn complete");
                        Ok(())
                    }
                    Err(err) => {
                        state.stage = Stage::Review {
                            document,
                            log,
                            searchable,
                        };
                        Err(err.into())
                    }
                }
            }
            other => {
                state.stage = other;
                Err(state.invalid("burn"))
            }
        }
    }

    /// Discard everything and return to the upload step
    pub async fn reset(&self) -> Result<(), WorkflowError> {
        let mut state = self.state.lock().await;
        if self.is_busy() {
            return Err(WorkflowError::Busy);
        }
        if state.stage.step() == Step::Upload {
            return Err(state.invalid("reset"));
        }

        state.artifacts.release_all();
        state.stage = Stage::Upload { document: None };
        state.last_error = None;
        info!("session reset");
        Ok(())
    }

    /// Current audit log (review and done steps)
    pub async fn audit_log(&self) -> Option<AuditLog> {
        self.state.lock().await.stage.log().cloned()
    }

    /// Entries that would be sent by the next burn
    pub async fn approved_entries(&self) -> Result<Vec<DetectionEntry>, WorkflowError> {
        let state = self.state.lock().await;
        match &state.stage {
            Stage::Review { log, .. } => Ok(log.approved_subset()),
            _ => Err(state.invalid("approved_entries")),
        }
    }

    /// Bytes of the preview artifact, for handing to a viewer
    pub async fn preview_bytes(&self) -> Result<Arc<[u8]>, WorkflowError> {
        let state = self.state.lock().await;
        if state.stage.step() != Step::Review {
            return Err(state.invalid("preview_bytes"));
        }
        Self::live_bytes(&state)
    }

    /// The sanitized document, named `REDACTED_<original name>`
    pub async fn download(&self) -> Result<Download, WorkflowError> {
        let state = self.state.lock().await;
        if state.stage.step() != Step::Done {
            return Err(state.invalid("download"));
        }
        Ok(Download {
            file_name: redacted_file_name(state.stage.document().map(Document::name)),
            content_type: PDF_CONTENT_TYPE,
            bytes: Self::live_bytes(&state)?,
        })
    }

    fn live_bytes(state: &SessionState) -> Result<Arc<[u8]>, WorkflowError> {
        state
            .artifacts
            .read_current()?
            .ok_or_else(|| RedactError::Storage("no artifact installed".to_string()).into())
    }
}

impl fmt::Debug for RedactionSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedactionSession")
            .field("busy", &self.is_busy())
            .finish_non_exhaustive()
    }
}
