//! Shared helpers for workflow tests

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use redacto_core::artifact::{ArtifactBackend, ArtifactId, ArtifactRole, MemoryBackend};
use redacto_core::service::{AnalyzeResponse, BurnResponse, RedactionService, SearchablePayload};
use redacto_core::{transit, Detection, DetectionEntry, Document, RedactError, ServiceError};

pub const PREVIEW_BYTES: &[u8] = b"%PDF-1.7 preview with markers";
pub const SEARCHABLE_BYTES: &[u8] = b"%PDF-1.7 searchable layer";
pub const FINAL_BYTES: &[u8] = b"%PDF-1.7 scrubbed";

/// One recorded burn request
#[derive(Debug, Clone)]
pub struct BurnCall {
    pub searchable: Vec<u8>,
    pub file_name: String,
    pub approved: Vec<DetectionEntry>,
}

/// Scripted service: replies are queued up front and consumed in order
#[derive(Default)]
pub struct StubService {
    analyze_replies: Mutex<VecDeque<Result<AnalyzeResponse, ServiceError>>>,
    burn_replies: Mutex<VecDeque<Result<BurnResponse, ServiceError>>>,
    analyze_calls: Mutex<Vec<String>>,
    burn_calls: Mutex<Vec<BurnCall>>,
    gate: Option<Arc<Notify>>,
}

impl StubService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold every call until the gate is notified
    pub fn gated(gate: Arc<Notify>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::default()
        }
    }

    pub fn on_analyze(self, reply: Result<AnalyzeResponse, ServiceError>) -> Self {
        self.analyze_replies.lock().unwrap().push_back(reply);
        self
    }

    pub fn on_burn(self, reply: Result<BurnResponse, ServiceError>) -> Self {
        self.burn_replies.lock().unwrap().push_back(reply);
        self
    }

    pub fn analyze_calls(&self) -> Vec<String> {
        self.analyze_calls.lock().unwrap().clone()
    }

    pub fn burn_calls(&self) -> Vec<BurnCall> {
        self.burn_calls.lock().unwrap().clone()
    }

    async fn wait_for_gate(&self) {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
    }
}

#[async_trait]
impl RedactionService for StubService {
    async fn analyze(&self, document: &Document) -> Result<AnalyzeResponse, ServiceError> {
        self.analyze_calls
            .lock()
            .unwrap()
            .push(document.name().to_string());
        self.wait_for_gate().await;
        self.analyze_replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ServiceError::Transport("no scripted reply".to_string())))
    }

    async fn burn(
        &self,
        searchable: &SearchablePayload,
        file_name: &str,
        approved: &[DetectionEntry],
    ) -> Result<BurnResponse, ServiceError> {
        self.burn_calls.lock().unwrap().push(BurnCall {
            searchable: searchable.bytes().to_vec(),
            file_name: file_name.to_string(),
            approved: approved.to_vec(),
        });
        self.wait_for_gate().await;
        self.burn_replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ServiceError::Transport("no scripted reply".to_string())))
    }
}

pub fn detections(count: usize) -> Vec<Detection> {
    const TYPES: [&str; 4] = ["PERSON", "EMAIL_ADDRESS", "PHONE_NUMBER", "US_SSN"];
    (0..count)
        .map(|i| Detection {
            entity_type: TYPES[i % TYPES.len()].to_string(),
            text_found: format!("match-{}", i),
            page: (i / 3) as u32 + 1,
        })
        .collect()
}

pub fn analyze_ok(count: usize) -> Result<AnalyzeResponse, ServiceError> {
    Ok(AnalyzeResponse {
        detections: detections(count),
        searchable_payload: transit::encode(SEARCHABLE_BYTES),
        preview_payload: format!("data:application/pdf;base64,{}", transit::encode(PREVIEW_BYTES)),
    })
}

pub fn burn_ok() -> Result<BurnResponse, ServiceError> {
    Ok(BurnResponse {
        final_payload: transit::encode(FINAL_BYTES),
    })
}

pub fn status_error(status: u16, detail: Option<&str>) -> ServiceError {
    ServiceError::Status {
        status,
        detail: detail.map(str::to_string),
    }
}

pub fn document(name: &str) -> Document {
    Document::new(name, b"%PDF-1.7 original with PII".to_vec())
}

/// In-memory artifact storage whose writes fail while the switch is on
#[derive(Default)]
pub struct FlakyBackend {
    inner: MemoryBackend,
    pub fail_writes: Arc<AtomicBool>,
}

impl ArtifactBackend for FlakyBackend {
    fn create(
        &mut self,
        id: ArtifactId,
        role: ArtifactRole,
        bytes: Vec<u8>,
    ) -> Result<String, RedactError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(RedactError::Storage("disk full".to_string()));
        }
        self.inner.create(id, role, bytes)
    }

    fn release(&mut self, id: ArtifactId) -> bool {
        self.inner.release(id)
    }

    fn read(&self, id: ArtifactId) -> Result<Arc<[u8]>, RedactError> {
        self.inner.read(id)
    }

    fn live_count(&self) -> usize {
        self.inner.live_count()
    }
}
