//! Audit log of detections awaiting operator approval
//!
//! The log is an immutable, ordered sequence. Index is the addressing key,
//! so toggling never removes or reorders entries; it returns a new log.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::RedactError;

/// A detection as reported by the service (no approval state yet)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Detection {
    pub entity_type: String,
    pub text_found: String,
    /// 1-based page number
    pub page: u32,
}

/// A detection plus the operator's approval decision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionEntry {
    pub entity_type: String,
    pub text_found: String,
    pub page: u32,
    pub approved: bool,
}

impl From<Detection> for DetectionEntry {
    fn from(d: Detection) -> Self {
        Self {
            entity_type: d.entity_type,
            text_found: d.text_found,
            page: d.page,
            approved: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditLog {
    entries: Arc<[DetectionEntry]>,
}

impl Default for AuditLog {
    fn default() -> Self {
        Self {
            entries: Arc::from(Vec::new()),
        }
    }
}

impl AuditLog {
    /// Build a log in service order with every entry approved
    pub fn from_detections(detections: Vec<Detection>) -> Self {
        Self {
            entries: detections.into_iter().map(DetectionEntry::from).collect(),
        }
    }

    /// Return a copy of the log with the entry at `index` flipped
    pub fn toggle(&self, index: usize) -> Result<Self, RedactError> {
        if index >= self.entries.len() {
            return Err(RedactError::InvalidIndex {
                index,
                len: self.entries.len(),
            });
        }

        let mut entries = self.entries.to_vec();
        entries[index].approved = !entries[index].approved;
        Ok(Self {
            entries: entries.into(),
        })
    }

    /// Return a copy of the log with every entry set to `approved`
    pub fn set_all(&self, approved: bool) -> Self {
        Self {
            entries: self
                .entries
                .iter()
                .map(|e| DetectionEntry {
                    approved,
                    ..e.clone()
                })
                .collect(),
        }
    }

    /// Approved entries, in log order
    pub fn approved_subset(&self) -> Vec<DetectionEntry> {
        self.entries.iter().filter(|e| e.approved).cloned().collect()
    }

    pub fn approved_count(&self) -> usize {
        self.entries.iter().filter(|e| e.approved).count()
    }

    /// Detection counts per entity type
    pub fn summary_by_type(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for entry in self.entries.iter() {
            *counts.entry(entry.entity_type.clone()).or_insert(0) += 1;
        }
        counts
    }

    pub fn get(&self, index: usize) -> Option<&DetectionEntry> {
        self.entries.get(index)
    }

    pub fn entries(&self) -> &[DetectionEntry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &DetectionEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
