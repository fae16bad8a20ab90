//! The document an operator selected for sanitization

use std::fmt;
use std::sync::Arc;

/// Content type for every document and artifact handled by the workflow
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Prefix applied to the sanitized download
pub const REDACTED_PREFIX: &str = "REDACTED_";

/// Fallback when no file name is known
pub const DEFAULT_FILE_NAME: &str = "document.pdf";

/// Raw document bytes plus the name they were selected under.
///
/// Bytes are shared, so cloning a `Document` to hand it to the service
/// does not copy the payload.
#[derive(Clone, PartialEq, Eq)]
pub struct Document {
    name: String,
    bytes: Arc<[u8]>,
}

impl Document {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        let bytes: Vec<u8> = bytes.into();
        Self {
            name: name.into(),
            bytes: Arc::from(bytes),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
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

    pub fn content_type(&self) -> &'static str {
        PDF_CONTENT_TYPE
    }
}

// Bytes are omitted so documents never end up in logs.
impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("name", &self.name)
            .field("size_bytes", &self.bytes.len())
            .finish()
    }
}

/// Name offered for the sanitized download
pub fn redacted_file_name(original: Option<&str>) -> String {
    let name = original
        .filter(|n| !n.is_empty())
        .unwrap_or(DEFAULT_FILE_NAME);
    format!("{REDACTED_PREFIX}{name}")
}
