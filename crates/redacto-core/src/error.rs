use thiserror::Error;

use crate::workflow::Step;

/// Failures raised by the pure data components (codec, audit log, artifacts).
#[derive(Error, Debug)]
pub enum RedactError {
    #[error("Failed to decode transit payload: {0}")]
    Decode(String),

    #[error("Detection index {index} out of range (log has {len} entries)")]
    InvalidIndex { index: usize, len: usize },

    #[error("Artifact storage error: {0}")]
    Storage(String),

    #[error("Failed to parse PDF: {0}")]
    Pdf(String),
}

/// Failures reported by the remote detection/redaction service.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// Non-success HTTP status. `detail` carries the server's explanation when
    /// the error body was `{"detail": "..."}`.
    #[error("Service returned status {status}: {}", .detail.as_deref().unwrap_or("no detail"))]
    Status { status: u16, detail: Option<String> },

    #[error("Service request timed out")]
    Timeout,

    #[error("Service transport error: {0}")]
    Transport(String),

    #[error("Malformed service response: {0}")]
    MalformedResponse(String),
}

impl ServiceError {
    /// Server-provided explanation, if any.
    pub fn detail(&self) -> Option<&str> {
        match self {
            ServiceError::Status { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }
}

/// Errors surfaced at the workflow controller boundary.
#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("No document selected")]
    Validation,

    #[error("{operation} is not available in the {state} step")]
    InvalidState { operation: &'static str, state: Step },

    #[error("Another request is already in flight")]
    Busy,

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error(transparent)]
    Redact(#[from] RedactError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}
