use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use tracing::{debug, warn};

use redacto_core::config::{self, ClientConfig};
use redacto_core::service::{
    approved_log_json, error_detail, AnalyzeResponse, BurnResponse, RedactionService,
    SearchablePayload, ANALYZE_PATH, APPROVED_LOG_FIELD, BURN_PATH, FILE_FIELD,
};
use redacto_core::{DetectionEntry, Document, ServiceError, PDF_CONTENT_TYPE};

/// Redaction service reached over HTTP
#[derive(Debug, Clone)]
pub struct HttpRedactionClient {
    http: reqwest::Client,
    api_base: String,
}

impl HttpRedactionClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ServiceError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| ServiceError::Transport(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            api_base: config.api_base_trimmed().to_string(),
        })
    }

    /// Build a client from the process-wide configuration
    pub fn from_global() -> Result<Self, ServiceError> {
        Self::new(&config::current())
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    async fn post_form(&self, path: &str, form: Form) -> Result<Vec<u8>, ServiceError> {
        let url = self.url(path);
        debug!(%url, "sending request");

        let response = self
            .http
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(transport_error)?;

        if !status.is_success() {
            let detail = error_detail(&body);
            warn!(%url, status = status.as_u16(), detail = ?detail, "service rejected request");
            return Err(ServiceError::Status {
                status: status.as_u16(),
                detail,
            });
        }

        debug!(%url, size_bytes = body.len(), "response received");
        Ok(body.to_vec())
    }
}

fn transport_error(err: reqwest::Error) -> ServiceError {
    if err.is_timeout() {
        ServiceError::Timeout
    } else {
        ServiceError::Transport(err.to_string())
    }
}

fn pdf_part(bytes: Vec<u8>, file_name: &str) -> Result<Part, ServiceError> {
    Part::bytes(bytes)
        .file_name(file_name.to_string())
        .mime_str(PDF_CONTENT_TYPE)
        .map_err(|e| ServiceError::Transport(e.to_string()))
}

#[async_trait]
impl RedactionService for HttpRedactionClient {
    async fn analyze(&self, document: &Document) -> Result<AnalyzeResponse, ServiceError> {
        let form = Form::new().part(
            FILE_FIELD,
            pdf_part(document.bytes().to_vec(), document.name())?,
        );

        let body = self.post_form(ANALYZE_PATH, form).await?;
        AnalyzeResponse::from_slice(&body)
    }

    async fn burn(
        &self,
        searchable: &SearchablePayload,
        file_name: &str,
        approved: &[DetectionEntry],
    ) -> Result<BurnResponse, ServiceError> {
        let form = Form::new()
            .part(FILE_FIELD, pdf_part(searchable.bytes().to_vec(), file_name)?)
            .text(APPROVED_LOG_FIELD, approved_log_json(approved)?);

        let body = self.post_form(BURN_PATH, form).await?;
        BurnResponse::from_slice(&body)
    }
}
