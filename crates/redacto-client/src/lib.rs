//! HTTP transport for the redaction service
//!
//! Implements [`RedactionService`] over multipart `POST` requests. The
//! endpoint and timeout come from [`ClientConfig`] at construction time;
//! later changes to the global configuration only affect clients built
//! afterwards.

mod http;

pub use http::HttpRedactionClient;

pub use redacto_core::service::RedactionService;
pub use redacto_core::ClientConfig;
