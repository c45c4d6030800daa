//! OCR domain: remote recognition via OCR.space.
//!
//!   - client.rs: multipart submission with the 30s bound
//!   - types.rs: response wire types
//!   - interpret.rs: response → outcome + diagnostic trace
//!
//! The orchestrator talks to the service only through `OcrBackend`.

pub mod client;
pub mod interpret;
pub mod types;

pub use client::OcrSpaceClient;
pub use interpret::{interpret, interpret_error, DiagnosticTrace, Notification, OcrOutcome};
pub use types::{OcrApiResponse, ParsedResult, RawResponse};

use crate::encode::EncodedPayload;
use crate::error::PipelineError;
use async_trait::async_trait;

/// Anything that can turn a payload into a service response.
#[async_trait]
pub trait OcrBackend: Send + Sync {
    async fn submit(&self, payload: &EncodedPayload) -> Result<RawResponse, PipelineError>;
}
