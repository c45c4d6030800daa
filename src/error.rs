//! Error taxonomy for the capture-to-text pipeline.
//!
//! Every failure a run can hit maps onto one of these variants. The
//! orchestrator catches them at its boundary and turns them into a
//! `OcrOutcome::Failure`; nothing here escapes a run.

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    /// Capture capability unavailable (permission, missing device/program, unreadable source).
    #[error("image acquisition denied: {0}")]
    AcquisitionDenied(String),

    /// The user backed out before an image was produced.
    #[error("image acquisition cancelled")]
    AcquisitionCancelled,

    #[error("encoding failed: {0}")]
    EncodingFailed(String),

    #[error("OCR request timed out after {}s", .0.as_secs())]
    RequestTimeout(Duration),

    /// Transport failure or non-2xx response. Status and body are kept
    /// for the failure notification when the service sent them.
    #[error("network error: {message}")]
    NetworkError {
        status: Option<u16>,
        body: Option<String>,
        message: String,
    },

    #[error("interpretation failed: {0}")]
    InterpretationFailure(String),
}

impl PipelineError {
    /// Stable class name shown in the blocking failure notification.
    pub fn class(&self) -> &'static str {
        match self {
            Self::AcquisitionDenied(_) => "AcquisitionDenied",
            Self::AcquisitionCancelled => "AcquisitionCancelled",
            Self::EncodingFailed(_) => "EncodingFailed",
            Self::RequestTimeout(_) => "RequestTimeout",
            Self::NetworkError { .. } => "NetworkError",
            Self::InterpretationFailure(_) => "InterpretationFailure",
        }
    }

    /// Convenience constructor for transport failures with no HTTP response.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::NetworkError {
            status: None,
            body: None,
            message: message.into(),
        }
    }
}
