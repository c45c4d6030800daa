//! Result interpretation: raw service response → outcome + diagnostics.
//!
//! Emptiness is judged on the first parsed result's text alone. A per-result
//! error message is recorded in the trace but does not turn a non-empty
//! text into a failure.

use super::client::preview;
use super::types::RawResponse;
use crate::error::PipelineError;
use serde::Serialize;
use std::fmt;

/// Shown instead of text when the service found nothing readable.
pub const EMPTY_GUIDANCE: &str = "No text found in image. Try again with brighter, even lighting, \
hold the camera steady so the text is in focus, and frame the text inside the guide.";

/// Shown instead of text when the run failed.
pub const FAILURE_GUIDANCE: &str = "Failed to extract text from image. Check your connection, \
then try again with good lighting, sharp focus, and the text filling the guide frame.";

/// Structured metadata about a run's OCR call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticTrace {
    pub response_time_ms: Option<u64>,
    pub service_exit_code: Option<i64>,
    pub is_errored_on_processing: Option<bool>,
    pub processing_time_ms: Option<i64>,
    pub per_result_exit_code: Option<i64>,
    pub text_orientation_degrees: Option<i64>,
    pub error_messages: Vec<String>,
}

fn or_na<T: fmt::Display>(value: &Option<T>) -> String {
    value
        .as_ref()
        .map(|v| v.to_string())
        .unwrap_or_else(|| "n/a".to_string())
}

impl fmt::Display for DiagnosticTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Response time: {} ms", or_na(&self.response_time_ms))?;
        writeln!(f, "OCR exit code: {}", or_na(&self.service_exit_code))?;
        writeln!(f, "Errored on processing: {}", or_na(&self.is_errored_on_processing))?;
        writeln!(f, "Processing time: {} ms", or_na(&self.processing_time_ms))?;
        writeln!(f, "Result exit code: {}", or_na(&self.per_result_exit_code))?;
        writeln!(f, "Text orientation: {}°", or_na(&self.text_orientation_degrees))?;
        if self.error_messages.is_empty() {
            write!(f, "Errors: none")
        } else {
            write!(f, "Errors:")?;
            for msg in &self.error_messages {
                write!(f, "\n  - {}", msg)?;
            }
            Ok(())
        }
    }
}

/// Terminal classification of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OcrOutcome {
    /// Extracted text, untrimmed.
    Success(String),
    Empty,
    Failure {
        error: PipelineError,
        diagnostic: String,
    },
}

/// Blocking alert shown for failed runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub title: String,
    pub message: String,
}

impl OcrOutcome {
    pub fn failure(error: PipelineError) -> Self {
        let diagnostic = match &error {
            PipelineError::NetworkError {
                status,
                body,
                message,
            } => {
                let mut out = message.clone();
                if let Some(status) = status {
                    out.push_str(&format!("\nStatus: {}", status));
                }
                if let Some(body) = body.as_deref().filter(|b| !b.is_empty()) {
                    out.push_str(&format!("\nBody: {}", preview(body, 500)));
                }
                out
            }
            other => other.to_string(),
        };
        OcrOutcome::Failure { error, diagnostic }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, OcrOutcome::Success(_))
    }

    /// What the result area shows: the text, or guidance when there is none.
    pub fn display_text(&self) -> &str {
        match self {
            OcrOutcome::Success(text) => text,
            OcrOutcome::Empty => EMPTY_GUIDANCE,
            OcrOutcome::Failure { .. } => FAILURE_GUIDANCE,
        }
    }

    /// Failure alert naming the error class. `None` unless the run failed
    /// for a reason other than the user backing out.
    pub fn notification(&self) -> Option<Notification> {
        match self {
            OcrOutcome::Failure {
                error: PipelineError::AcquisitionCancelled,
                ..
            } => None,
            OcrOutcome::Failure { error, diagnostic } => Some(Notification {
                title: error.class().to_string(),
                message: diagnostic.clone(),
            }),
            _ => None,
        }
    }
}

/// Classify a service response and record its diagnostics.
pub fn interpret(raw: &RawResponse) -> (OcrOutcome, DiagnosticTrace) {
    let body = &raw.body;
    let mut trace = DiagnosticTrace {
        response_time_ms: Some(raw.response_time_ms),
        service_exit_code: body.ocr_exit_code,
        is_errored_on_processing: body.is_errored_on_processing,
        processing_time_ms: body.processing_time_ms,
        error_messages: body.error_messages.clone(),
        ..DiagnosticTrace::default()
    };

    let Some(first) = body.parsed_results.as_deref().and_then(|r| r.first()) else {
        let error = PipelineError::InterpretationFailure("no parsed results".to_string());
        trace.error_messages.push(error.to_string());
        log::warn!("[OCR] Response carried no parsed results");
        return (OcrOutcome::failure(error), trace);
    };

    trace.per_result_exit_code = first.file_parse_exit_code;
    trace.text_orientation_degrees = first.text_orientation;
    for msg in [&first.error_message, &first.error_details] {
        if let Some(msg) = msg.as_deref().filter(|m| !m.trim().is_empty()) {
            trace.error_messages.push(msg.to_string());
        }
    }

    let outcome = match first.parsed_text.as_deref() {
        Some(text) if !text.trim().is_empty() => {
            log::info!("[OCR] Extracted {} chars", text.chars().count());
            OcrOutcome::Success(text.to_string())
        }
        _ => {
            log::info!("[OCR] No text in first parsed result");
            OcrOutcome::Empty
        }
    };
    (outcome, trace)
}

/// Outcome and trace for a run that failed before interpretation.
pub fn interpret_error(error: PipelineError, response_time_ms: Option<u64>) -> (OcrOutcome, DiagnosticTrace) {
    let trace = DiagnosticTrace {
        response_time_ms,
        error_messages: vec![error.to_string()],
        ..DiagnosticTrace::default()
    };
    (OcrOutcome::failure(error), trace)
}
