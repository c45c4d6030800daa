//! OCR.space client: multipart POST with a hard time bound.
//!
//! One request per call, no retries. Anything other than a 2xx response
//! with a JSON body comes back as `NetworkError` carrying whatever status
//! and body the service sent, so the failure notification can show them.

use super::types::{OcrApiResponse, RawResponse};
use super::OcrBackend;
use crate::config::OcrConfig;
use crate::encode::EncodedPayload;
use crate::error::PipelineError;
use async_trait::async_trait;

pub struct OcrSpaceClient {
    http: reqwest::Client,
    config: OcrConfig,
}

impl OcrSpaceClient {
    pub fn new(config: OcrConfig) -> Self {
        if config.uses_demo_key() {
            log::warn!("[OCR] Using demo API key, expect rate limiting");
        }
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }
}

fn flag(value: bool) -> String {
    if value { "true" } else { "false" }.to_string()
}

/// Multipart fields in submission order.
pub fn form_fields(payload: &EncodedPayload, config: &OcrConfig) -> Vec<(&'static str, String)> {
    vec![
        ("base64Image", payload.data_uri()),
        ("language", config.language.clone()),
        ("isOverlayRequired", flag(config.overlay_required)),
        ("detectOrientation", flag(config.detect_orientation)),
        ("scale", flag(config.scale)),
        ("OCREngine", config.engine.as_field().to_string()),
        ("isTable", flag(config.is_table)),
    ]
}

fn build_form(payload: &EncodedPayload, config: &OcrConfig) -> reqwest::multipart::Form {
    form_fields(payload, config)
        .into_iter()
        .fold(reqwest::multipart::Form::new(), |form, (name, value)| {
            form.text(name, value)
        })
}

/// First `max` chars of `s`, for logs.
pub(crate) fn preview(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[async_trait]
impl OcrBackend for OcrSpaceClient {
    async fn submit(&self, payload: &EncodedPayload) -> Result<RawResponse, PipelineError> {
        let config = &self.config;
        log::info!(
            "[OCR] Submitting {} base64 chars to {} (engine {}, lang {})",
            payload.data.len(),
            config.endpoint,
            config.engine.as_field(),
            config.language
        );

        let start = std::time::Instant::now();
        let exchange = async {
            let resp = self
                .http
                .post(&config.endpoint)
                .header("apikey", &config.api_key)
                .multipart(build_form(payload, config))
                .send()
                .await
                .map_err(|e| PipelineError::transport(format!("request failed: {}", e)))?;
            let status = resp.status();
            let body = resp.text().await.map_err(|e| PipelineError::NetworkError {
                status: Some(status.as_u16()),
                body: None,
                message: format!("failed to read response body: {}", e),
            })?;
            Ok::<_, PipelineError>((status, body))
        };

        let (status, body) = match tokio::time::timeout(config.timeout, exchange).await {
            Ok(result) => result?,
            Err(_) => {
                log::error!("[OCR] Request timed out after {}ms", config.timeout.as_millis());
                return Err(PipelineError::RequestTimeout(config.timeout));
            }
        };
        let response_time_ms = start.elapsed().as_millis() as u64;
        log::info!("[OCR] HTTP {} in {}ms", status, response_time_ms);

        if !status.is_success() {
            log::error!("[OCR] Service returned {}: {}", status, preview(&body, 200));
            return Err(PipelineError::NetworkError {
                status: Some(status.as_u16()),
                message: format!("OCR service returned {}", status),
                body: Some(body),
            });
        }

        match OcrApiResponse::from_json(&body) {
            Ok(parsed) => Ok(RawResponse {
                body: parsed,
                status: status.as_u16(),
                response_time_ms,
            }),
            Err(e) => {
                log::error!("[OCR] Unparseable body: {}", preview(&body, 200));
                Err(PipelineError::NetworkError {
                    status: Some(status.as_u16()),
                    message: format!("invalid JSON in OCR response: {}", e),
                    body: Some(body),
                })
            }
        }
    }
}
