//! Web strategy: fetch the blob, render it as a data URL, keep the body.
//!
//! Mirrors what a browser FileReader does with `readAsDataURL`, so the
//! encoded body is whatever follows the first comma.

use super::{EncodedPayload, Encoder};
use crate::capture::{BlobStore, ImageArtifact, ImageLocator};
use crate::error::PipelineError;
use async_trait::async_trait;
use base64::Engine;

pub struct BlobFetchEncoder {
    blobs: BlobStore,
}

impl BlobFetchEncoder {
    pub fn new(blobs: BlobStore) -> Self {
        Self { blobs }
    }
}

fn to_data_url(mime: &str, bytes: &[u8]) -> String {
    format!(
        "data:{};base64,{}",
        mime,
        base64::engine::general_purpose::STANDARD.encode(bytes)
    )
}

fn strip_data_url_prefix(data_url: &str) -> Option<&str> {
    data_url.split_once(',').map(|(_, body)| body)
}

#[async_trait]
impl Encoder for BlobFetchEncoder {
    async fn encode(&self, artifact: &ImageArtifact) -> Result<EncodedPayload, PipelineError> {
        let url = match artifact.locator() {
            ImageLocator::Blob(url) => url,
            ImageLocator::File(path) => {
                return Err(PipelineError::EncodingFailed(format!(
                    "blob reader cannot open file {}",
                    path.display()
                )))
            }
        };

        let blob = self
            .blobs
            .fetch(url)
            .ok_or_else(|| PipelineError::EncodingFailed(format!("blob {} no longer exists", url)))?;
        let data_url = to_data_url(&blob.mime, &blob.bytes);
        let body = strip_data_url_prefix(&data_url)
            .ok_or_else(|| PipelineError::EncodingFailed("malformed data URL".to_string()))?;

        log::info!("[ENCODE] Blob fetch: {} bytes → {} base64 chars", blob.bytes.len(), body.len());
        Ok(EncodedPayload::new(body.to_string()))
    }
}
