//! Native strategy: read the artifact file and base64 it.

use super::{EncodedPayload, Encoder};
use crate::capture::{ImageArtifact, ImageLocator};
use crate::error::PipelineError;
use async_trait::async_trait;
use base64::Engine;

pub struct FileReadEncoder;

#[async_trait]
impl Encoder for FileReadEncoder {
    async fn encode(&self, artifact: &ImageArtifact) -> Result<EncodedPayload, PipelineError> {
        let path = match artifact.locator() {
            ImageLocator::File(path) => path,
            ImageLocator::Blob(url) => {
                return Err(PipelineError::EncodingFailed(format!(
                    "file reader cannot open blob {}",
                    url
                )))
            }
        };

        let start = std::time::Instant::now();
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            PipelineError::EncodingFailed(format!("cannot read {}: {}", path.display(), e))
        })?;
        let data = base64::engine::general_purpose::STANDARD.encode(&bytes);
        log::info!(
            "[ENCODE] File read: {} bytes → {} base64 chars in {}ms",
            bytes.len(),
            data.len(),
            start.elapsed().as_millis()
        );
        Ok(EncodedPayload::new(data))
    }
}
