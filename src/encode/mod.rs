//! Encoding domain: artifact bytes → base64 payload.
//!
//! Two strategies, picked once from the platform flag:
//!   - file_read.rs: read the file, base64 the bytes (native)
//!   - blob_fetch.rs: fetch the blob, build a data URL, strip its prefix (web)
//!
//! Both must yield the same string for the same bytes; the pipeline only
//! ever sees the `Encoder` trait.

mod blob_fetch;
mod file_read;

pub use blob_fetch::BlobFetchEncoder;
pub use file_read::FileReadEncoder;

use crate::capture::{BlobStore, ImageArtifact};
use crate::config::Platform;
use crate::error::PipelineError;
use async_trait::async_trait;
use std::sync::Arc;

/// Declared mime type of every payload.
pub const PAYLOAD_MIME: &str = "image/jpeg";

/// Base64 image body ready for submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedPayload {
    pub data: String,
}

impl EncodedPayload {
    pub fn new(data: String) -> Self {
        Self { data }
    }

    pub fn mime_type(&self) -> &'static str {
        PAYLOAD_MIME
    }

    /// `data:image/jpeg;base64,<data>`, the form the OCR service expects.
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", PAYLOAD_MIME, self.data)
    }
}

#[async_trait]
pub trait Encoder: Send + Sync {
    async fn encode(&self, artifact: &ImageArtifact) -> Result<EncodedPayload, PipelineError>;
}

/// Pick the encoding strategy for `platform`.
pub fn encoder_for(platform: Platform, blobs: BlobStore) -> Arc<dyn Encoder> {
    match platform {
        Platform::Native => Arc::new(FileReadEncoder),
        Platform::Web => Arc::new(BlobFetchEncoder::new(blobs)),
    }
}
