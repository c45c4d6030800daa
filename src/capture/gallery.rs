//! Gallery import.
//!
//! The picked file is never handed to the pipeline directly; cleanup
//! would delete the user's original. Instead its bytes become a fresh
//! transient artifact: a file in the capture dir on native platforms, a
//! blob on the web platform. Non-JPEG images are transcoded so the payload
//! matches the fixed `image/jpeg` type the OCR request declares.

use super::{transient_path, BlobStore, ImageAcquirer, ImageArtifact, ImageLocator, ImageOrigin, ImageSource};
use crate::config::Platform;
use crate::error::PipelineError;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Mutex;

pub struct GalleryImporter {
    platform: Platform,
    capture_dir: PathBuf,
    blobs: BlobStore,
    /// Path chosen in the picker, consumed by the next acquisition.
    selection: Mutex<Option<PathBuf>>,
}

impl GalleryImporter {
    pub fn new(platform: Platform, capture_dir: impl Into<PathBuf>, blobs: BlobStore) -> Self {
        Self {
            platform,
            capture_dir: capture_dir.into(),
            blobs,
            selection: Mutex::new(None),
        }
    }

    /// Record the file the user picked. Replaces any earlier unconsumed pick.
    pub fn select(&self, path: impl Into<PathBuf>) {
        *self.selection.lock().unwrap_or_else(|e| e.into_inner()) = Some(path.into());
    }

    fn take_selection(&self) -> Option<PathBuf> {
        self.selection.lock().unwrap_or_else(|e| e.into_inner()).take()
    }

    /// Copy `path` into a new transient artifact.
    pub async fn import(&self, path: PathBuf) -> Result<ImageArtifact, PipelineError> {
        let bytes = tokio::fs::read(&path).await.map_err(|e| {
            PipelineError::AcquisitionDenied(format!("cannot read {}: {}", path.display(), e))
        })?;
        let original_len = bytes.len();

        let jpeg = tokio::task::spawn_blocking(move || to_jpeg(bytes))
            .await
            .map_err(|e| PipelineError::AcquisitionDenied(format!("transcode task failed: {}", e)))??;
        log::info!(
            "[CAPTURE] Imported {} ({} bytes → {} bytes jpeg)",
            path.display(),
            original_len,
            jpeg.len()
        );

        let locator = match self.platform {
            Platform::Web => ImageLocator::Blob(self.blobs.insert(jpeg, "image/jpeg")),
            Platform::Native => {
                tokio::fs::create_dir_all(&self.capture_dir).await.map_err(|e| {
                    PipelineError::AcquisitionDenied(format!(
                        "capture dir {} unavailable: {}",
                        self.capture_dir.display(),
                        e
                    ))
                })?;
                let dest = transient_path(&self.capture_dir, "import");
                tokio::fs::write(&dest, &jpeg).await.map_err(|e| {
                    PipelineError::AcquisitionDenied(format!("cannot write {}: {}", dest.display(), e))
                })?;
                ImageLocator::File(dest)
            }
        };

        Ok(ImageArtifact::new(locator, ImageOrigin::GalleryImport))
    }
}

#[async_trait]
impl ImageAcquirer for GalleryImporter {
    async fn acquire(&self, source: ImageSource) -> Result<ImageArtifact, PipelineError> {
        if source != ImageSource::Gallery {
            return Err(PipelineError::AcquisitionDenied(
                "gallery importer cannot drive the camera".to_string(),
            ));
        }
        match self.take_selection() {
            Some(path) => self.import(path).await,
            None => Err(PipelineError::AcquisitionCancelled),
        }
    }
}

/// Pass JPEG through untouched, re-encode anything else `image` can decode.
fn to_jpeg(bytes: Vec<u8>) -> Result<Vec<u8>, PipelineError> {
    let format = image::guess_format(&bytes)
        .map_err(|e| PipelineError::AcquisitionDenied(format!("unrecognised image: {}", e)))?;
    if format == image::ImageFormat::Jpeg {
        return Ok(bytes);
    }

    let decoded = image::load_from_memory_with_format(&bytes, format)
        .map_err(|e| PipelineError::AcquisitionDenied(format!("cannot decode {:?}: {}", format, e)))?;
    // JPEG has no alpha channel.
    let rgb = image::DynamicImage::ImageRgb8(decoded.to_rgb8());
    let mut out = Vec::new();
    rgb.write_to(&mut std::io::Cursor::new(&mut out), image::ImageFormat::Jpeg)
        .map_err(|e| PipelineError::AcquisitionDenied(format!("JPEG encode failed: {}", e)))?;
    Ok(out)
}
