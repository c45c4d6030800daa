//! Image acquisition domain: public API.
//!
//! An acquisition produces exactly one `ImageArtifact`: a transient copy of
//! the photo that the run owns and deletes when it finishes. Sources:
//!   - camera.rs: external capture program writing a JPEG into the capture dir
//!   - gallery.rs: user-picked file, copied (and transcoded to JPEG if needed)
//!   - blob.rs: in-memory blob store used instead of files on the web platform

pub mod blob;
mod camera;
mod gallery;

pub use blob::BlobStore;
pub use camera::CameraCommandAcquirer;
pub use gallery::GalleryImporter;

use crate::config::Platform;
use crate::encode::PAYLOAD_MIME;
use crate::error::PipelineError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Where the caller wants the image to come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSource {
    Camera,
    Gallery,
}

/// How an artifact came to exist. Carried for diagnostics only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageOrigin {
    CameraCapture,
    GalleryImport,
}

/// Platform-local reference to the captured image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageLocator {
    /// Durable file on local disk.
    File(PathBuf),
    /// `blob:` URL registered in a [`BlobStore`].
    Blob(String),
}

impl ImageLocator {
    /// The backing file, if this locator has one.
    pub fn as_path(&self) -> Option<&Path> {
        match self {
            ImageLocator::File(path) => Some(path),
            ImageLocator::Blob(_) => None,
        }
    }
}

impl std::fmt::Display for ImageLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImageLocator::File(path) => write!(f, "{}", path.display()),
            ImageLocator::Blob(url) => f.write_str(url),
        }
    }
}

/// The transient image flowing through one run.
///
/// Deliberately not `Clone`: a run holds the only handle, and handing it to
/// cleanup moves it out of reach of every later step.
#[derive(Debug, PartialEq, Eq)]
pub struct ImageArtifact {
    locator: ImageLocator,
    origin: ImageOrigin,
}

impl ImageArtifact {
    pub fn new(locator: ImageLocator, origin: ImageOrigin) -> Self {
        Self { locator, origin }
    }

    pub fn locator(&self) -> &ImageLocator {
        &self.locator
    }

    pub fn origin(&self) -> ImageOrigin {
        self.origin
    }
}

/// Produces an artifact from a capture source.
#[async_trait]
pub trait ImageAcquirer: Send + Sync {
    async fn acquire(&self, source: ImageSource) -> Result<ImageArtifact, PipelineError>;
}

/// Sends camera requests to one acquirer and gallery requests to another.
pub struct AcquirerRouter {
    camera: Arc<dyn ImageAcquirer>,
    gallery: Arc<dyn ImageAcquirer>,
}

impl AcquirerRouter {
    pub fn new(camera: Arc<dyn ImageAcquirer>, gallery: Arc<dyn ImageAcquirer>) -> Self {
        Self { camera, gallery }
    }
}

#[async_trait]
impl ImageAcquirer for AcquirerRouter {
    async fn acquire(&self, source: ImageSource) -> Result<ImageArtifact, PipelineError> {
        match source {
            ImageSource::Camera => self.camera.acquire(source).await,
            ImageSource::Gallery => self.gallery.acquire(source).await,
        }
    }
}

/// Turn a photo on disk into the locator the platform's encoder reads.
///
/// Native keeps the file. Web moves the bytes into `blobs` and removes the
/// file, leaving the blob as the only copy for cleanup to revoke.
pub async fn stage_file(path: PathBuf, platform: Platform, blobs: &BlobStore) -> Result<ImageLocator, PipelineError> {
    if platform == Platform::Native {
        return Ok(ImageLocator::File(path));
    }

    let read = tokio::fs::read(&path).await;
    if let Err(e) = tokio::fs::remove_file(&path).await {
        log::warn!("[CAPTURE] Could not remove staged {}: {}", path.display(), e);
    }
    let bytes = read.map_err(|e| {
        PipelineError::AcquisitionDenied(format!("cannot read {}: {}", path.display(), e))
    })?;
    let url = blobs.insert(bytes, PAYLOAD_MIME);
    log::debug!("[CAPTURE] Staged {} as {}", path.display(), url);
    Ok(ImageLocator::Blob(url))
}

static TRANSIENT_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Fresh `.jpg` path inside `dir`, unique within this process.
pub(crate) fn transient_path(dir: &Path, prefix: &str) -> PathBuf {
    let stamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    let seq = TRANSIENT_COUNTER.fetch_add(1, Ordering::Relaxed);
    dir.join(format!(
        "{}-{}-{}-{}.jpg",
        prefix,
        std::process::id(),
        stamp,
        seq
    ))
}
