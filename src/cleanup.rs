//! Artifact cleanup: the run's guaranteed finalizer.
//!
//! `CleanupManager::cleanup` never reports failure: a transient file that
//! refuses to die is logged, not escalated. `ArtifactGuard` scopes an
//! artifact to its run: `release` hands it to the cleaner exactly once, and
//! a guard dropped without release (panic, cancelled future) still removes
//! the file synchronously so the photo is not left behind.

use crate::capture::{BlobStore, ImageArtifact, ImageLocator};
use async_trait::async_trait;
use std::path::PathBuf;

#[async_trait]
pub trait ArtifactCleanup: Send + Sync {
    /// Destroy the artifact, best-effort. Must not fail visibly.
    async fn cleanup(&self, artifact: ImageArtifact);
}

pub struct CleanupManager {
    blobs: BlobStore,
}

impl CleanupManager {
    pub fn new(blobs: BlobStore) -> Self {
        Self { blobs }
    }
}

#[async_trait]
impl ArtifactCleanup for CleanupManager {
    async fn cleanup(&self, artifact: ImageArtifact) {
        match artifact.locator() {
            ImageLocator::Blob(url) => {
                let was_live = self.blobs.revoke(url);
                log::debug!("[CLEANUP] Released {} (live={})", url, was_live);
            }
            ImageLocator::File(path) => match tokio::fs::try_exists(path).await {
                Ok(true) => match tokio::fs::remove_file(path).await {
                    Ok(()) => log::info!("[CLEANUP] Deleted {}", path.display()),
                    Err(e) => log::warn!("[CLEANUP] Failed to delete {}: {}", path.display(), e),
                },
                Ok(false) => log::debug!("[CLEANUP] {} already gone", path.display()),
                Err(e) => log::warn!("[CLEANUP] Cannot stat {}: {}", path.display(), e),
            },
        }
    }
}

/// Synchronous last-resort removal, disarmed once cleanup has run.
struct DropFallback {
    path: Option<PathBuf>,
}

impl Drop for DropFallback {
    fn drop(&mut self) {
        if let Some(path) = self.path.take() {
            if path.exists() {
                match std::fs::remove_file(&path) {
                    Ok(()) => log::warn!("[CLEANUP] Run aborted, removed {}", path.display()),
                    Err(e) => log::warn!("[CLEANUP] Run aborted, could not remove {}: {}", path.display(), e),
                }
            }
        }
    }
}

/// Scoped ownership of a run's artifact.
pub struct ArtifactGuard {
    artifact: ImageArtifact,
    fallback: DropFallback,
}

impl ArtifactGuard {
    pub fn new(artifact: ImageArtifact) -> Self {
        // Blobs die with their store; only files need the unwind path.
        let path = artifact.locator().as_path().map(PathBuf::from);
        Self {
            artifact,
            fallback: DropFallback { path },
        }
    }

    pub fn artifact(&self) -> &ImageArtifact {
        &self.artifact
    }

    /// Run cleanup. Consumes the guard, so it can happen only once.
    pub async fn release(self, cleaner: &dyn ArtifactCleanup) {
        let ArtifactGuard {
            artifact,
            mut fallback,
        } = self;
        cleaner.cleanup(artifact).await;
        fallback.path = None;
    }
}
