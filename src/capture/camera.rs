//! Camera capture via an external capture program.
//!
//! The configured command line is split on whitespace and `{output}` is
//! replaced with a fresh path in the capture directory. If no token holds
//! the placeholder, the path is appended as the last argument. On the web
//! platform the finished file is staged into the blob store.

use super::{stage_file, transient_path, BlobStore, ImageAcquirer, ImageArtifact, ImageOrigin, ImageSource};
use crate::config::Platform;
use crate::error::PipelineError;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

const OUTPUT_PLACEHOLDER: &str = "{output}";

pub struct CameraCommandAcquirer {
    command: String,
    capture_dir: PathBuf,
    platform: Platform,
    blobs: BlobStore,
}

impl CameraCommandAcquirer {
    pub fn new(
        command: impl Into<String>,
        capture_dir: impl Into<PathBuf>,
        platform: Platform,
        blobs: BlobStore,
    ) -> Self {
        Self {
            command: command.into(),
            capture_dir: capture_dir.into(),
            platform,
            blobs,
        }
    }

    fn build_args(&self, output: &Path) -> Vec<String> {
        let output = output.to_string_lossy();
        let mut args: Vec<String> = self
            .command
            .split_whitespace()
            .map(|tok| tok.replace(OUTPUT_PLACEHOLDER, &output))
            .collect();
        if !self.command.contains(OUTPUT_PLACEHOLDER) {
            args.push(output.into_owned());
        }
        args
    }
}

#[async_trait]
impl ImageAcquirer for CameraCommandAcquirer {
    async fn acquire(&self, source: ImageSource) -> Result<ImageArtifact, PipelineError> {
        if source != ImageSource::Camera {
            return Err(PipelineError::AcquisitionDenied(
                "camera acquirer cannot import from the gallery".to_string(),
            ));
        }

        tokio::fs::create_dir_all(&self.capture_dir)
            .await
            .map_err(|e| {
                PipelineError::AcquisitionDenied(format!(
                    "capture dir {} unavailable: {}",
                    self.capture_dir.display(),
                    e
                ))
            })?;

        let output = transient_path(&self.capture_dir, "capture");
        let args = self.build_args(&output);
        let (program, rest) = args
            .split_first()
            .ok_or_else(|| PipelineError::AcquisitionDenied("no capture command configured".to_string()))?;

        log::info!("[CAPTURE] Running {} → {}", program, output.display());
        let status = tokio::process::Command::new(program)
            .args(rest)
            .stdin(std::process::Stdio::null())
            .status()
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => {
                    PipelineError::AcquisitionDenied(format!("capture program '{}' not found", program))
                }
                ErrorKind::PermissionDenied => {
                    PipelineError::AcquisitionDenied(format!("not permitted to run '{}'", program))
                }
                _ => PipelineError::AcquisitionDenied(format!("failed to start '{}': {}", program, e)),
            })?;

        let written = tokio::fs::metadata(&output)
            .await
            .map(|m| m.len() > 0)
            .unwrap_or(false);

        if !status.success() || !written {
            log::info!(
                "[CAPTURE] Capture aborted (status={}, file written={})",
                status,
                written
            );
            // Partial output would otherwise outlive the run.
            let _ = tokio::fs::remove_file(&output).await;
            return Err(PipelineError::AcquisitionCancelled);
        }

        let locator = stage_file(output, self.platform, &self.blobs).await?;
        Ok(ImageArtifact::new(locator, ImageOrigin::CameraCapture))
    }
}
