//! SnapText: photograph text, OCR it remotely, keep nothing.
//!
//! Module map:
//!   - capture/: image acquisition (camera command, gallery import, blob store)
//!   - encode/: artifact → base64 payload, one strategy per platform
//!   - ocr/: OCR.space client, wire types, result interpretation
//!   - cleanup: guaranteed artifact removal
//!   - pipeline: the orchestrator tying the above together
//!
//! `App::from_config` wires the production pieces; tests build a `Pipeline`
//! directly from their own parts.

pub mod capture;
pub mod cleanup;
pub mod config;
pub mod diag;
pub mod encode;
pub mod error;
pub mod ocr;
pub mod pipeline;

pub use error::PipelineError;
pub use pipeline::{Pipeline, RunReport, RunState, ScanView};

use capture::{AcquirerRouter, BlobStore, CameraCommandAcquirer, GalleryImporter, ImageArtifact, ImageOrigin};
use cleanup::CleanupManager;
use config::{AppConfig, Platform};
use diag::DiagLog;
use ocr::OcrSpaceClient;
use std::path::PathBuf;
use std::sync::Arc;

/// Load env files from the working directory and start logging.
///
/// Call once at process start, before reading configuration.
pub fn init() {
    let cwd = std::env::current_dir().unwrap_or_else(|_| std::path::PathBuf::from("."));
    // Logging is not up yet, so report env loading after init.
    let loaded = config::load_env_files(&cwd);
    let _ = env_logger::try_init();
    match loaded {
        Some(path) => log::info!("[STARTUP] Environment loaded from {}", path.display()),
        None => log::debug!("[STARTUP] No .env.local or .env in {}", cwd.display()),
    }
}

/// Production wiring of the pipeline and the handles the front end needs.
pub struct App {
    pub pipeline: Pipeline,
    /// Where a picker deposits the user's choice before a gallery trigger.
    pub gallery: Arc<GalleryImporter>,
    pub platform: Platform,
    blobs: BlobStore,
}

impl App {
    pub fn from_config(config: AppConfig) -> Self {
        let blobs = BlobStore::new();
        let camera = Arc::new(CameraCommandAcquirer::new(
            config.capture_command.clone(),
            config.capture_dir.clone(),
            config.platform,
            blobs.clone(),
        ));
        let gallery = Arc::new(GalleryImporter::new(
            config.platform,
            config.capture_dir.clone(),
            blobs.clone(),
        ));
        log::info!(
            "[STARTUP] Platform {:?}, captures in {}",
            config.platform,
            config.capture_dir.display()
        );

        let pipeline = Pipeline::new(
            Arc::new(AcquirerRouter::new(camera, gallery.clone())),
            encode::encoder_for(config.platform, blobs.clone()),
            Arc::new(OcrSpaceClient::new(config.ocr)),
            Arc::new(CleanupManager::new(blobs.clone())),
        )
        .with_diag_log(DiagLog::new(config.diag_log));

        Self {
            pipeline,
            gallery,
            platform: config.platform,
            blobs,
        }
    }

    /// Hand off a freshly captured photo at `path`.
    ///
    /// The file belongs to the run from here on: it is staged for the
    /// platform's encoder and deleted when the run ends. A busy pipeline
    /// leaves it untouched.
    pub async fn process_file(&self, path: PathBuf) -> Option<RunReport> {
        let header = format!("HANDOFF: {}", path.display());
        let (platform, blobs) = (self.platform, &self.blobs);
        let staged = async move {
            let locator = capture::stage_file(path, platform, blobs).await?;
            Ok::<_, PipelineError>(ImageArtifact::new(locator, ImageOrigin::CameraCapture))
        };
        self.pipeline.run_with(&header, staged).await
    }
}
