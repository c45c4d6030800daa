//! Capture-to-text pipeline orchestration.
//!
//! acquire → encode → submit → interpret → cleanup, one run at a time.
//!
//! The orchestrator owns the run state and the UI-facing view and publishes
//! both through watch channels. Every error from acquisition, encoding or
//! submission is turned into a `Failure` outcome here; callers always get a
//! complete `RunReport`. Once an artifact exists it is released exactly once
//! on every exit path.

use crate::capture::{ImageAcquirer, ImageArtifact, ImageLocator, ImageOrigin, ImageSource};
use crate::cleanup::{ArtifactCleanup, ArtifactGuard};
use crate::diag::DiagLog;
use crate::encode::Encoder;
use crate::error::PipelineError;
use crate::ocr::{interpret, interpret_error, DiagnosticTrace, OcrBackend, OcrOutcome};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunState {
    Idle,
    Capturing,
    Encoding,
    Submitting,
    Interpreting,
    CleaningUp,
    Done,
}

/// Fields the surrounding UI renders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanView {
    pub extracted_text: String,
    pub diagnostics: String,
    pub is_processing: bool,
}

/// Terminal value of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub outcome: OcrOutcome,
    pub trace: DiagnosticTrace,
}

impl RunReport {
    fn from_parts((outcome, trace): (OcrOutcome, DiagnosticTrace)) -> Self {
        Self { outcome, trace }
    }

    /// The user backed out during capture; nothing ran.
    pub fn is_cancelled(&self) -> bool {
        matches!(
            self.outcome,
            OcrOutcome::Failure {
                error: PipelineError::AcquisitionCancelled,
                ..
            }
        )
    }
}

pub struct Pipeline {
    acquirer: Arc<dyn ImageAcquirer>,
    encoder: Arc<dyn Encoder>,
    backend: Arc<dyn OcrBackend>,
    cleaner: Arc<dyn ArtifactCleanup>,
    diag: DiagLog,
    state: watch::Sender<RunState>,
    view: watch::Sender<ScanView>,
}

impl Pipeline {
    pub fn new(
        acquirer: Arc<dyn ImageAcquirer>,
        encoder: Arc<dyn Encoder>,
        backend: Arc<dyn OcrBackend>,
        cleaner: Arc<dyn ArtifactCleanup>,
    ) -> Self {
        Self {
            acquirer,
            encoder,
            backend,
            cleaner,
            diag: DiagLog::disabled(),
            state: watch::channel(RunState::Idle).0,
            view: watch::channel(ScanView::default()).0,
        }
    }

    pub fn with_diag_log(mut self, diag: DiagLog) -> Self {
        self.diag = diag;
        self
    }

    pub fn state(&self) -> RunState {
        *self.state.borrow()
    }

    pub fn view(&self) -> ScanView {
        self.view.borrow().clone()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<RunState> {
        self.state.subscribe()
    }

    pub fn subscribe_view(&self) -> watch::Receiver<ScanView> {
        self.view.subscribe()
    }

    /// Inline capture flow. Returns `None` if a run is already active.
    pub async fn trigger(&self, source: ImageSource) -> Option<RunReport> {
        self.run_with(&format!("SCAN: {:?}", source), self.acquirer.acquire(source))
            .await
    }

    /// Navigation hand-off: a photo captured elsewhere, passed by locator.
    ///
    /// The pipeline takes ownership of the locator's target and deletes it
    /// when the run ends. Returns `None` (leaving the target untouched) if a
    /// run is already active.
    pub async fn process_handoff(&self, locator: ImageLocator, origin: ImageOrigin) -> Option<RunReport> {
        let header = format!("HANDOFF: {}", locator);
        self.run_with(&header, async move { Ok(ImageArtifact::new(locator, origin)) })
            .await
    }

    /// Run with a caller-supplied acquisition step.
    ///
    /// `acquire` is only polled once the run has been admitted, so a busy
    /// pipeline leaves whatever it would have produced untouched.
    pub async fn run_with<F>(&self, header: &str, acquire: F) -> Option<RunReport>
    where
        F: Future<Output = Result<ImageArtifact, PipelineError>>,
    {
        let Some(active) = self.begin() else {
            log::warn!("[PIPELINE] {} ignored, run already in progress", header);
            return None;
        };
        self.diag.start(header);
        let report = self.run(acquire.await).await;
        active.complete();
        Some(report)
    }

    /// Idle → Capturing, atomically. `None` if a run is active.
    fn begin(&self) -> Option<ActiveRun<'_>> {
        let admitted = self.state.send_if_modified(|state| {
            if *state == RunState::Idle {
                *state = RunState::Capturing;
                true
            } else {
                false
            }
        });
        admitted.then_some(ActiveRun {
            pipeline: self,
            completed: false,
        })
    }

    fn set_state(&self, next: RunState) {
        log::debug!("[PIPELINE] → {:?}", next);
        self.state.send_replace(next);
    }

    async fn run(&self, acquired: Result<ImageArtifact, PipelineError>) -> RunReport {
        let run_start = Instant::now();

        let artifact = match acquired {
            Ok(artifact) => artifact,
            Err(PipelineError::AcquisitionCancelled) => {
                log::info!("[CAPTURE] Cancelled by user");
                self.diag.write("capture: cancelled");
                self.set_state(RunState::Idle);
                return RunReport::from_parts(interpret_error(PipelineError::AcquisitionCancelled, None));
            }
            Err(error) => {
                log::error!("[CAPTURE] {}", error);
                self.diag.write(&format!("capture: {}", error));
                // No artifact was created, so there is nothing to release.
                self.set_state(RunState::CleaningUp);
                let report = RunReport::from_parts(interpret_error(error, None));
                self.finish(&report, run_start);
                return report;
            }
        };

        log::info!(
            "[CAPTURE] Artifact ready: {} ({:?})",
            artifact.locator(),
            artifact.origin()
        );
        self.diag.write(&format!("capture: {}ms", run_start.elapsed().as_millis()));

        let guard = ArtifactGuard::new(artifact);
        let report = self.process(guard.artifact()).await;

        self.set_state(RunState::CleaningUp);
        guard.release(self.cleaner.as_ref()).await;
        self.diag.write("cleanup: done");

        self.finish(&report, run_start);
        report
    }

    /// Encode, submit and interpret. Never touches the artifact's lifetime.
    async fn process(&self, artifact: &ImageArtifact) -> RunReport {
        self.set_state(RunState::Encoding);
        self.view.send_modify(|view| {
            view.is_processing = true;
            view.extracted_text.clear();
            view.diagnostics.clear();
        });

        let encode_start = Instant::now();
        let payload = match self.encoder.encode(artifact).await {
            Ok(payload) => payload,
            Err(error) => {
                log::error!("[ENCODE] {}", error);
                self.diag.write(&format!("encode: {}", error));
                return RunReport::from_parts(interpret_error(error, None));
            }
        };
        self.diag.write(&format!(
            "encode: {} base64 chars in {}ms",
            payload.data.len(),
            encode_start.elapsed().as_millis()
        ));

        self.set_state(RunState::Submitting);
        let submit_start = Instant::now();
        let submitted = self.backend.submit(&payload).await;
        drop(payload);

        let raw = match submitted {
            Ok(raw) => raw,
            Err(error) => {
                let elapsed = submit_start.elapsed().as_millis() as u64;
                log::error!("[OCR] {} after {}ms", error, elapsed);
                self.diag.write(&format!("submit: {} after {}ms", error, elapsed));
                return RunReport::from_parts(interpret_error(error, Some(elapsed)));
            }
        };
        self.diag.write(&format!("submit: HTTP {} in {}ms", raw.status, raw.response_time_ms));

        self.set_state(RunState::Interpreting);
        RunReport::from_parts(interpret(&raw))
    }

    /// Publish the run's result in one update, then return to Idle.
    fn finish(&self, report: &RunReport, run_start: Instant) {
        self.set_state(RunState::Done);
        self.view.send_replace(ScanView {
            extracted_text: report.outcome.display_text().to_string(),
            diagnostics: report.trace.to_string(),
            is_processing: false,
        });

        let outcome_label = match &report.outcome {
            OcrOutcome::Success(text) => format!("success ({} chars)", text.chars().count()),
            OcrOutcome::Empty => "empty".to_string(),
            OcrOutcome::Failure { error, .. } => format!("failure ({})", error.class()),
        };
        self.diag.write(&format!("outcome: {}", outcome_label));
        self.diag.write(&report.trace.to_string());
        self.diag.write(&format!("total: {}ms", run_start.elapsed().as_millis()));
        log::info!(
            "[PIPELINE] Run complete: {} in {}ms",
            outcome_label,
            run_start.elapsed().as_millis()
        );

        self.set_state(RunState::Idle);
    }
}

/// An admitted run. Dropped before `complete` (cancelled future, panic in a
/// stage) it puts the pipeline back to Idle so later triggers are accepted.
struct ActiveRun<'a> {
    pipeline: &'a Pipeline,
    completed: bool,
}

impl ActiveRun<'_> {
    fn complete(mut self) {
        self.completed = true;
    }
}

impl Drop for ActiveRun<'_> {
    fn drop(&mut self) {
        if self.completed {
            return;
        }
        log::warn!("[PIPELINE] Run abandoned in {:?}, resetting", self.pipeline.state());
        self.pipeline.diag.write("run: abandoned");
        self.pipeline.view.send_modify(|view| view.is_processing = false);
        self.pipeline.state.send_replace(RunState::Idle);
    }
}
