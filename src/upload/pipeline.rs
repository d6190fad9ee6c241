// src/upload/pipeline.rs
//! Five-stage CV upload pipeline.
//!
//! One invocation drives the strict stage sequence
//! store original -> extract text -> convert preview -> persist preview ->
//! expose preview, reporting every externally observable milestone through
//! an observer. Any stage failure aborts the remaining stages.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{info, warn};

use crate::core::backend_client::CvBackend;
use crate::core::storage_client::ObjectStore;
use crate::cv_list::{CvListStore, CvRecord};
use crate::notify::{Notice, Notifier};
use crate::session::SessionContext;
use crate::upload::validate::{validate, SelectedFile, ValidationError};

pub const PROGRESS_STARTED: u8 = 10;
pub const PROGRESS_STORED: u8 = 30;
pub const PROGRESS_EXTRACTED: u8 = 60;
pub const PROGRESS_PREVIEW_SAVED: u8 = 90;
pub const PROGRESS_DONE: u8 = 100;

/// Delay before the progress bar resets so a finished bar is briefly visible.
const RESET_DELAY: Duration = Duration::from_millis(600);

const EXTRACTING_PLACEHOLDER: &str = "Extracting text…";
const FAILURE_PLACEHOLDER: &str = "Upload or extraction failed.";

/// Signed-URL lifetime used when the backend did not return a durable URL.
const ORIGINAL_URL_TTL_SECS: u32 = 600;

/// Phase of one upload session. Transitions are strictly forward; any
/// network failure short-circuits to `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadPhase {
    Idle,
    Uploading,
    Extracting,
    Converting,
    Storing,
    Done,
    Failed,
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Please login to upload your CV.")]
    NotAuthenticated,

    #[error("{0}")]
    InvalidFile(#[from] ValidationError),

    #[error("{message}")]
    Stage { phase: UploadPhase, message: String },
}

impl PipelineError {
    pub fn user_message(&self) -> String {
        self.to_string()
    }
}

/// Cancellation token owned by one pipeline invocation. A superseded
/// invocation stops emitting observer callbacks once cancelled; requests
/// already in flight are not aborted, their results are discarded.
#[derive(Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Milestones observed by the dashboard while an upload runs.
///
/// All methods default to no-ops so observers implement only what they
/// display.
pub trait UploadObserver: Send + Sync {
    fn on_phase(&self, _phase: UploadPhase) {}
    fn on_progress(&self, _percent: u8) {}
    /// A local preview of the freshly selected file, published before any
    /// network call. Supersedes previously stored previews.
    fn on_local_preview(&self, _file: &SelectedFile) {}
    /// Extracted text as it becomes known; `None` clears stale text when a
    /// new upload starts.
    fn on_extracted(&self, _text: Option<&str>) {}
    /// Durable URL for the stored original document.
    fn on_uploaded(&self, _url: &str) {}
    /// Refreshed CV record list after a successful upload.
    fn on_records(&self, _records: &[CvRecord]) {}
    fn on_uploading_changed(&self, _uploading: bool) {}
}

#[derive(Debug, Clone)]
pub struct UploadOutcome {
    pub cv_id: String,
    pub original_pdf_url: Option<String>,
    pub extracted_text: String,
    pub preview_image_path: String,
}

pub struct UploadPipeline {
    backend: Arc<dyn CvBackend>,
    storage: Arc<dyn ObjectStore>,
    cv_list: Arc<CvListStore>,
    notifier: Arc<dyn Notifier>,
}

/// Emits observer callbacks unless the invocation has been cancelled.
struct Emitter {
    observer: Arc<dyn UploadObserver>,
    token: CancelToken,
}

impl Emitter {
    fn emit(&self, f: impl FnOnce(&dyn UploadObserver)) {
        if !self.token.is_cancelled() {
            f(self.observer.as_ref());
        }
    }
}

impl UploadPipeline {
    pub fn new(
        backend: Arc<dyn CvBackend>,
        storage: Arc<dyn ObjectStore>,
        cv_list: Arc<CvListStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            backend,
            storage,
            cv_list,
            notifier,
        }
    }

    /// Run one upload. At most one invocation should be in flight per
    /// trigger; callers disable the trigger while `on_uploading_changed`
    /// reports `true` and cancel the token when superseding an invocation.
    pub async fn run(
        &self,
        session: Option<&SessionContext>,
        file: SelectedFile,
        observer: Arc<dyn UploadObserver>,
        token: &CancelToken,
    ) -> Result<UploadOutcome, PipelineError> {
        let emitter = Emitter {
            observer: Arc::clone(&observer),
            token: token.clone(),
        };

        // The local preview goes up immediately, before auth or validation,
        // so the thumbnail appears without waiting on the network.
        emitter.emit(|o| o.on_local_preview(&file));

        let Some(session) = session else {
            self.notifier.notify(Notice::error(
                "Login required",
                "Please login to upload your CV.",
            ));
            return Err(PipelineError::NotAuthenticated);
        };

        if let Err(e) = validate(&file) {
            self.notifier.notify(Notice::error(e.title(), e.to_string()));
            return Err(e.into());
        }

        emitter.emit(|o| o.on_uploading_changed(true));
        emitter.emit(|o| o.on_phase(UploadPhase::Uploading));
        emitter.emit(|o| o.on_progress(PROGRESS_STARTED));
        // Stale text from a previous upload must never sit next to a new file.
        emitter.emit(|o| o.on_extracted(None));

        let result = self.run_stages(session, &file, &emitter).await;

        match &result {
            Ok(outcome) => {
                info!(
                    "CV upload complete: cv_id={} ({} bytes)",
                    outcome.cv_id,
                    file.size()
                );
                emitter.emit(|o| o.on_phase(UploadPhase::Done));
            }
            Err(e) => {
                warn!("CV upload failed: {}", e);
                emitter.emit(|o| o.on_phase(UploadPhase::Failed));
                self.notifier
                    .notify(Notice::error("Upload failed", e.user_message()));
            }
        }

        emitter.emit(|o| o.on_uploading_changed(false));

        // Reset the bar shortly after finishing so the next upload starts
        // from a clean state.
        let reset_observer = observer;
        let reset_token = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(RESET_DELAY).await;
            if !reset_token.is_cancelled() {
                reset_observer.on_progress(0);
            }
        });

        result
    }

    async fn run_stages(
        &self,
        session: &SessionContext,
        file: &SelectedFile,
        emitter: &Emitter,
    ) -> Result<UploadOutcome, PipelineError> {
        let user_id = session.user_id();
        let access_token = &session.access_token;

        // 1) Store the original PDF.
        let upload = self
            .backend
            .upload_cv(user_id, file)
            .await
            .map_err(|e| PipelineError::Stage {
                phase: UploadPhase::Uploading,
                message: e.user_message(),
            })?;
        emitter.emit(|o| o.on_progress(PROGRESS_STORED));

        // 2) Extract the document text. The placeholder shows up right away
        // and is replaced by the final value.
        emitter.emit(|o| o.on_phase(UploadPhase::Extracting));
        emitter.emit(|o| o.on_extracted(Some(EXTRACTING_PLACEHOLDER)));

        let extracted = match self.backend.extract_text(file).await {
            Ok(response) => response.into_text(),
            Err(e) => {
                let message = e.user_message();
                emitter.emit(|o| o.on_extracted(Some(FAILURE_PLACEHOLDER)));
                return Err(PipelineError::Stage {
                    phase: UploadPhase::Extracting,
                    message,
                });
            }
        };
        emitter.emit(|o| o.on_extracted(Some(extracted.as_str())));
        emitter.emit(|o| o.on_progress(PROGRESS_EXTRACTED));

        // 3) Convert the PDF's first page to a preview image.
        emitter.emit(|o| o.on_phase(UploadPhase::Converting));
        let image_bytes = self
            .backend
            .convert_to_image(file)
            .await
            .map_err(|e| PipelineError::Stage {
                phase: UploadPhase::Converting,
                message: e.user_message(),
            })?;

        // 4) Persist the preview under a deterministic path, overwriting any
        // prior image for this record.
        emitter.emit(|o| o.on_phase(UploadPhase::Storing));
        let preview_image_path = format!("cv_image/{}.jpeg", upload.cv_id);
        self.storage
            .upload(&preview_image_path, image_bytes, "image/jpeg", access_token)
            .await
            .map_err(|e| PipelineError::Stage {
                phase: UploadPhase::Storing,
                message: e.to_string(),
            })?;
        emitter.emit(|o| o.on_progress(PROGRESS_PREVIEW_SAVED));

        // 5) Expose a durable URL for the original and refresh the CV list.
        let original_pdf_url = match upload.original_pdf_url.clone() {
            Some(url) if !url.is_empty() => Some(url),
            _ => {
                match self
                    .storage
                    .signed_url(&upload.pdf_storage_path, ORIGINAL_URL_TTL_SECS, access_token)
                    .await
                {
                    Ok(url) => Some(url),
                    Err(e) => {
                        // The preview URL is decorative at this point; the
                        // upload itself already succeeded.
                        warn!("Signed URL for original failed: {}", e);
                        None
                    }
                }
            }
        };
        if let Some(url) = &original_pdf_url {
            emitter.emit(|o| o.on_uploaded(url));
        }

        let records = self.cv_list.fetch(user_id, access_token).await;
        emitter.emit(|o| o.on_records(&records));
        emitter.emit(|o| o.on_progress(PROGRESS_DONE));

        Ok(UploadOutcome {
            cv_id: upload.cv_id,
            original_pdf_url,
            extracted_text: extracted,
            preview_image_path,
        })
    }
}
