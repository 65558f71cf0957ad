//! Upload/result state machine.
//!
//! `Idle -> Uploading -> Ready -> Generating -> Complete`. Failures record
//! `last_error`, queue an alert, and land back in `Idle` (upload) or `Ready`
//! (generation) in the same transition, so the page is never left stuck.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use mugshot_core::{GenerationJob, JobStatus, LocalFile, MediaKind, RenderedImage, UploadSession};

/// Resting label of the generate button.
pub const DEFAULT_GENERATE_LABEL: &str = "GENERATE MUGSHOT";
/// Generate button label while the upload runs.
pub const UPLOADING_LABEL: &str = "UPLOADING...";
/// Transient generate button label after success.
pub const COMPLETE_LABEL: &str = "COMPLETE";
/// How long [`COMPLETE_LABEL`] stays before reverting.
pub const COMPLETE_LABEL_HOLD_MS: u64 = 2_000;
/// Loading message right after generate is pressed.
pub const SUBMITTING_MESSAGE: &str = "SUBMITTING JOB...";
/// Loading message once the job is accepted.
pub const QUEUED_MESSAGE: &str = "JOB QUEUED...";
/// Alert shown when generate is pressed without an uploaded file.
pub const NO_UPLOAD_ALERT: &str = "Please upload an image first.";
/// Resting label of the download button.
pub const DOWNLOAD_LABEL: &str = "Download";

/// Workflow phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowState {
    /// Nothing selected.
    Idle,
    /// File selected, upload running.
    Uploading,
    /// Upload finished; generation may start.
    Ready,
    /// Job submitted and being polled.
    Generating,
    /// Result rendered.
    Complete,
}

/// Why a generate request was not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerateRejected {
    /// No uploaded asset yet.
    NoUpload,
    /// Another generation is still running.
    AlreadyInFlight,
}

/// Label and enabled flag of a button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonState {
    /// Visible text.
    pub label: String,
    /// Whether clicks are accepted.
    pub enabled: bool,
}

impl ButtonState {
    fn new(label: &str, enabled: bool) -> Self {
        Self {
            label: label.to_string(),
            enabled,
        }
    }
}

/// Upload drop zone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadZone {
    /// Instructions shown while no file is selected.
    pub content_visible: bool,
    /// Drag-over highlight.
    pub highlighted: bool,
    /// Local preview as a `data:` URL.
    pub preview: Option<String>,
    /// Remove button visibility.
    pub remove_visible: bool,
}

impl Default for UploadZone {
    fn default() -> Self {
        Self {
            content_visible: true,
            highlighted: false,
            preview: None,
            remove_visible: false,
        }
    }
}

/// Loading overlay over the result area.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadingIndicator {
    /// Overlay visibility.
    pub visible: bool,
    /// Status text.
    pub message: String,
}

/// A rendered job result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedResult {
    /// Media URL.
    pub url: String,
    /// Image or video element.
    pub kind: MediaKind,
    /// Decoded pixels, once a renderer has loaded the image.
    pub pixels: Option<RenderedImage>,
}

/// Result area: placeholder, rendered media, and download button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultSurface {
    /// Placeholder shown when nothing is rendered.
    pub placeholder_visible: bool,
    /// Last rendered result.
    pub result: Option<RenderedResult>,
    /// Whether `result` is currently shown.
    pub result_visible: bool,
    /// Download button.
    pub download: ButtonState,
}

impl Default for ResultSurface {
    fn default() -> Self {
        Self {
            placeholder_visible: true,
            result: None,
            result_visible: false,
            download: ButtonState::new(DOWNLOAD_LABEL, false),
        }
    }
}

/// Explicit session object for the whole generator page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowSession {
    state: WorkflowState,
    upload: Option<UploadSession>,
    job: Option<GenerationJob>,
    generation_in_flight: bool,
    complete_label_until_ms: Option<u64>,
    last_error: Option<String>,
    alerts: Vec<String>,
    /// Upload zone view.
    pub upload_zone: UploadZone,
    /// Generate button.
    pub generate: ButtonState,
    /// Loading overlay.
    pub loading: LoadingIndicator,
    /// Result area.
    pub surface: ResultSurface,
}

impl WorkflowSession {
    /// Creates an idle session.
    pub fn new() -> Self {
        Self {
            state: WorkflowState::Idle,
            upload: None,
            job: None,
            generation_in_flight: false,
            complete_label_until_ms: None,
            last_error: None,
            alerts: Vec::new(),
            upload_zone: UploadZone::default(),
            generate: ButtonState::new(DEFAULT_GENERATE_LABEL, false),
            loading: LoadingIndicator::default(),
            surface: ResultSurface::default(),
        }
    }

    /// Current phase.
    pub fn state(&self) -> WorkflowState {
        self.state
    }

    /// Upload session of the selected file.
    pub fn upload(&self) -> Option<&UploadSession> {
        self.upload.as_ref()
    }

    /// Public URL of the uploaded asset.
    pub fn remote_url(&self) -> Option<&str> {
        self.upload.as_ref().and_then(UploadSession::remote_url)
    }

    /// Job being polled, or the last finished one.
    pub fn job(&self) -> Option<&GenerationJob> {
        self.job.as_ref()
    }

    /// `true` between an accepted generate request and its outcome.
    pub fn generation_in_flight(&self) -> bool {
        self.generation_in_flight
    }

    /// Message of the most recent failure.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Drains queued alerts.
    pub fn take_alerts(&mut self) -> Vec<String> {
        std::mem::take(&mut self.alerts)
    }

    /// Queues an interruptive alert.
    pub fn alert(&mut self, message: impl Into<String>) {
        self.alerts.push(message.into());
    }

    /// Drag entered or moved over the drop zone.
    pub fn on_drag_over(&mut self) {
        self.upload_zone.highlighted = true;
    }

    /// Drag left the drop zone.
    pub fn on_drag_leave(&mut self) {
        self.upload_zone.highlighted = false;
    }

    /// A file was picked or dropped. Valid from any state.
    pub fn on_file_selected(&mut self, file: LocalFile) {
        self.reset_result();

        self.upload_zone.highlighted = false;
        self.upload_zone.content_visible = false;
        self.upload_zone.preview = Some(data_url(&file));
        self.generate = ButtonState::new(UPLOADING_LABEL, false);

        self.upload = Some(UploadSession::new(file));
        self.state = WorkflowState::Uploading;
    }

    /// The upload for the current file finished.
    pub fn on_upload_succeeded(&mut self, public_url: impl Into<String>) {
        let Some(upload) = self.upload.as_mut() else {
            return;
        };
        upload.set_remote_url(public_url);

        self.upload_zone.remove_visible = true;
        self.generate = ButtonState::new(DEFAULT_GENERATE_LABEL, true);
        self.state = WorkflowState::Ready;
    }

    /// The upload failed; everything about the selection is discarded.
    ///
    /// Unlike generation failures, which re-enable the generate button, this
    /// leaves it disabled: without an uploaded asset a generate click could
    /// only be rejected.
    pub fn on_upload_failed(&mut self, message: &str) {
        self.reset_upload();
        self.loading.visible = false;
        self.fail(format!("Upload failed: {message}"));
    }

    /// Accepts a generate request and returns the asset URL to submit.
    ///
    /// # Errors
    /// - [`GenerateRejected::AlreadyInFlight`] while a generation runs.
    /// - [`GenerateRejected::NoUpload`] without an uploaded asset; an alert is
    ///   queued.
    pub fn begin_generation(&mut self) -> Result<String, GenerateRejected> {
        if self.generation_in_flight {
            return Err(GenerateRejected::AlreadyInFlight);
        }
        let Some(remote_url) = self.remote_url().map(str::to_string) else {
            self.alert(NO_UPLOAD_ALERT);
            return Err(GenerateRejected::NoUpload);
        };

        self.generation_in_flight = true;
        self.complete_label_until_ms = None;
        self.job = None;
        self.surface.placeholder_visible = false;
        self.surface.result_visible = false;
        self.loading.visible = true;
        self.generate.enabled = false;
        self.set_status(SUBMITTING_MESSAGE);
        self.state = WorkflowState::Generating;

        Ok(remote_url)
    }

    /// The service accepted the job.
    pub fn on_job_submitted(&mut self, job_id: impl Into<String>) {
        self.job = Some(GenerationJob::queued(job_id));
        self.set_status(QUEUED_MESSAGE);
    }

    /// One non-terminal status response arrived.
    pub fn on_poll_progress(&mut self, attempt: u32, status: JobStatus) {
        if let Some(job) = self.job.as_mut() {
            job.apply_status(status);
        }
        self.set_status(&format!("PROCESSING... ({attempt})"));
    }

    /// The job finished with `url`; renders it and starts the transient
    /// complete label.
    pub fn on_generation_complete(&mut self, url: impl Into<String>, now_ms: u64) {
        let url = url.into();
        let kind = MediaKind::from_url(&url);

        if let Some(job) = self.job.as_mut() {
            job.complete(url.clone());
        }

        self.surface.result = Some(RenderedResult {
            url,
            kind,
            pixels: None,
        });
        self.surface.result_visible = true;
        self.surface.placeholder_visible = false;
        self.surface.download = ButtonState::new(DOWNLOAD_LABEL, true);

        self.loading.visible = false;
        self.generate = ButtonState::new(COMPLETE_LABEL, true);
        self.complete_label_until_ms = Some(now_ms.saturating_add(COMPLETE_LABEL_HOLD_MS));
        self.generation_in_flight = false;
        self.state = WorkflowState::Complete;
    }

    /// Submit, poll, or extraction failed.
    pub fn on_generation_failed(&mut self, message: &str) {
        if let Some(job) = self.job.as_mut() {
            job.apply_status(JobStatus::Failed);
        }

        self.loading.visible = false;
        self.generate = ButtonState::new(DEFAULT_GENERATE_LABEL, true);
        self.surface.result_visible = self.surface.result.is_some();
        self.surface.placeholder_visible = self.surface.result.is_none();
        self.generation_in_flight = false;
        self.state = if self.remote_url().is_some() {
            WorkflowState::Ready
        } else {
            WorkflowState::Idle
        };
        self.fail(message.to_string());
    }

    /// Reverts the transient complete label once its hold time has passed.
    pub fn on_tick(&mut self, now_ms: u64) {
        if let Some(until) = self.complete_label_until_ms
            && now_ms >= until
        {
            self.complete_label_until_ms = None;
            if self.generate.label == COMPLETE_LABEL {
                self.generate.label = DEFAULT_GENERATE_LABEL.to_string();
            }
        }
    }

    /// Remove/reset: back to `Idle` with no upload and no result.
    pub fn reset(&mut self) {
        self.reset_upload();
        self.reset_result();
        self.job = None;
        self.complete_label_until_ms = None;
        self.state = WorkflowState::Idle;
    }

    /// Stores decoded pixels for the rendered image at `url`.
    ///
    /// Ignored when `url` is not the current image result.
    pub fn attach_rendered_pixels(&mut self, url: &str, image: RenderedImage) {
        if let Some(result) = self.surface.result.as_mut()
            && result.url == url
            && result.kind == MediaKind::Image
        {
            result.pixels = Some(image);
        }
    }

    /// URL and kind the download button points at, when enabled.
    pub fn download_target(&self) -> Option<(String, MediaKind)> {
        if !self.surface.download.enabled {
            return None;
        }
        self.surface
            .result
            .as_ref()
            .map(|result| (result.url.clone(), result.kind))
    }

    /// Pixels of the visible rendered image, if any.
    pub fn visible_image(&self) -> Option<&RenderedImage> {
        if !self.surface.result_visible {
            return None;
        }
        self.surface
            .result
            .as_ref()
            .filter(|result| result.kind == MediaKind::Image)
            .and_then(|result| result.pixels.as_ref())
    }

    fn set_status(&mut self, message: &str) {
        if !self.generate.enabled {
            self.generate.label = message.to_string();
        }
        if self.loading.visible {
            self.loading.message = message.to_string();
        }
    }

    fn fail(&mut self, message: String) {
        self.last_error = Some(message.clone());
        self.alerts.push(message);
    }

    fn reset_upload(&mut self) {
        self.upload = None;
        self.upload_zone = UploadZone::default();
        self.generate = ButtonState::new(DEFAULT_GENERATE_LABEL, false);
        self.state = WorkflowState::Idle;
    }

    fn reset_result(&mut self) {
        self.surface = ResultSurface::default();
        self.loading.visible = false;
    }
}

impl Default for WorkflowSession {
    fn default() -> Self {
        Self::new()
    }
}

fn data_url(file: &LocalFile) -> String {
    let mime = if file.content_type.trim().is_empty() {
        "application/octet-stream"
    } else {
        file.content_type.as_str()
    };
    format!("data:{mime};base64,{}", STANDARD.encode(&file.bytes))
}
