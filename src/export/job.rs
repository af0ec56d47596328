use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;

use crate::encode::profile::{ExportFormat, ExportQuality};

/// Requested export output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, serde::Deserialize)]
pub struct ExportConfig {
    /// Container.
    pub format: ExportFormat,
    /// Quality tier.
    pub quality: ExportQuality,
}

/// Lifecycle of an export job.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportState {
    /// Created, not started.
    Idle,
    /// Validating the profile and waiting for media.
    Preparing,
    /// Rendering and encoding frames.
    Recording,
    /// Stopping the encoder and assembling output.
    Finalizing,
    /// Artifact ready.
    Completed,
    /// Stopped with an [`ExportFailure`].
    Failed,
}

impl ExportState {
    /// Return `true` for `Completed` and `Failed`.
    pub fn is_terminal(self) -> bool {
        matches!(self, ExportState::Completed | ExportState::Failed)
    }
}

/// Why an export job failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum ExportErrorKind {
    /// No encoder profile for the requested format/quality.
    UnsupportedFormat,
    /// Source media did not become ready in time.
    MediaLoadTimeout,
    /// Media stream, audio track or encoder could not be acquired.
    StreamCreation,
    /// Failure while recording or finalizing.
    Encoding,
    /// Stopped by the user.
    Cancelled,
}

impl ExportErrorKind {
    /// `false` for [`ExportErrorKind::Cancelled`], which is not shown as an error.
    pub fn is_error(self) -> bool {
        !matches!(self, ExportErrorKind::Cancelled)
    }
}

impl std::fmt::Display for ExportErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ExportErrorKind::UnsupportedFormat => "unsupported format",
            ExportErrorKind::MediaLoadTimeout => "media load timeout",
            ExportErrorKind::StreamCreation => "stream creation failed",
            ExportErrorKind::Encoding => "encoding failed",
            ExportErrorKind::Cancelled => "cancelled",
        })
    }
}

/// Failure reason preserved on a failed job.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ExportFailure {
    /// Category.
    pub kind: ExportErrorKind,
    /// Human-readable detail.
    pub message: String,
}

impl std::fmt::Display for ExportFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Snapshot of an export job.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ExportJob {
    /// Requested container.
    pub format: ExportFormat,
    /// Requested quality.
    pub quality: ExportQuality,
    /// Current state.
    pub state: ExportState,
    /// Percent complete in `[0, 100]`; 100 only once completed.
    pub progress: f32,
    /// Set when `state == Failed`.
    pub error: Option<ExportFailure>,
}

impl ExportJob {
    /// Idle job for `config`.
    pub fn new(config: ExportConfig) -> Self {
        Self {
            format: config.format,
            quality: config.quality,
            state: ExportState::Idle,
            progress: 0.0,
            error: None,
        }
    }
}

/// Finished export output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportArtifact {
    /// MIME type of the selected profile.
    pub mime: String,
    /// Encoded container bytes.
    pub bytes: Vec<u8>,
    /// Number of frames encoded.
    pub frames: u64,
    /// Media duration covered.
    pub duration_ms: u64,
}

/// Export notifications. Every method defaults to a no-op.
pub trait ExportObserver: Send {
    /// State changed.
    fn on_state(&mut self, _job: &ExportJob) {}
    /// Progress increased.
    fn on_progress(&mut self, _progress: f32) {}
    /// Job completed.
    fn on_completed(&mut self, _artifact: &ExportArtifact) {}
    /// Job failed or was cancelled.
    fn on_failed(&mut self, _failure: &ExportFailure) {}
}

/// Thread-safe cancellation flag shared with a running export.
#[derive(Clone, Debug, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    /// Request cancellation; honoured on the pipeline's next tick.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Return `true` once cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
