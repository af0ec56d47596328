use std::sync::Arc;

use crate::encode::profile::{EncoderCaps, EncoderProfile, select_profile};
use crate::encode::sink::{EncoderConfig, EncoderSink};
use crate::export::job::{
    CancelHandle, ExportArtifact, ExportConfig, ExportErrorKind, ExportFailure, ExportJob,
    ExportObserver, ExportState,
};
use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{CaptionError, CaptionResult};
use crate::media::source::{LoadStatus, MediaInfo, MediaSource};
use crate::render::caption::{FrameRenderer, RenderSettings};
use crate::render::frame::FrameRGBA;
use crate::render::text::FontBook;
use crate::theme::resolve::ResolvedStyle;
use crate::timeline::clock::{PlaybackClock, RealtimePlayback, Ticker};
use crate::timeline::scheduler::ActiveChunks;
use crate::transcript::store::UtteranceStore;

/// Default bound on the wait for source media to become ready.
pub const DEFAULT_READY_TIMEOUT_MS: u64 = 5_000;

/// Export loop parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExportSettings {
    /// Output frame rate; frames are rendered at exact `k / fps` instants.
    pub fps: Fps,
    /// Deadline for the source to report ready, measured from `start`.
    pub ready_timeout_ms: u64,
    /// Straight RGBA8 background used to flatten alpha before encoding.
    pub bg_rgba: [u8; 4],
    /// Caption placement.
    pub render: RenderSettings,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            fps: Fps::default(),
            ready_timeout_ms: DEFAULT_READY_TIMEOUT_MS,
            bg_rgba: [0, 0, 0, 255],
            render: RenderSettings::default(),
        }
    }
}

/// Everything an export needs besides its media source and encoder sink.
///
/// The store is a snapshot: edits made to the live store after the export starts do not
/// reach it.
#[derive(Clone, Debug)]
pub struct ExportRequest {
    /// Requested format and quality.
    pub config: ExportConfig,
    /// Loop parameters.
    pub settings: ExportSettings,
    /// Transcript snapshot.
    pub store: UtteranceStore,
    /// Style to burn in.
    pub style: Arc<ResolvedStyle>,
    /// Fonts for caption text.
    pub fonts: Arc<FontBook>,
}

/// Tick-driven burn-in export.
///
/// Call [`ExportPipeline::start`] once, then [`ExportPipeline::tick`] from the host's tick
/// source until the job is terminal. The pipeline owns its own playback clock, renderer and
/// surface; it never touches live-preview state.
pub struct ExportPipeline {
    job: ExportJob,
    settings: ExportSettings,
    store: UtteranceStore,
    style: Arc<ResolvedStyle>,
    renderer: FrameRenderer,
    source: Box<dyn MediaSource>,
    sink: Box<dyn EncoderSink>,
    observers: Vec<Box<dyn ExportObserver>>,
    cancel: CancelHandle,
    profile: Option<EncoderProfile>,
    ready_deadline_ms: u64,
    info: Option<MediaInfo>,
    playback: Option<RealtimePlayback>,
    next_frame: u64,
    surface: Option<FrameRGBA>,
    chunks: Vec<Vec<u8>>,
    artifact: Option<ExportArtifact>,
}

impl std::fmt::Debug for ExportPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportPipeline")
            .field("job", &self.job)
            .field("settings", &self.settings)
            .field("next_frame", &self.next_frame)
            .field("observers", &self.observers.len())
            .finish_non_exhaustive()
    }
}

impl ExportPipeline {
    /// Create an idle pipeline.
    pub fn new(
        request: ExportRequest,
        source: Box<dyn MediaSource>,
        sink: Box<dyn EncoderSink>,
    ) -> Self {
        let renderer = FrameRenderer::new(request.fonts, request.settings.render);
        Self {
            job: ExportJob::new(request.config),
            settings: request.settings,
            store: request.store,
            style: request.style,
            renderer,
            source,
            sink,
            observers: Vec::new(),
            cancel: CancelHandle::default(),
            profile: None,
            ready_deadline_ms: 0,
            info: None,
            playback: None,
            next_frame: 0,
            surface: None,
            chunks: Vec::new(),
            artifact: None,
        }
    }

    /// Register an observer for state, progress and completion notifications.
    pub fn observe(&mut self, observer: Box<dyn ExportObserver>) {
        self.observers.push(observer);
    }

    /// Handle that cancels this export from another thread.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Current job snapshot.
    pub fn job(&self) -> &ExportJob {
        &self.job
    }

    /// Encoder profile chosen in `Preparing`.
    pub fn profile(&self) -> Option<EncoderProfile> {
        self.profile
    }

    /// Finished artifact, once completed.
    pub fn artifact(&self) -> Option<&ExportArtifact> {
        self.artifact.as_ref()
    }

    /// Take the finished artifact out of the pipeline.
    pub fn take_artifact(&mut self) -> Option<ExportArtifact> {
        self.artifact.take()
    }

    /// Leave `Idle`: pick an encoder profile and start loading the source.
    pub fn start(&mut self, caps: &dyn EncoderCaps, now_ms: u64) -> ExportState {
        if self.job.state != ExportState::Idle {
            return self.job.state;
        }
        self.set_state(ExportState::Preparing);

        let (format, quality) = (self.job.format, self.job.quality);
        let Some(profile) = select_profile(caps, format, quality) else {
            self.fail(
                ExportErrorKind::UnsupportedFormat,
                format!("no encoder available for {format} at {quality} quality"),
            );
            return self.job.state;
        };
        tracing::debug!(mime = %profile.codec.mime(), "export profile selected");
        self.profile = Some(profile);

        if let Err(e) = self.source.open() {
            self.fail(
                ExportErrorKind::StreamCreation,
                format!("could not open source media: {e}"),
            );
            return self.job.state;
        }
        self.ready_deadline_ms = now_ms.saturating_add(self.settings.ready_timeout_ms);
        self.job.state
    }

    /// Advance the state machine to host time `now_ms`.
    pub fn tick(&mut self, now_ms: u64) -> ExportState {
        if self.cancel.is_cancelled() {
            self.cancel();
            return self.job.state;
        }
        match self.job.state {
            ExportState::Preparing => self.poll_source(now_ms),
            ExportState::Recording => self.record(now_ms),
            _ => {}
        }
        self.job.state
    }

    /// Stop immediately and tear everything down. No-op once finalizing or terminal.
    pub fn cancel(&mut self) {
        if matches!(
            self.job.state,
            ExportState::Idle | ExportState::Preparing | ExportState::Recording
        ) {
            self.fail(ExportErrorKind::Cancelled, "export cancelled".to_string());
        }
    }

    /// Drive the job to a terminal state with `ticker`, one frame interval per tick.
    pub fn run<T: Ticker>(&mut self, caps: &dyn EncoderCaps, ticker: &mut T) -> &ExportJob {
        let interval = (self.settings.fps.frame_duration_ms().floor() as u64).max(1);
        self.start(caps, ticker.now_ms());
        while !self.job.state.is_terminal() {
            ticker.schedule_next(interval);
            self.tick(ticker.now_ms());
        }
        &self.job
    }

    fn poll_source(&mut self, now_ms: u64) {
        match self.source.poll_ready() {
            LoadStatus::Pending => {
                if now_ms >= self.ready_deadline_ms {
                    self.fail(
                        ExportErrorKind::MediaLoadTimeout,
                        format!(
                            "source media was not ready after {} ms; check that the file plays and try again",
                            self.settings.ready_timeout_ms
                        ),
                    );
                }
            }
            LoadStatus::Failed(msg) => self.fail(
                ExportErrorKind::StreamCreation,
                format!("source media failed to load: {msg}"),
            ),
            LoadStatus::Ready(info) => match self.begin_recording(info, now_ms) {
                Ok(()) => self.record(now_ms),
                Err(e) => self.fail(ExportErrorKind::StreamCreation, e.to_string()),
            },
        }
    }

    fn begin_recording(&mut self, info: MediaInfo, now_ms: u64) -> CaptionResult<()> {
        if info.duration_ms == 0 {
            return Err(CaptionError::media("source media has zero duration"));
        }
        let profile = self
            .profile
            .ok_or_else(|| CaptionError::media("no encoder profile selected"))?;
        let audio = self.source.audio_track()?;
        self.sink.begin(EncoderConfig {
            width: info.width,
            height: info.height,
            fps: self.settings.fps,
            profile,
            audio,
            bg_rgba: self.settings.bg_rgba,
        })?;
        tracing::info!(
            width = info.width,
            height = info.height,
            duration_ms = info.duration_ms,
            "export recording"
        );
        self.surface = Some(FrameRGBA::transparent(info.canvas()));
        self.playback = Some(RealtimePlayback::start(now_ms, info.duration_ms));
        self.info = Some(info);
        self.next_frame = 0;
        self.set_state(ExportState::Recording);
        Ok(())
    }

    fn record(&mut self, now_ms: u64) {
        let Some(mut playback) = self.playback else {
            return;
        };
        playback.sync(now_ms);
        self.playback = Some(playback);

        let t = playback.current_time_ms();
        let duration = playback.duration_ms();
        if let Err(e) = self.encode_until(t, duration) {
            self.fail(
                ExportErrorKind::Encoding,
                format!("encoding failed near {t} ms: {e}"),
            );
            return;
        }

        let progress = (100.0 * t as f64 / duration as f64).min(99.0) as f32;
        self.bump_progress(progress);

        if playback.ended() {
            self.finalize(duration);
        }
    }

    /// Render and push every frame whose instant lies in `[next, t]` and before `duration`.
    #[tracing::instrument(skip(self), fields(from = self.next_frame))]
    fn encode_until(&mut self, t: u64, duration: u64) -> CaptionResult<()> {
        let surface = self
            .surface
            .as_mut()
            .ok_or_else(|| CaptionError::render("export surface missing"))?;
        loop {
            let frame_ms = self.settings.fps.frame_to_ms(FrameIndex(self.next_frame));
            if frame_ms >= duration as f64 || frame_ms > t as f64 {
                break;
            }
            let at = frame_ms.round() as u64;
            let active = ActiveChunks::compute(&self.store, at);
            let source = self.source.frame_at(at)?;
            self.renderer
                .render_into(surface, Some(&source), &active.chunks, at, &self.style)?;
            self.sink.push_frame(FrameIndex(self.next_frame), surface)?;
            self.next_frame += 1;
        }
        self.chunks.extend(self.sink.take_chunks()?);
        Ok(())
    }

    fn finalize(&mut self, duration_ms: u64) {
        self.set_state(ExportState::Finalizing);
        let rest = match self.sink.finish() {
            Ok(rest) => rest,
            Err(e) => {
                self.fail(
                    ExportErrorKind::Encoding,
                    format!("encoder failed to finalize: {e}"),
                );
                return;
            }
        };
        self.chunks.extend(rest);
        self.source.close();
        self.surface = None;
        self.playback = None;

        let mime = self
            .profile
            .map(|p| p.codec.mime())
            .unwrap_or_else(|| self.job.format.mime().to_string());
        let artifact = ExportArtifact {
            mime,
            bytes: std::mem::take(&mut self.chunks).concat(),
            frames: self.next_frame,
            duration_ms,
        };
        tracing::info!(
            frames = artifact.frames,
            bytes = artifact.bytes.len(),
            "export completed"
        );

        self.job.progress = 100.0;
        self.set_state(ExportState::Completed);
        for o in &mut self.observers {
            o.on_progress(100.0);
            o.on_completed(&artifact);
        }
        self.artifact = Some(artifact);
    }

    fn bump_progress(&mut self, progress: f32) {
        if progress <= self.job.progress {
            return;
        }
        self.job.progress = progress;
        for o in &mut self.observers {
            o.on_progress(progress);
        }
    }

    fn set_state(&mut self, state: ExportState) {
        if self.job.state == state {
            return;
        }
        tracing::debug!(from = ?self.job.state, to = ?state, "export state");
        self.job.state = state;
        for o in &mut self.observers {
            o.on_state(&self.job);
        }
    }

    fn fail(&mut self, kind: ExportErrorKind, message: String) {
        self.sink.abort();
        self.source.close();
        self.chunks.clear();
        self.surface = None;
        self.playback = None;

        if kind.is_error() {
            tracing::warn!(kind = %kind, %message, "export failed");
        } else {
            tracing::info!("export cancelled");
        }
        let failure = ExportFailure { kind, message };
        self.job.error = Some(failure.clone());
        self.set_state(ExportState::Failed);
        for o in &mut self.observers {
            o.on_failed(&failure);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/export/pipeline.rs"]
mod tests;
