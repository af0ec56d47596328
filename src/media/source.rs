use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::foundation::core::Canvas;
use crate::foundation::error::{CaptionError, CaptionResult};
use crate::render::frame::FrameRGBA;

/// Opaque audio track handle, passed through to the encoder untouched.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AudioTrack {
    /// Media file carrying the track.
    pub path: PathBuf,
    /// Audio stream ordinal inside the file.
    pub stream: u32,
}

/// Facts known once a source is ready.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MediaInfo {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Playback duration.
    pub duration_ms: u64,
    /// Whether an audio stream exists.
    pub has_audio: bool,
}

impl MediaInfo {
    /// Frame dimensions.
    pub fn canvas(&self) -> Canvas {
        Canvas {
            width: self.width,
            height: self.height,
        }
    }
}

/// Readiness of a [`MediaSource`] after `open`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadStatus {
    /// Still loading.
    Pending,
    /// Ready to deliver frames.
    Ready(MediaInfo),
    /// Loading failed.
    Failed(String),
}

/// Source media consumed by the export pipeline.
///
/// `open` must not block; readiness is observed through `poll_ready`, which the pipeline
/// calls once per tick until its deadline.
pub trait MediaSource: Send {
    /// Start loading.
    fn open(&mut self) -> CaptionResult<()>;
    /// Non-blocking readiness check.
    fn poll_ready(&mut self) -> LoadStatus;
    /// Acquire the audio track; `Ok(None)` for silent media.
    fn audio_track(&mut self) -> CaptionResult<Option<AudioTrack>>;
    /// Frame at playback position `t_ms`. Calls use non-decreasing `t_ms`.
    fn frame_at(&mut self, t_ms: u64) -> CaptionResult<FrameRGBA>;
    /// Release processes and buffers. Must be safe to call in any state.
    fn close(&mut self);
}

/// Synthetic source for tests and dry runs.
///
/// Becomes ready after a number of polls, paints a solid frame whose red channel encodes
/// the requested time, and can be scripted to fail.
#[derive(Clone, Debug)]
pub struct ScriptedSource {
    info: MediaInfo,
    polls_until_ready: u32,
    polls: u32,
    fail_open: bool,
    fail_audio: bool,
    load_error: Option<String>,
    opened: bool,
    log: Arc<Mutex<SourceLog>>,
}

/// Calls observed by a [`ScriptedSource`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SourceLog {
    /// Timestamps requested through `frame_at`, in order.
    pub requested: Vec<u64>,
    /// `close` was called.
    pub closed: bool,
}

impl ScriptedSource {
    /// A silent source that is ready on the first poll.
    pub fn new(width: u32, height: u32, duration_ms: u64) -> Self {
        Self {
            info: MediaInfo {
                width,
                height,
                duration_ms,
                has_audio: false,
            },
            polls_until_ready: 0,
            polls: 0,
            fail_open: false,
            fail_audio: false,
            load_error: None,
            opened: false,
            log: Arc::default(),
        }
    }

    /// Shared handle to the call log; stays valid after the source is moved.
    pub fn log(&self) -> Arc<Mutex<SourceLog>> {
        Arc::clone(&self.log)
    }

    /// Report an audio stream.
    pub fn with_audio(mut self) -> Self {
        self.info.has_audio = true;
        self
    }

    /// Stay pending for `polls` calls to `poll_ready`. `u32::MAX` never becomes ready.
    pub fn ready_after(mut self, polls: u32) -> Self {
        self.polls_until_ready = polls;
        self
    }

    /// Make `open` fail.
    pub fn failing_open(mut self) -> Self {
        self.fail_open = true;
        self
    }

    /// Make audio acquisition fail.
    pub fn failing_audio(mut self) -> Self {
        self.fail_audio = true;
        self
    }

    /// Report a load failure instead of becoming ready.
    pub fn failing_load(mut self, msg: impl Into<String>) -> Self {
        self.load_error = Some(msg.into());
        self
    }
}

impl MediaSource for ScriptedSource {
    fn open(&mut self) -> CaptionResult<()> {
        if self.fail_open {
            return Err(CaptionError::media("scripted source refused to open"));
        }
        self.opened = true;
        Ok(())
    }

    fn poll_ready(&mut self) -> LoadStatus {
        if !self.opened {
            return LoadStatus::Failed("source not opened".to_string());
        }
        if let Some(msg) = &self.load_error {
            return LoadStatus::Failed(msg.clone());
        }
        if self.polls < self.polls_until_ready {
            self.polls += 1;
            return LoadStatus::Pending;
        }
        LoadStatus::Ready(self.info)
    }

    fn audio_track(&mut self) -> CaptionResult<Option<AudioTrack>> {
        if self.fail_audio {
            return Err(CaptionError::media("scripted source has no usable audio track"));
        }
        Ok(self.info.has_audio.then(|| AudioTrack {
            path: PathBuf::from("scripted"),
            stream: 0,
        }))
    }

    fn frame_at(&mut self, t_ms: u64) -> CaptionResult<FrameRGBA> {
        if let Ok(mut log) = self.log.lock() {
            log.requested.push(t_ms);
        }
        let shade = (t_ms * 255 / self.info.duration_ms.max(1)).min(255) as u8;
        Ok(FrameRGBA::solid(self.info.canvas(), [shade, 0, 0, 255]))
    }

    fn close(&mut self) {
        if let Ok(mut log) = self.log.lock() {
            log.closed = true;
        }
        self.opened = false;
    }
}
