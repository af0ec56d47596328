use std::sync::{Arc, Mutex};

use crate::encode::profile::EncoderProfile;
use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{CaptionError, CaptionResult};
use crate::media::source::AudioTrack;
use crate::render::frame::FrameRGBA;

/// Configuration handed to an [`EncoderSink`] before the first frame.
#[derive(Debug, Clone)]
pub struct EncoderConfig {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Output frame rate.
    pub fps: Fps,
    /// Selected container/codec/bitrate profile.
    pub profile: EncoderProfile,
    /// Audio to mux untouched, if the source has any.
    pub audio: Option<AudioTrack>,
    /// Background used to flatten alpha (straight RGBA8).
    pub bg_rgba: [u8; 4],
}

/// Sink contract for painted export frames.
///
/// `push_frame` is called in strictly increasing `FrameIndex` order. Encoded data becomes
/// available incrementally through `take_chunks`; `finish` returns whatever remains.
pub trait EncoderSink: Send {
    /// Start encoding.
    fn begin(&mut self, cfg: EncoderConfig) -> CaptionResult<()>;
    /// Encode one frame.
    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> CaptionResult<()>;
    /// Drain encoded chunks produced so far.
    fn take_chunks(&mut self) -> CaptionResult<Vec<Vec<u8>>>;
    /// Stop encoding and return the remaining chunks.
    fn finish(&mut self) -> CaptionResult<Vec<Vec<u8>>>;
    /// Tear down without producing output. Must be safe to call in any state.
    fn abort(&mut self);
}

/// What an [`InMemorySink`] has seen.
#[derive(Debug, Default)]
pub struct InMemoryRecord {
    /// Config captured by `begin`.
    pub config: Option<EncoderConfig>,
    /// Frames in push order.
    pub frames: Vec<(FrameIndex, FrameRGBA)>,
    /// `finish` completed.
    pub finished: bool,
    /// `abort` was called.
    pub aborted: bool,
}

/// In-memory sink for tests and debugging.
///
/// Each pushed frame becomes one chunk holding the little-endian frame index. Failures can
/// be scripted for `begin` or for the n-th frame.
#[derive(Debug, Default)]
pub struct InMemorySink {
    record: Arc<Mutex<InMemoryRecord>>,
    pending: Vec<Vec<u8>>,
    fail_begin: bool,
    fail_at_frame: Option<usize>,
    started: bool,
}

impl InMemorySink {
    /// Create a sink that accepts everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `begin` fail.
    pub fn failing_begin(mut self) -> Self {
        self.fail_begin = true;
        self
    }

    /// Make the `n`-th pushed frame (0-based) fail.
    pub fn failing_at_frame(mut self, n: usize) -> Self {
        self.fail_at_frame = Some(n);
        self
    }

    /// Shared handle to the recorded state; stays valid after the sink is moved.
    pub fn record(&self) -> Arc<Mutex<InMemoryRecord>> {
        Arc::clone(&self.record)
    }

    fn with_record<R>(&self, f: impl FnOnce(&mut InMemoryRecord) -> R) -> CaptionResult<R> {
        let mut guard = self
            .record
            .lock()
            .map_err(|_| CaptionError::media("in-memory sink record poisoned"))?;
        Ok(f(&mut guard))
    }
}

impl EncoderSink for InMemorySink {
    fn begin(&mut self, cfg: EncoderConfig) -> CaptionResult<()> {
        if self.fail_begin {
            return Err(CaptionError::media("in-memory sink refused to start"));
        }
        self.with_record(|r| {
            r.config = Some(cfg);
            r.frames.clear();
        })?;
        self.started = true;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> CaptionResult<()> {
        if !self.started {
            return Err(CaptionError::media("in-memory sink not started"));
        }
        let n = self.with_record(|r| {
            if let Some((last, _)) = r.frames.last()
                && idx.0 <= last.0
            {
                return Err(CaptionError::media(
                    "in-memory sink received out-of-order frame index",
                ));
            }
            Ok(r.frames.len())
        })??;
        if self.fail_at_frame == Some(n) {
            return Err(CaptionError::media(format!("scripted failure at frame {n}")));
        }
        self.with_record(|r| r.frames.push((idx, frame.clone())))?;
        self.pending.push(idx.0.to_le_bytes().to_vec());
        Ok(())
    }

    fn take_chunks(&mut self) -> CaptionResult<Vec<Vec<u8>>> {
        Ok(std::mem::take(&mut self.pending))
    }

    fn finish(&mut self) -> CaptionResult<Vec<Vec<u8>>> {
        if !self.started {
            return Err(CaptionError::media("in-memory sink not started"));
        }
        self.started = false;
        self.with_record(|r| r.finished = true)?;
        Ok(std::mem::take(&mut self.pending))
    }

    fn abort(&mut self) {
        self.started = false;
        self.pending.clear();
        if let Ok(mut r) = self.record.lock() {
            r.aborted = true;
        }
    }
}
