//! capsync turns a speaker-tagged transcript into animated, time-synced captions.
//!
//! The same clock-agnostic core serves two drivers:
//!
//! 1. **Live preview**: a [`TimeSyncScheduler`] polls a [`PlaybackClock`] on a host tick,
//!    derives the visible [`WordChunk`]s and notifies subscribers only when they change.
//! 2. **Export**: an [`ExportPipeline`] replays the source media on its own clock, paints
//!    every output frame with the [`FrameRenderer`] and streams it to an [`EncoderSink`]
//!    (the system `ffmpeg` binary by default) to burn the captions in.
//!
//! Chunk segmentation, style resolution and frame painting are pure functions of their
//! inputs, so a preview frame and the matching export frame are pixel-identical.
//!
//! Design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Deterministic**: segmentation and painting depend only on `(transcript, t_ms, style)`.
//! - **Append-only themes**: registering a custom theme produces a new [`ThemeTable`].
//! - **Premultiplied RGBA8** surfaces throughout the renderer.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod config;
mod encode;
mod engine;
mod export;
mod foundation;
mod media;
mod render;
mod theme;
mod timeline;
mod transcript;

pub use config::EngineConfig;
pub use encode::ffmpeg::{FfmpegEncoderCaps, FfmpegSink, is_ffmpeg_on_path};
pub use encode::profile::{
    AudioCodec, CodecProfile, EncoderCaps, EncoderProfile, ExportFormat, ExportQuality,
    StaticEncoderCaps, VideoCodec, candidate_profiles, select_profile,
};
pub use encode::sink::{EncoderConfig, EncoderSink, InMemoryRecord, InMemorySink};
pub use engine::CaptionEngine;
pub use export::job::{
    CancelHandle, ExportArtifact, ExportConfig, ExportErrorKind, ExportFailure, ExportJob,
    ExportObserver, ExportState,
};
pub use export::pipeline::{
    DEFAULT_READY_TIMEOUT_MS, ExportPipeline, ExportRequest, ExportSettings,
};
pub use foundation::core::{Canvas, Fps, FrameIndex, Rgba8Premul};
pub use foundation::error::{CaptionError, CaptionResult};
pub use media::ffmpeg::{FfmpegMediaSource, probe_media};
pub use media::source::{AudioTrack, LoadStatus, MediaInfo, MediaSource, ScriptedSource, SourceLog};
pub use render::blur::{blur_params, blur_rgba8_premul};
pub use render::caption::{ChunkLayout, FrameRenderer, RenderSettings, pulse_factor};
pub use render::frame::FrameRGBA;
pub use render::text::{FontBook, FontFace, MeasuredText, ShapedLine, estimate_metrics};
pub use theme::color::{Color, parse_css_color};
pub use theme::resolve::{Fill, Padding, ResolvedStyle, Shadow, StyleCache, resolve_style};
pub use theme::spec::{BackgroundToken, GradientSpec, PaintSpec, TextToken, TextTransform};
pub use theme::table::{CUSTOM_THEME_ID, DEFAULT_THEME_ID, ThemeEntry, ThemeId, ThemeTable};
pub use timeline::chunk::{
    ChunkWindow, Envelope, WORDS_PER_CHUNK, WordChunk, active_chunk, chunk_windows, envelope,
};
pub use timeline::clock::{
    ManualClock, ManualTicker, PlaybackClock, ReadyState, RealtimePlayback, SleepTicker, Ticker,
};
pub use timeline::scheduler::{
    ActiveChunks, DEFAULT_MIN_INTERVAL_MS, SubscriptionId, TickOutcome, TimeSyncScheduler,
    active_utterances,
};
pub use transcript::store::{UtteranceFilter, UtteranceStore};
pub use transcript::utterance::{SpeakerId, Utterance};
pub use transcript::vtt::to_webvtt;
