//! Export-side media sources: readiness, frame access and the audio track handle.

pub(crate) mod ffmpeg;
pub(crate) mod source;
