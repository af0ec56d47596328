//! Encoder profiles, capability queries and encoder sinks.

pub(crate) mod ffmpeg;
pub(crate) mod profile;
pub(crate) mod sink;
