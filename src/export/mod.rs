//! Export pipeline: a tick-driven state machine that burns captions into source video.

pub(crate) mod job;
pub(crate) mod pipeline;
