//! Playback-time driven caption state: chunk segmentation and the live scheduler.

pub(crate) mod chunk;
pub(crate) mod clock;
pub(crate) mod scheduler;
