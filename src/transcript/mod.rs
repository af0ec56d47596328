//! Speaker-tagged, time-coded transcript segments.

pub(crate) mod load;
pub(crate) mod store;
pub(crate) mod utterance;
pub(crate) mod vtt;
