use crate::foundation::error::{CaptionError, CaptionResult};
use serde::{Deserialize, Serialize};

/// Opaque speaker label as assigned by the transcription service (`"A"`, `"B"`, ...).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpeakerId(pub String);

impl SpeakerId {
    /// Create a speaker id from any string-like label.
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    /// Borrow the raw label.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SpeakerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A speaker-attributed, time-coded transcript segment.
///
/// Timing is fixed at construction. Only `text` may change afterwards, through
/// [`crate::UtteranceStore::edit_text`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Utterance {
    speaker: SpeakerId,
    start_ms: u64,
    end_ms: u64,
    text: String,
}

impl Utterance {
    /// Create a validated utterance with `start_ms < end_ms`.
    pub fn new(
        speaker: SpeakerId,
        start_ms: u64,
        end_ms: u64,
        text: impl Into<String>,
    ) -> CaptionResult<Self> {
        if start_ms >= end_ms {
            return Err(CaptionError::validation(format!(
                "utterance start ({start_ms} ms) must be before end ({end_ms} ms)"
            )));
        }
        Ok(Self {
            speaker,
            start_ms,
            end_ms,
            text: text.into(),
        })
    }

    /// Speaker label.
    pub fn speaker(&self) -> &SpeakerId {
        &self.speaker
    }

    /// Inclusive start of the segment in milliseconds.
    pub fn start_ms(&self) -> u64 {
        self.start_ms
    }

    /// Inclusive end of the segment in milliseconds.
    pub fn end_ms(&self) -> u64 {
        self.end_ms
    }

    /// Segment text as last edited.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Return `true` when `t_ms` lies inside `[start_ms, end_ms]`.
    pub fn contains(&self, t_ms: f64) -> bool {
        (self.start_ms as f64) <= t_ms && t_ms <= (self.end_ms as f64)
    }

    pub(crate) fn set_text(&mut self, text: String) {
        self.text = text;
    }
}

impl<'de> Deserialize<'de> for Utterance {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Repr {
            speaker: SpeakerId,
            #[serde(alias = "start_ms")]
            start: u64,
            #[serde(alias = "end_ms")]
            end: u64,
            text: String,
        }

        let r = Repr::deserialize(deserializer)?;
        Utterance::new(r.speaker, r.start, r.end, r.text).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/transcript/utterance.rs"]
mod tests;
