use crate::foundation::error::{CaptionError, CaptionResult};
use crate::transcript::store::UtteranceStore;
use crate::transcript::utterance::Utterance;
use anyhow::Context as _;
use serde::Deserialize;
use std::path::Path;

#[derive(Deserialize)]
#[serde(untagged)]
enum TranscriptRepr {
    Envelope { utterances: Vec<Utterance> },
    Bare(Vec<Utterance>),
}

impl UtteranceStore {
    /// Parse a transcript JSON document.
    ///
    /// Accepts either the transcription service envelope
    /// (`{"utterances": [{"speaker", "start", "end", "text"}, ...]}`) or a bare array of
    /// utterance objects. Extra fields are ignored.
    pub fn from_json_str(s: &str) -> CaptionResult<Self> {
        let repr: TranscriptRepr = serde_json::from_str(s)
            .map_err(|e| CaptionError::serde(format!("invalid transcript json: {e}")))?;
        let items = match repr {
            TranscriptRepr::Envelope { utterances } => utterances,
            TranscriptRepr::Bare(v) => v,
        };
        Ok(Self::new(items))
    }

    /// Read and parse a transcript JSON file.
    pub fn from_path(path: &Path) -> CaptionResult<Self> {
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read transcript '{}'", path.display()))?;
        Self::from_json_str(&s)
    }
}
