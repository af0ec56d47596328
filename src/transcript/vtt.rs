use crate::transcript::store::UtteranceStore;
use std::fmt::Write as _;

/// Render the store as a WebVTT document, one cue per utterance in arrival order.
pub fn to_webvtt(store: &UtteranceStore) -> String {
    let mut out = String::from("WEBVTT\n\n");
    for (i, u) in store.all().iter().enumerate() {
        // Writing into a String cannot fail.
        let _ = write!(
            out,
            "{}\n{} --> {}\n{}\n\n",
            i + 1,
            vtt_timestamp(u.start_ms()),
            vtt_timestamp(u.end_ms()),
            u.text()
        );
    }
    out
}

/// Format milliseconds as `hh:mm:ss.mmm`.
pub(crate) fn vtt_timestamp(ms: u64) -> String {
    let h = ms / 3_600_000;
    let m = (ms / 60_000) % 60;
    let s = (ms / 1000) % 60;
    let frac = ms % 1000;
    format!("{h:02}:{m:02}:{s:02}.{frac:03}")
}
