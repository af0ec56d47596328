use crate::transcript::utterance::{SpeakerId, Utterance};
use serde::Serialize;

/// Number of words shown together in one caption chunk.
pub const WORDS_PER_CHUNK: usize = 4;

/// A bounded group of words from one utterance, animated for one instant.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct WordChunk {
    /// Words of the group joined by single spaces.
    pub text: String,
    /// Window start in milliseconds.
    pub start_ms: f64,
    /// Window end in milliseconds.
    pub end_ms: f64,
    /// Speaker of the source utterance.
    pub speaker: SpeakerId,
    /// Fade factor in `[0, 1]`.
    pub opacity: f32,
    /// Scale factor around the caption box centre.
    pub scale: f32,
    /// Downward offset in pixels (slide-in only).
    pub translate_y: f32,
}

/// Time window of one word group inside an utterance.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChunkWindow {
    /// Index of the first word of the group.
    pub first_word: usize,
    /// Number of words in the group (`1..=WORDS_PER_CHUNK`).
    pub word_count: usize,
    /// Window start in milliseconds.
    pub start_ms: f64,
    /// Window end in milliseconds.
    pub end_ms: f64,
}

impl ChunkWindow {
    /// Normalized position of `t_ms` inside the window, clamped to `[0, 1]`.
    pub fn progress(&self, t_ms: f64) -> f64 {
        ((t_ms - self.start_ms) / (self.end_ms - self.start_ms)).clamp(0.0, 1.0)
    }
}

/// Fade/scale/slide values for one chunk.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Envelope {
    /// Fade factor.
    pub opacity: f32,
    /// Scale factor.
    pub scale: f32,
    /// Slide-in offset in pixels.
    pub translate_y: f32,
}

/// Animation envelope at `progress` in `[0, 1]`: fade and grow in over the first 10 %,
/// fade and shrink out over the last 10 %, slide in from below without sliding out.
pub fn envelope(progress: f64) -> Envelope {
    let p = progress.clamp(0.0, 1.0);
    let opacity = if p < 0.1 {
        p * 10.0
    } else if p > 0.9 {
        (1.0 - p) * 10.0
    } else {
        1.0
    };
    let scale = if p < 0.1 {
        0.8 + p * 0.2
    } else if p > 0.9 {
        1.0 - (p - 0.9) * 0.2
    } else {
        1.0
    };
    let translate_y = if p < 0.1 { (1.0 - p) * 20.0 } else { 0.0 };
    Envelope {
        opacity: opacity.clamp(0.0, 1.0) as f32,
        scale: scale as f32,
        translate_y: translate_y as f32,
    }
}

/// Partition an utterance's words into groups of [`WORDS_PER_CHUNK`] with uniform per-word
/// timing. Consecutive windows share their boundary and together span the utterance.
pub fn chunk_windows(u: &Utterance) -> Vec<ChunkWindow> {
    let n = u.text().split_whitespace().count();
    windows_for(n, u.start_ms() as f64, u.end_ms() as f64)
}

fn windows_for(n: usize, start_ms: f64, end_ms: f64) -> Vec<ChunkWindow> {
    if n == 0 {
        return Vec::new();
    }
    let word_ms = (end_ms - start_ms) / n as f64;
    (0..n)
        .step_by(WORDS_PER_CHUNK)
        .map(|first| {
            let word_count = WORDS_PER_CHUNK.min(n - first);
            let last = first + word_count;
            ChunkWindow {
                first_word: first,
                word_count,
                start_ms: start_ms + first as f64 * word_ms,
                // Pin the final boundary so float error never leaves a gap at the end.
                end_ms: if last == n {
                    end_ms
                } else {
                    start_ms + last as f64 * word_ms
                },
            }
        })
        .collect()
}

/// The chunk of `u` visible at `t_ms`, if any.
///
/// Windows are half-open `[start, end)` except the last one, which also covers the
/// utterance end, so exactly one group is active anywhere inside the utterance.
pub fn active_chunk(u: &Utterance, t_ms: f64) -> Option<WordChunk> {
    if !u.contains(t_ms) {
        return None;
    }
    let words: Vec<&str> = u.text().split_whitespace().collect();
    let windows = windows_for(words.len(), u.start_ms() as f64, u.end_ms() as f64);
    let last = windows.len().checked_sub(1)?;
    let (i, w) = windows.iter().enumerate().find(|(i, w)| {
        w.start_ms <= t_ms && (t_ms < w.end_ms || (*i == last && t_ms <= w.end_ms))
    })?;
    let env = envelope(w.progress(t_ms));
    let text = words[w.first_word..w.first_word + w.word_count].join(" ");
    tracing::trace!(chunk = i, t_ms, "active chunk");
    Some(WordChunk {
        text,
        start_ms: w.start_ms,
        end_ms: w.end_ms,
        speaker: u.speaker().clone(),
        opacity: env.opacity,
        scale: env.scale,
        translate_y: env.translate_y,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/chunk.rs"]
mod tests;
