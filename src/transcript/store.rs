use crate::foundation::error::{CaptionError, CaptionResult};
use crate::transcript::utterance::{SpeakerId, Utterance};

/// Ordered sequence of utterances in arrival order.
///
/// Arrival order is not necessarily time order; it is the tie-break used when
/// several utterances start at the same instant.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UtteranceStore {
    items: Vec<Utterance>,
}

impl UtteranceStore {
    /// Create a store from utterances in arrival order.
    pub fn new(items: Vec<Utterance>) -> Self {
        Self { items }
    }

    /// Borrow all utterances in arrival order.
    pub fn all(&self) -> &[Utterance] {
        &self.items
    }

    /// Number of utterances.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Return `true` when the store holds no utterances.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Borrow the utterance at `index`.
    pub fn get(&self, index: usize) -> Option<&Utterance> {
        self.items.get(index)
    }

    /// Iterate `(index, utterance)` pairs matching `pred`, preserving arrival order.
    pub fn filter<'a, P>(&'a self, pred: P) -> impl Iterator<Item = (usize, &'a Utterance)> + 'a
    where
        P: Fn(&Utterance) -> bool + 'a,
    {
        self.items.iter().enumerate().filter(move |(_, u)| pred(u))
    }

    /// Replace the text of one utterance. Timing is left untouched.
    pub fn edit_text(&mut self, index: usize, text: impl Into<String>) -> CaptionResult<()> {
        let len = self.items.len();
        let u = self
            .items
            .get_mut(index)
            .ok_or(CaptionError::IndexOutOfRange { index, len })?;
        u.set_text(text.into());
        Ok(())
    }

    /// Distinct speakers in first-seen order.
    pub fn speakers(&self) -> Vec<SpeakerId> {
        let mut out: Vec<SpeakerId> = Vec::new();
        for u in &self.items {
            if !out.contains(u.speaker()) {
                out.push(u.speaker().clone());
            }
        }
        out
    }

    /// Latest end time across all utterances, or 0 for an empty store.
    pub fn end_ms(&self) -> u64 {
        self.items.iter().map(Utterance::end_ms).max().unwrap_or(0)
    }
}

/// Speaker/search filter used by transcript browsing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UtteranceFilter {
    /// Keep only utterances from this speaker.
    pub speaker: Option<SpeakerId>,
    /// Keep only utterances whose text contains this query (case-insensitive).
    pub query: Option<String>,
}

impl UtteranceFilter {
    /// Return `true` when `u` passes every configured criterion.
    pub fn matches(&self, u: &Utterance) -> bool {
        if let Some(speaker) = &self.speaker
            && u.speaker() != speaker
        {
            return false;
        }
        match self.query.as_deref().map(str::trim) {
            Some(q) if !q.is_empty() => u.text().to_lowercase().contains(&q.to_lowercase()),
            _ => true,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/transcript/store.rs"]
mod tests;
