use crate::timeline::chunk::{WordChunk, active_chunk};
use crate::timeline::clock::{PlaybackClock, Ticker};
use crate::transcript::store::UtteranceStore;
use smallvec::SmallVec;

/// Default minimum spacing between two recomputations.
pub const DEFAULT_MIN_INTERVAL_MS: u64 = 16;

/// Store indices of utterances containing `t_ms`, ascending by start, ties in store order.
pub fn active_utterances(store: &UtteranceStore, t_ms: u64) -> SmallVec<[usize; 4]> {
    let t = t_ms as f64;
    let mut out: SmallVec<[usize; 4]> = store.filter(move |u| u.contains(t)).map(|(i, _)| i).collect();
    // Stable sort keeps insertion order for equal starts.
    out.sort_by_key(|&i| store.all()[i].start_ms());
    out
}

/// Chunks visible at one playback instant, in paint order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ActiveChunks {
    /// Playback snapshot the chunks were derived from.
    pub t_ms: u64,
    /// Store indices of the active utterances, in paint order.
    pub utterances: SmallVec<[usize; 4]>,
    /// One chunk per active utterance that has words at `t_ms`.
    pub chunks: Vec<WordChunk>,
}

impl ActiveChunks {
    /// Derive the active chunk set from a single `t_ms` snapshot.
    pub fn compute(store: &UtteranceStore, t_ms: u64) -> Self {
        let utterances = active_utterances(store, t_ms);
        let t = t_ms as f64;
        let chunks = utterances
            .iter()
            .filter_map(|&i| active_chunk(&store.all()[i], t))
            .collect();
        Self {
            t_ms,
            utterances,
            chunks,
        }
    }

    /// Return `true` when nothing is visible.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

/// What one call to [`TimeSyncScheduler::tick`] did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// Playback was not ready; no work done.
    Inert,
    /// Too soon after the previous recomputation.
    Throttled,
    /// Recomputed, identical to the previous output; nothing emitted.
    Unchanged,
    /// Recomputed and delivered to subscribers.
    Emitted,
}

/// Handle returned by [`TimeSyncScheduler::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type ChunkCallback = Box<dyn FnMut(&ActiveChunks) + Send>;

/// Live-preview driver: recomputes the active chunk set on a bounded cadence and notifies
/// subscribers only when the output changed.
pub struct TimeSyncScheduler {
    min_interval_ms: u64,
    last_recompute_ms: Option<u64>,
    last: Option<ActiveChunks>,
    subscribers: Vec<(SubscriptionId, ChunkCallback)>,
    next_id: u64,
}

impl std::fmt::Debug for TimeSyncScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimeSyncScheduler")
            .field("min_interval_ms", &self.min_interval_ms)
            .field("last_recompute_ms", &self.last_recompute_ms)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl Default for TimeSyncScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_INTERVAL_MS)
    }
}

impl TimeSyncScheduler {
    /// Create a scheduler that recomputes at most once per `min_interval_ms`.
    ///
    /// Intervals below [`DEFAULT_MIN_INTERVAL_MS`] are raised to it.
    pub fn new(min_interval_ms: u64) -> Self {
        Self {
            min_interval_ms: min_interval_ms.max(DEFAULT_MIN_INTERVAL_MS),
            last_recompute_ms: None,
            last: None,
            subscribers: Vec::new(),
            next_id: 0,
        }
    }

    /// Register `callback`, invoked with each emitted chunk set.
    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&ActiveChunks) + Send + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    /// Remove a subscriber. Returns `false` for an unknown id.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(s, _)| *s != id);
        self.subscribers.len() != before
    }

    /// Last emitted chunk set.
    pub fn current(&self) -> Option<&ActiveChunks> {
        self.last.as_ref()
    }

    /// Force the next ready tick to recompute immediately, e.g. after a text edit.
    pub fn invalidate(&mut self) {
        self.last_recompute_ms = None;
    }

    /// Run one scheduler step at host time `now_ms`.
    ///
    /// The playback position is read exactly once. A non-ready clock makes the step inert
    /// and arms an immediate recompute for the next ready tick.
    pub fn tick(
        &mut self,
        now_ms: u64,
        clock: &dyn PlaybackClock,
        store: &UtteranceStore,
    ) -> TickOutcome {
        if !clock.ready_state().is_ready() {
            self.last_recompute_ms = None;
            return TickOutcome::Inert;
        }
        if let Some(prev) = self.last_recompute_ms
            && now_ms.saturating_sub(prev) < self.min_interval_ms
        {
            return TickOutcome::Throttled;
        }
        self.last_recompute_ms = Some(now_ms);

        let t_ms = clock.current_time_ms();
        let next = ActiveChunks::compute(store, t_ms);
        if self.last.as_ref().is_some_and(|prev| prev.chunks == next.chunks) {
            return TickOutcome::Unchanged;
        }
        tracing::debug!(t_ms, chunks = next.chunks.len(), "active chunks changed");
        for (_, cb) in &mut self.subscribers {
            cb(&next);
        }
        self.last = Some(next);
        TickOutcome::Emitted
    }

    /// Drive ticks from `ticker` until `keep_going` returns `false`.
    ///
    /// `keep_going` sees the outcome of each step and may move `clock` before the next one.
    pub fn run<T, C, F>(
        &mut self,
        ticker: &mut T,
        clock: &mut C,
        store: &UtteranceStore,
        mut keep_going: F,
    ) where
        T: Ticker,
        C: PlaybackClock,
        F: FnMut(&mut C, u64, TickOutcome) -> bool,
    {
        loop {
            let now = ticker.now_ms();
            let outcome = self.tick(now, &*clock, store);
            if !keep_going(clock, now, outcome) {
                break;
            }
            ticker.schedule_next(self.min_interval_ms);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/scheduler.rs"]
mod tests;
