use std::time::{Duration, Instant};

/// Readiness of a playback source.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ReadyState {
    /// Frames at the current position are available.
    Ready,
    /// A seek is in progress.
    Seeking,
    /// Waiting for data.
    Buffering,
}

impl ReadyState {
    /// Return `true` for [`ReadyState::Ready`].
    pub fn is_ready(self) -> bool {
        matches!(self, ReadyState::Ready)
    }
}

/// Media playback position as seen by caption consumers.
pub trait PlaybackClock {
    /// Current playback position.
    fn current_time_ms(&self) -> u64;
    /// Total media duration.
    fn duration_ms(&self) -> u64;
    /// Whether the source can show the current position.
    fn ready_state(&self) -> ReadyState;
}

/// Host tick source. Drivers read `now_ms` once per tick and ask for the next one.
pub trait Ticker {
    /// Monotonic host time in milliseconds.
    fn now_ms(&self) -> u64;
    /// Yield until roughly `after_ms` from now.
    fn schedule_next(&mut self, after_ms: u64);
}

/// Deterministic ticker: `schedule_next` advances virtual time without sleeping.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ManualTicker {
    now_ms: u64,
}

impl ManualTicker {
    /// Start at `now_ms`.
    pub fn new(now_ms: u64) -> Self {
        Self { now_ms }
    }

    /// Jump forward by `delta_ms`.
    pub fn advance(&mut self, delta_ms: u64) {
        self.now_ms = self.now_ms.saturating_add(delta_ms);
    }
}

impl Ticker for ManualTicker {
    fn now_ms(&self) -> u64 {
        self.now_ms
    }

    fn schedule_next(&mut self, after_ms: u64) {
        self.advance(after_ms.max(1));
    }
}

/// Wall-clock ticker that sleeps the calling thread between ticks.
#[derive(Clone, Copy, Debug)]
pub struct SleepTicker {
    origin: Instant,
}

impl SleepTicker {
    /// Start counting from the current instant.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SleepTicker {
    fn default() -> Self {
        Self::new()
    }
}

impl Ticker for SleepTicker {
    fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }

    fn schedule_next(&mut self, after_ms: u64) {
        std::thread::sleep(Duration::from_millis(after_ms.max(1)));
    }
}

/// Scriptable playback clock.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ManualClock {
    /// Reported position.
    pub time_ms: u64,
    /// Reported duration.
    pub duration_ms: u64,
    /// Reported readiness.
    pub state: ReadyState,
}

impl ManualClock {
    /// A ready clock positioned at zero.
    pub fn new(duration_ms: u64) -> Self {
        Self {
            time_ms: 0,
            duration_ms,
            state: ReadyState::Ready,
        }
    }

    /// Move the playback position.
    pub fn seek(&mut self, time_ms: u64) {
        self.time_ms = time_ms.min(self.duration_ms);
    }
}

impl PlaybackClock for ManualClock {
    fn current_time_ms(&self) -> u64 {
        self.time_ms
    }

    fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    fn ready_state(&self) -> ReadyState {
        self.state
    }
}

/// Playback that advances at normal rate with a [`Ticker`]'s time base, starting when created.
///
/// Position is `now - started_at`, clamped to the duration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RealtimePlayback {
    started_at_ms: u64,
    now_ms: u64,
    duration_ms: u64,
}

impl RealtimePlayback {
    /// Start playback at host time `now_ms`.
    pub fn start(now_ms: u64, duration_ms: u64) -> Self {
        Self {
            started_at_ms: now_ms,
            now_ms,
            duration_ms,
        }
    }

    /// Feed the latest host time.
    pub fn sync(&mut self, now_ms: u64) {
        self.now_ms = now_ms.max(self.now_ms);
    }

    /// Return `true` once the position reached the duration.
    pub fn ended(&self) -> bool {
        self.current_time_ms() >= self.duration_ms
    }
}

impl PlaybackClock for RealtimePlayback {
    fn current_time_ms(&self) -> u64 {
        (self.now_ms - self.started_at_ms).min(self.duration_ms)
    }

    fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    fn ready_state(&self) -> ReadyState {
        ReadyState::Ready
    }
}
