use std::time::{Duration, Instant};

/// Monotonic clock driving animation time on a node.
///
/// `offset_ms` shifts the local clock so that it lines up with a remote
/// reference, which is how a clock-synchronised bridge reports shared time.
#[derive(Debug, Clone)]
pub struct AnimationClock {
    origin: Instant,
    offset_ms: i64,
}

impl Default for AnimationClock {
    fn default() -> Self {
        Self::start()
    }
}

impl AnimationClock {
    pub fn start() -> Self {
        Self {
            origin: Instant::now(),
            offset_ms: 0,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.origin.elapsed()
    }

    pub fn offset_ms(&self) -> i64 {
        self.offset_ms
    }

    pub fn set_offset_ms(&mut self, offset_ms: i64) {
        self.offset_ms = offset_ms;
    }

    /// Current animation time in milliseconds, clamped at zero.
    pub fn now_ms(&self) -> u64 {
        let local = i64::try_from(self.elapsed().as_millis()).unwrap_or(i64::MAX);
        u64::try_from(local.saturating_add(self.offset_ms)).unwrap_or(0)
    }
}
