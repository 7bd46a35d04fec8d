use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Time source and sleeper for the scheduling loop.
pub trait Clock: Send + Sync + 'static {
    /// Monotonic time since the clock was created.
    fn now(&self) -> Duration;
    /// Block the calling thread for `duration`.
    fn sleep(&self, duration: Duration);
}

/// Wall-clock time; `sleep` parks the thread.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    start: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.start.elapsed()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Virtual time for tests. `sleep` advances the clock and returns at once,
/// and clones share the same timeline.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<Mutex<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn sleep(&self, duration: Duration) {
        self.advance(duration);
    }
}
