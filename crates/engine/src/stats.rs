use std::time::Duration;

/// Ring buffer of recent cycle durations plus lifetime counters.
#[derive(Debug, Clone)]
pub struct CycleStats {
    history: Vec<Duration>,
    index: usize,
    filled: bool,
    cycles: u64,
    overruns: u64,
}

impl CycleStats {
    /// `window` is clamped to at least one slot.
    pub fn new(window: usize) -> Self {
        Self {
            history: vec![Duration::ZERO; window.max(1)],
            index: 0,
            filled: false,
            cycles: 0,
            overruns: 0,
        }
    }

    /// Record one cycle's processing time against the target period.
    pub fn record(&mut self, spent: Duration, period: Duration) {
        self.history[self.index] = spent;
        self.index = (self.index + 1) % self.history.len();
        if self.index == 0 {
            self.filled = true;
        }
        self.cycles += 1;
        if spent > period {
            self.overruns += 1;
        }
    }

    fn window(&self) -> &[Duration] {
        if self.filled {
            &self.history
        } else {
            &self.history[..self.index]
        }
    }

    pub fn average(&self) -> Duration {
        let window = self.window();
        if window.is_empty() {
            return Duration::ZERO;
        }
        window.iter().sum::<Duration>() / window.len() as u32
    }

    pub fn max(&self) -> Duration {
        self.window().iter().copied().max().unwrap_or_default()
    }

    pub fn min(&self) -> Duration {
        self.window().iter().copied().min().unwrap_or_default()
    }

    /// Samples currently in the window.
    pub fn count(&self) -> usize {
        self.window().len()
    }

    /// Cycles recorded since creation.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Cycles whose processing exceeded the period, so the next one started
    /// without sleeping.
    pub fn overruns(&self) -> u64 {
        self.overruns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PERIOD: Duration = Duration::from_millis(50);

    #[test]
    fn empty_stats_are_zero() {
        let stats = CycleStats::new(4);
        assert_eq!(stats.average(), Duration::ZERO);
        assert_eq!(stats.max(), Duration::ZERO);
        assert_eq!(stats.count(), 0);
    }

    #[test]
    fn window_wraps() {
        let mut stats = CycleStats::new(3);
        for ms in [10, 20, 30, 40] {
            stats.record(Duration::from_millis(ms), PERIOD);
        }
        assert_eq!(stats.count(), 3);
        assert_eq!(stats.cycles(), 4);
        assert_eq!(stats.min(), Duration::from_millis(20));
        assert_eq!(stats.max(), Duration::from_millis(40));
        assert_eq!(stats.average(), Duration::from_millis(30));
    }

    #[test]
    fn counts_overruns() {
        let mut stats = CycleStats::new(8);
        stats.record(Duration::from_millis(49), PERIOD);
        stats.record(Duration::from_millis(50), PERIOD);
        stats.record(Duration::from_millis(51), PERIOD);
        assert_eq!(stats.overruns(), 1);
    }

    #[test]
    fn zero_window_still_records() {
        let mut stats = CycleStats::new(0);
        stats.record(Duration::from_millis(5), PERIOD);
        assert_eq!(stats.count(), 1);
    }
}
