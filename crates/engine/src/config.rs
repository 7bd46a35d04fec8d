use std::time::Duration;

use tileworld_common::{EngineError, EngineResult};

/// Scheduler settings.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Target cycles per second.
    pub ticks_per_second: f64,
    /// Number of recent cycles kept for timing statistics.
    pub stats_window: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ticks_per_second: 20.0,
            stats_window: 60,
        }
    }
}

impl EngineConfig {
    pub fn with_ticks_per_second(mut self, rate: f64) -> Self {
        self.ticks_per_second = rate;
        self
    }

    pub fn with_stats_window(mut self, cycles: usize) -> Self {
        self.stats_window = cycles;
        self
    }

    pub fn validate(&self) -> EngineResult<()> {
        check_rate(self.ticks_per_second)?;
        if self.stats_window == 0 {
            return Err(EngineError::InvalidConfiguration(
                "stats window must hold at least one cycle".into(),
            ));
        }
        Ok(())
    }

    /// Target duration of one cycle.
    pub fn period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.ticks_per_second)
    }
}

pub(crate) fn check_rate(rate: f64) -> EngineResult<()> {
    // Also rejects rates so high the period rounds to zero.
    if !rate.is_finite() || rate <= 0.0 || Duration::from_secs_f64(1.0 / rate).is_zero() {
        return Err(EngineError::InvalidConfiguration(format!(
            "ticks per second must be positive and finite, got {rate}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.ticks_per_second, 20.0);
        assert_eq!(config.period(), Duration::from_millis(50));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_bad_rates_and_windows() {
        for rate in [0.0, -3.0, f64::NAN, f64::INFINITY, 1e12] {
            let config = EngineConfig::default().with_ticks_per_second(rate);
            assert!(
                matches!(config.validate(), Err(EngineError::InvalidConfiguration(_))),
                "rate {rate} accepted"
            );
        }
        assert!(EngineConfig::default().with_stats_window(0).validate().is_err());
    }
}
