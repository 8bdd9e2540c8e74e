//! Heartbeat configuration for the affect loop
//!
//! The heartbeat determines how often the model is stepped, how often the
//! latest snapshot is handed to sinks, and how much model time each step
//! integrates over.

use moodloop_core::DriverConfig;
use std::time::Duration;

/// Configuration for the affect loop heartbeat
#[derive(Debug, Clone, PartialEq)]
pub struct HeartbeatConfig {
    /// How often to step the model (default: 10ms)
    pub interval: Duration,
    /// How often sinks receive the latest snapshot (default: 1s)
    pub publish_interval: Duration,
    /// Integration step per tick; `None` integrates over `interval`
    pub step_dt: Option<f64>,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(10),
            publish_interval: Duration::from_secs(1),
            step_dt: None,
        }
    }
}

impl HeartbeatConfig {
    /// Fast heartbeat matching the reference 1.5ms integration step
    pub fn fast() -> Self {
        Self {
            interval: Duration::from_micros(1500),
            publish_interval: Duration::from_millis(100),
            step_dt: None,
        }
    }

    /// Slow heartbeat for resource-constrained environments
    pub fn slow() -> Self {
        Self {
            interval: Duration::from_millis(50),
            publish_interval: Duration::from_secs(5),
            step_dt: None,
        }
    }

    /// Very fast heartbeat for testing
    pub fn testing() -> Self {
        Self {
            interval: Duration::from_millis(1),
            publish_interval: Duration::from_millis(5),
            step_dt: Some(0.001),
        }
    }

    /// Model time advanced by one tick, in seconds.
    pub fn step_dt(&self) -> f64 {
        match self.step_dt {
            Some(dt) if dt.is_finite() && dt > 0.0 => dt,
            _ => self.interval.as_secs_f64(),
        }
    }
}

impl From<&DriverConfig> for HeartbeatConfig {
    fn from(cfg: &DriverConfig) -> Self {
        Self {
            interval: cfg.tick_interval(),
            publish_interval: cfg.publish_interval(),
            step_dt: cfg.step_dt,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_dt_defaults_to_interval() {
        let hb = HeartbeatConfig::default();
        assert_eq!(hb.step_dt(), 0.01);
        assert_eq!(HeartbeatConfig::fast().step_dt(), 0.0015);
    }

    #[test]
    fn test_explicit_step_dt_wins() {
        let hb = HeartbeatConfig {
            step_dt: Some(0.0015),
            ..Default::default()
        };
        assert_eq!(hb.step_dt(), 0.0015);

        let bogus = HeartbeatConfig {
            step_dt: Some(-1.0),
            ..Default::default()
        };
        assert_eq!(bogus.step_dt(), 0.01);
    }

    #[test]
    fn test_from_driver_config() {
        let cfg = DriverConfig {
            tick_interval_ms: 1.5,
            publish_interval_ms: 250.0,
            step_dt: None,
        };
        let hb = HeartbeatConfig::from(&cfg);
        assert_eq!(hb.interval, Duration::from_micros(1500));
        assert_eq!(hb.publish_interval, Duration::from_millis(250));
        assert_eq!(hb.step_dt(), 0.0015);
    }
}
