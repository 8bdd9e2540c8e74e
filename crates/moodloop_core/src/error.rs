//! Error types for parameter bundles and schedules.

/// A parameter bundle that must never become active.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParameterError {
    /// A coefficient is NaN or infinite.
    #[error("parameter `{name}` must be finite, got {value}")]
    NonFinite { name: &'static str, value: f64 },

    /// Integration step is zero or negative.
    #[error("integration step dt must be > 0, got {0}")]
    NonPositiveStep(f64),

    /// Feedback delay is negative.
    #[error("delay_seconds must be >= 0, got {0}")]
    NegativeDelay(f64),

    /// Sigmoid gate shape coefficient is zero or negative.
    #[error("sigmoid gain `{name}` must be > 0, got {value}")]
    NonPositiveGateGain { name: &'static str, value: f64 },

    /// Decay time constant bound is zero or negative.
    #[error("time constant `{name}` must be > 0, got {value}")]
    NonPositiveTimeConstant { name: &'static str, value: f64 },

    /// delay_seconds / dt asks for more history than the delay line holds.
    #[error("delay of {steps} steps exceeds the maximum of {max}")]
    DelayTooLong { steps: f64, max: usize },
}

/// Rejected schedule window.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScheduleError {
    /// Window bounds are NaN or infinite.
    #[error("schedule window bounds must be finite, got [{start}, {end})")]
    NonFiniteWindow { start: f64, end: f64 },

    /// Window is empty or inverted.
    #[error("schedule window start {start} must be before end {end}")]
    EmptyWindow { start: f64, end: f64 },
}
