//! Published model output.

use serde::{Deserialize, Serialize};

/// The externally observed state of a mood model after a step.
///
/// `mood` is always clamped to `[-1, 1]` on construction.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MoodSnapshot {
    /// Mood in `[-1, 1]`
    pub mood: f64,
    /// Rate of change of mood (oscillator model only, zero otherwise)
    pub velocity: f64,
    /// Last perturbation applied to the model
    pub perturbation: f64,
}

impl MoodSnapshot {
    pub fn new(mood: f64, velocity: f64, perturbation: f64) -> Self {
        Self {
            mood: clamp_mood(mood),
            velocity,
            perturbation,
        }
    }
}

/// Clamp to `[-1, 1]`, mapping NaN to neutral.
pub(crate) fn clamp_mood(mood: f64) -> f64 {
    if mood.is_nan() {
        0.0
    } else {
        mood.clamp(-1.0, 1.0)
    }
}
