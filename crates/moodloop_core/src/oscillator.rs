//! Damped Oscillator - the simpler alternative mood model
//!
//! A second-order ODE with linear damping, a linear restoring force and a
//! cubic (van der Pol style) damping term, integrated with explicit Euler:
//!
//! ```text
//! dm/dt = v
//! dv/dt = -α·v - ω²·m - B·m²·v + u
//! ```
//!
//! With `B < 0` the cubic term pumps energy in at large amplitude, which is
//! what keeps the mood swinging instead of dying out.

use crate::snapshot::{clamp_mood, MoodSnapshot};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OscillatorParameters {
    /// Linear damping
    pub alpha: f64,
    /// Restoring coefficient (ω²)
    pub omega_sq: f64,
    /// Nonlinear damping coefficient
    pub cubic_damping: f64,
}

impl Default for OscillatorParameters {
    fn default() -> Self {
        Self {
            alpha: 0.1,
            omega_sq: 1.0,
            cubic_damping: -1.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DampedOscillator {
    params: OscillatorParameters,
    mood: f64,
    velocity: f64,
    perturbation: f64,
}

impl DampedOscillator {
    pub fn new(params: OscillatorParameters) -> Self {
        Self::with_state(params, 0.0, 0.0)
    }

    pub fn with_state(params: OscillatorParameters, mood: f64, velocity: f64) -> Self {
        Self {
            params,
            mood: clamp_mood(mood),
            velocity,
            perturbation: 0.0,
        }
    }

    pub fn params(&self) -> &OscillatorParameters {
        &self.params
    }

    /// Back to rest.
    pub fn reset(&mut self) {
        self.mood = 0.0;
        self.velocity = 0.0;
    }

    pub fn snapshot(&self) -> MoodSnapshot {
        MoodSnapshot::new(self.mood, self.velocity, self.perturbation)
    }

    /// One Euler step. The stored mood is clamped to `[-1, 1]` afterwards;
    /// velocity is left free.
    pub fn step(&mut self, perturbation: f64, dt: f64) -> MoodSnapshot {
        let OscillatorParameters {
            alpha,
            omega_sq,
            cubic_damping,
        } = self.params;
        let (m, v) = (self.mood, self.velocity);

        let d_mood = v;
        let d_velocity = -alpha * v - omega_sq * m - cubic_damping * m * m * v + perturbation;

        self.mood = clamp_mood(m + d_mood * dt);
        self.velocity = v + d_velocity * dt;
        self.perturbation = perturbation;
        self.snapshot()
    }
}

impl Default for DampedOscillator {
    fn default() -> Self {
        Self::new(OscillatorParameters::default())
    }
}
