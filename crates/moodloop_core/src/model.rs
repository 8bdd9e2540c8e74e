//! The closed set of mood models a driver can run.

use crate::oscillator::DampedOscillator;
use crate::params::AffectParameters;
use crate::simulator::DelayedAffectSimulator;
use crate::snapshot::MoodSnapshot;
use serde::{Deserialize, Serialize};

/// Which model to run, as named in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    #[default]
    DelayedBalance,
    Oscillator,
}

#[derive(Debug, Clone)]
pub enum MoodModel {
    DelayedBalance(DelayedAffectSimulator),
    Oscillator(DampedOscillator),
}

impl MoodModel {
    pub fn kind(&self) -> ModelKind {
        match self {
            MoodModel::DelayedBalance(_) => ModelKind::DelayedBalance,
            MoodModel::Oscillator(_) => ModelKind::Oscillator,
        }
    }

    pub fn step(&mut self, perturbation: f64, dt: f64) -> MoodSnapshot {
        match self {
            MoodModel::DelayedBalance(sim) => {
                sim.step(perturbation, dt);
                sim.snapshot()
            }
            MoodModel::Oscillator(osc) => osc.step(perturbation, dt),
        }
    }

    pub fn snapshot(&self) -> MoodSnapshot {
        match self {
            MoodModel::DelayedBalance(sim) => sim.snapshot(),
            MoodModel::Oscillator(osc) => osc.snapshot(),
        }
    }

    /// Active affect bundle, if this model uses one.
    pub fn affect_parameters(&self) -> Option<&AffectParameters> {
        match self {
            MoodModel::DelayedBalance(sim) => Some(sim.params()),
            MoodModel::Oscillator(_) => None,
        }
    }

    /// Swap in a new affect bundle. The oscillator has no use for one and
    /// ignores it. Returns whether the model was reset.
    pub fn apply_parameters(&mut self, params: AffectParameters) -> bool {
        match self {
            MoodModel::DelayedBalance(sim) => sim.set_parameters(params),
            MoodModel::Oscillator(_) => false,
        }
    }

    pub fn reset(&mut self) {
        match self {
            MoodModel::DelayedBalance(sim) => sim.reset_to_initial(),
            MoodModel::Oscillator(osc) => osc.reset(),
        }
    }
}

impl From<DelayedAffectSimulator> for MoodModel {
    fn from(sim: DelayedAffectSimulator) -> Self {
        MoodModel::DelayedBalance(sim)
    }
}

impl From<DampedOscillator> for MoodModel {
    fn from(osc: DampedOscillator) -> Self {
        MoodModel::Oscillator(osc)
    }
}
