//! Control Commands - discrete live reconfiguration
//!
//! Each command turns the active bundle into a new validated bundle (or a
//! reset, or a new treatment scale). The driver applies the result between
//! ticks as one atomic swap, so a step never sees a half-edited bundle.

use crate::error::ParameterError;
use crate::params::{AffectParameters, ParameterSpec};
use crate::treatment::{TiltTreatment, SCALE_STEP};
use serde::{Deserialize, Serialize};

pub const LAMBDA_STEP: f64 = 0.05;
pub const GAIN_STEP: f64 = 0.005;
pub const DT_STEP: f64 = 0.0005;
/// Interactive edits never push `dt` below this.
pub const DT_FLOOR: f64 = 0.0005;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlCommand {
    LambdaDown,
    LambdaUp,
    GainDown,
    GainUp,
    DtDown,
    DtUp,
    CycleInjectionMode,
    Reset,
    TreatmentScaleDown,
    TreatmentScaleUp,
}

/// What the driver has to do after a command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CommandEffect {
    /// Swap in this bundle; `force_reset` when `dt` changed.
    Parameters {
        params: AffectParameters,
        force_reset: bool,
    },
    Reset,
    Treatment(TiltTreatment),
}

impl ControlCommand {
    /// Single-key bindings: `l/L` lambda, `g/G` gain, `t/T` dt, `m` mode,
    /// `r` reset, `k/K` treatment scale. Lowercase decreases.
    pub fn from_key(key: char) -> Option<Self> {
        let cmd = match key {
            'l' => ControlCommand::LambdaDown,
            'L' => ControlCommand::LambdaUp,
            'g' => ControlCommand::GainDown,
            'G' => ControlCommand::GainUp,
            't' => ControlCommand::DtDown,
            'T' => ControlCommand::DtUp,
            'm' => ControlCommand::CycleInjectionMode,
            'r' => ControlCommand::Reset,
            'k' => ControlCommand::TreatmentScaleDown,
            'K' => ControlCommand::TreatmentScaleUp,
            _ => return None,
        };
        Some(cmd)
    }

    pub fn key(&self) -> char {
        match self {
            ControlCommand::LambdaDown => 'l',
            ControlCommand::LambdaUp => 'L',
            ControlCommand::GainDown => 'g',
            ControlCommand::GainUp => 'G',
            ControlCommand::DtDown => 't',
            ControlCommand::DtUp => 'T',
            ControlCommand::CycleInjectionMode => 'm',
            ControlCommand::Reset => 'r',
            ControlCommand::TreatmentScaleDown => 'k',
            ControlCommand::TreatmentScaleUp => 'K',
        }
    }

    pub fn apply(
        self,
        params: &AffectParameters,
        treatment: &TiltTreatment,
    ) -> Result<CommandEffect, ParameterError> {
        let mut spec: ParameterSpec = params.to_spec();
        match self {
            ControlCommand::LambdaDown => spec.lambda = (spec.lambda - LAMBDA_STEP).max(0.0),
            ControlCommand::LambdaUp => spec.lambda += LAMBDA_STEP,
            ControlCommand::GainDown => spec.gain = (spec.gain - GAIN_STEP).max(0.0),
            ControlCommand::GainUp => spec.gain += GAIN_STEP,
            ControlCommand::DtDown => spec.dt = (spec.dt - DT_STEP).max(DT_FLOOR),
            ControlCommand::DtUp => spec.dt += DT_STEP,
            ControlCommand::CycleInjectionMode => spec.injection_mode = spec.injection_mode.next(),
            ControlCommand::Reset => return Ok(CommandEffect::Reset),
            ControlCommand::TreatmentScaleDown => {
                return Ok(CommandEffect::Treatment(
                    treatment.with_scale(treatment.scale - SCALE_STEP),
                ))
            }
            ControlCommand::TreatmentScaleUp => {
                return Ok(CommandEffect::Treatment(
                    treatment.with_scale(treatment.scale + SCALE_STEP),
                ))
            }
        }

        let force_reset = matches!(self, ControlCommand::DtDown | ControlCommand::DtUp);
        Ok(CommandEffect::Parameters {
            params: spec.validate()?,
            force_reset,
        })
    }
}
