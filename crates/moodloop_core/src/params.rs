//! Affect Parameters - validated coefficient bundles
//!
//! A bundle is an immutable value for one configuration epoch. Tweaks never
//! patch fields of the active bundle; they go through [`ParameterSpec`],
//! get re-validated, and replace the bundle wholesale. This keeps `dt` and
//! the delay line length from ever drifting apart.

use crate::error::ParameterError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Upper bound on `delay_steps`; keeps the delay line allocation sane.
pub const MAX_DELAY_STEPS: usize = 1_000_000;

/// How the external perturbation enters the reservoir update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InjectionMode {
    /// Added to the drive-rate multiplier `lambda`.
    AddToLambda,
    /// Added to the delayed-feedback coupling `gain`.
    #[serde(alias = "add_to_g")]
    AddToGain,
    /// Added directly to the positive reservoir.
    AddToP,
    /// Pushes balance by biasing `P` up and `N` down (x10).
    AddToEb,
    /// Positive input feeds `P`, negative input feeds `N` (x10).
    #[default]
    TiltToPn,
}

impl InjectionMode {
    /// Cycle order used by interactive reconfiguration.
    pub const ALL: [InjectionMode; 5] = [
        InjectionMode::AddToLambda,
        InjectionMode::AddToGain,
        InjectionMode::AddToP,
        InjectionMode::AddToEb,
        InjectionMode::TiltToPn,
    ];

    /// The mode after this one, wrapping around.
    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|m| *m == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InjectionMode::AddToLambda => "add_to_lambda",
            InjectionMode::AddToGain => "add_to_gain",
            InjectionMode::AddToP => "add_to_p",
            InjectionMode::AddToEb => "add_to_eb",
            InjectionMode::TiltToPn => "tilt_to_pn",
        }
    }
}

impl fmt::Display for InjectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for InjectionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "add_to_lambda" => Ok(InjectionMode::AddToLambda),
            "add_to_gain" | "add_to_g" => Ok(InjectionMode::AddToGain),
            "add_to_p" => Ok(InjectionMode::AddToP),
            "add_to_eb" => Ok(InjectionMode::AddToEb),
            "tilt_to_pn" => Ok(InjectionMode::TiltToPn),
            other => Err(format!("unknown injection mode: {}", other)),
        }
    }
}

/// Unvalidated, freely editable parameter set.
///
/// This is what config files deserialize into and what control commands
/// edit. Turn it into an [`AffectParameters`] with `try_into()`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParameterSpec {
    /// Sigmoid shape coefficient for the positive gate
    pub gain_p: f64,
    /// Sigmoid shape coefficient for the negative gate
    pub gain_n: f64,
    pub q_p_min: f64,
    pub q_p_max: f64,
    pub q_n_min: f64,
    pub q_n_max: f64,
    pub tau_min: f64,
    pub tau_max: f64,
    /// Baseline drive-rate multiplier
    pub lambda: f64,
    /// Coupling between a reservoir and its delayed value
    pub gain: f64,
    /// Integration step (seconds), used to size the delay line
    pub dt: f64,
    pub delay_seconds: f64,
    pub injection_mode: InjectionMode,
}

impl Default for ParameterSpec {
    fn default() -> Self {
        Self {
            gain_p: 3.0,
            gain_n: 3.0,
            q_p_min: 10.0,
            q_p_max: 10.0,
            q_n_min: 2.5,
            q_n_max: 7.0,
            tau_min: 1.0,
            tau_max: 5.0,
            lambda: 4.0,
            gain: 0.2,
            dt: 0.001,
            delay_seconds: 0.02,
            injection_mode: InjectionMode::TiltToPn,
        }
    }
}

impl ParameterSpec {
    /// Validate into an activatable bundle.
    pub fn validate(self) -> Result<AffectParameters, ParameterError> {
        AffectParameters::try_from(self)
    }

    fn check(&self) -> Result<(), ParameterError> {
        let named = [
            ("gain_p", self.gain_p),
            ("gain_n", self.gain_n),
            ("q_p_min", self.q_p_min),
            ("q_p_max", self.q_p_max),
            ("q_n_min", self.q_n_min),
            ("q_n_max", self.q_n_max),
            ("tau_min", self.tau_min),
            ("tau_max", self.tau_max),
            ("lambda", self.lambda),
            ("gain", self.gain),
            ("dt", self.dt),
            ("delay_seconds", self.delay_seconds),
        ];
        for (name, value) in named {
            if !value.is_finite() {
                return Err(ParameterError::NonFinite { name, value });
            }
        }

        if self.dt <= 0.0 {
            return Err(ParameterError::NonPositiveStep(self.dt));
        }
        if self.delay_seconds < 0.0 {
            return Err(ParameterError::NegativeDelay(self.delay_seconds));
        }
        for (name, value) in [("gain_p", self.gain_p), ("gain_n", self.gain_n)] {
            if value <= 0.0 {
                return Err(ParameterError::NonPositiveGateGain { name, value });
            }
        }
        for (name, value) in [("tau_min", self.tau_min), ("tau_max", self.tau_max)] {
            if value <= 0.0 {
                return Err(ParameterError::NonPositiveTimeConstant { name, value });
            }
        }

        let steps = (self.delay_seconds / self.dt).round_ties_even();
        if !steps.is_finite() || steps > MAX_DELAY_STEPS as f64 {
            return Err(ParameterError::DelayTooLong {
                steps,
                max: MAX_DELAY_STEPS,
            });
        }
        Ok(())
    }
}

/// Validated, immutable coefficient bundle for the delayed affect model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ParameterSpec", into = "ParameterSpec")]
pub struct AffectParameters {
    spec: ParameterSpec,
}

impl TryFrom<ParameterSpec> for AffectParameters {
    type Error = ParameterError;

    fn try_from(spec: ParameterSpec) -> Result<Self, Self::Error> {
        spec.check()?;
        Ok(Self { spec })
    }
}

impl From<AffectParameters> for ParameterSpec {
    fn from(params: AffectParameters) -> Self {
        params.spec
    }
}

impl Default for AffectParameters {
    fn default() -> Self {
        // The default spec is valid by construction.
        Self {
            spec: ParameterSpec::default(),
        }
    }
}

impl AffectParameters {
    /// Editable copy of this bundle.
    pub fn to_spec(&self) -> ParameterSpec {
        self.spec
    }

    /// Derived feedback delay in whole steps: `max(1, round(delay_seconds / dt))`.
    pub fn delay_steps(&self) -> usize {
        let steps = (self.spec.delay_seconds / self.spec.dt).round_ties_even();
        // Bounded by MAX_DELAY_STEPS at validation time.
        (steps as usize).max(1)
    }

    /// Length of the circular buffer needed for this delay.
    pub fn buffer_len(&self) -> usize {
        (self.delay_steps() + 10).max(8)
    }

    pub fn gain_p(&self) -> f64 {
        self.spec.gain_p
    }
    pub fn gain_n(&self) -> f64 {
        self.spec.gain_n
    }
    pub fn q_p_min(&self) -> f64 {
        self.spec.q_p_min
    }
    pub fn q_p_max(&self) -> f64 {
        self.spec.q_p_max
    }
    pub fn q_n_min(&self) -> f64 {
        self.spec.q_n_min
    }
    pub fn q_n_max(&self) -> f64 {
        self.spec.q_n_max
    }
    pub fn tau_min(&self) -> f64 {
        self.spec.tau_min
    }
    pub fn tau_max(&self) -> f64 {
        self.spec.tau_max
    }
    pub fn lambda(&self) -> f64 {
        self.spec.lambda
    }
    pub fn gain(&self) -> f64 {
        self.spec.gain
    }
    pub fn dt(&self) -> f64 {
        self.spec.dt
    }
    pub fn delay_seconds(&self) -> f64 {
        self.spec.delay_seconds
    }
    pub fn injection_mode(&self) -> InjectionMode {
        self.spec.injection_mode
    }
}

impl fmt::Display for AffectParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "λ={:.2}, g={:.3}, dt={:.4}, delay={:.3}s ({} steps), mode={}",
            self.lambda(),
            self.gain(),
            self.dt(),
            self.delay_seconds(),
            self.delay_steps(),
            self.injection_mode()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let params = ParameterSpec::default().validate().unwrap();
        assert_eq!(params, AffectParameters::default());
        assert_eq!(params.delay_steps(), 20);
        assert_eq!(params.buffer_len(), 30);
    }

    #[test]
    fn test_delay_steps_at_least_one() {
        let params = ParameterSpec {
            delay_seconds: 0.0,
            ..Default::default()
        }
        .validate()
        .unwrap();
        assert_eq!(params.delay_steps(), 1);
        assert_eq!(params.buffer_len(), 11);
    }

    #[test]
    fn test_delay_steps_rounds() {
        let params = ParameterSpec {
            dt: 0.0015,
            delay_seconds: 0.02,
            ..Default::default()
        }
        .validate()
        .unwrap();
        // 13.33 -> 13
        assert_eq!(params.delay_steps(), 13);
        assert_eq!(params.buffer_len(), 23);
    }

    #[test]
    fn test_rejects_non_positive_dt() {
        for dt in [0.0, -0.001] {
            let err = ParameterSpec {
                dt,
                ..Default::default()
            }
            .validate()
            .unwrap_err();
            assert_eq!(err, ParameterError::NonPositiveStep(dt));
        }
    }

    #[test]
    fn test_rejects_negative_delay() {
        let err = ParameterSpec {
            delay_seconds: -0.5,
            ..Default::default()
        }
        .validate()
        .unwrap_err();
        assert_eq!(err, ParameterError::NegativeDelay(-0.5));
    }

    #[test]
    fn test_rejects_non_finite() {
        let err = ParameterSpec {
            lambda: f64::NAN,
            ..Default::default()
        }
        .validate()
        .unwrap_err();
        assert!(matches!(err, ParameterError::NonFinite { name: "lambda", .. }));

        let err = ParameterSpec {
            q_n_max: f64::INFINITY,
            ..Default::default()
        }
        .validate()
        .unwrap_err();
        assert!(matches!(err, ParameterError::NonFinite { name: "q_n_max", .. }));
    }

    #[test]
    fn test_rejects_bad_gate_gain_and_tau() {
        let err = ParameterSpec {
            gain_n: 0.0,
            ..Default::default()
        }
        .validate()
        .unwrap_err();
        assert!(matches!(err, ParameterError::NonPositiveGateGain { name: "gain_n", .. }));

        let err = ParameterSpec {
            tau_min: -1.0,
            ..Default::default()
        }
        .validate()
        .unwrap_err();
        assert!(matches!(
            err,
            ParameterError::NonPositiveTimeConstant { name: "tau_min", .. }
        ));
    }

    #[test]
    fn test_rejects_huge_delay() {
        let err = ParameterSpec {
            dt: 1e-9,
            delay_seconds: 10.0,
            ..Default::default()
        }
        .validate()
        .unwrap_err();
        assert!(matches!(err, ParameterError::DelayTooLong { .. }));
    }

    #[test]
    fn test_injection_mode_cycle() {
        let mut mode = InjectionMode::AddToLambda;
        let mut seen = vec![mode];
        for _ in 0..4 {
            mode = mode.next();
            seen.push(mode);
        }
        assert_eq!(seen, InjectionMode::ALL.to_vec());
        assert_eq!(mode.next(), InjectionMode::AddToLambda);
    }

    #[test]
    fn test_injection_mode_parse() {
        assert_eq!("add_to_g".parse::<InjectionMode>(), Ok(InjectionMode::AddToGain));
        assert_eq!("TILT_TO_PN".parse::<InjectionMode>(), Ok(InjectionMode::TiltToPn));
        assert!("sideways".parse::<InjectionMode>().is_err());
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: AffectParameters = toml::from_str("lambda = 0.5\ngain = 0.07\ndt = 0.0015").unwrap();
        assert_eq!(ok.lambda(), 0.5);
        assert_eq!(ok.gain_p(), 3.0);

        let bad: Result<AffectParameters, _> = toml::from_str("dt = 0.0");
        assert!(bad.is_err());
    }
}
