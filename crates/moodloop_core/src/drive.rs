//! Balance-dependent drive and decay curves.
//!
//! ```text
//! S1 = response(gain_p, EB)          S2 = response(gain_n, EB)
//! qP = qPmin + S1 (qPmax - qPmin)    qN = qNmin + (1 - S2)(qNmax - qNmin)
//! τP = τmin  + S1 (τmax  - τmin)     τN = τmin  + (1 - S2)(τmax  - τmin)
//! ```

use crate::gate;
use crate::params::AffectParameters;

/// Below this total the balance is undefined and reported as neutral.
pub const BALANCE_EPSILON: f64 = 1e-9;

/// Affect balance `P / (P + N)`, or `0.5` when the total is (near) zero.
#[inline]
pub fn affect_balance(p: f64, n: f64) -> f64 {
    let total = p + n;
    if total > BALANCE_EPSILON {
        p / total
    } else {
        0.5
    }
}

/// Drive intensities and decay time constants at one balance value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriveProfile {
    pub drive_p: f64,
    pub drive_n: f64,
    pub tau_p: f64,
    pub tau_n: f64,
}

impl DriveProfile {
    pub fn at(params: &AffectParameters, balance: f64) -> Self {
        let s1 = gate::response(params.gain_p(), balance);
        let s2 = gate::response(params.gain_n(), balance);
        let tau_span = params.tau_max() - params.tau_min();

        Self {
            drive_p: params.q_p_min() + s1 * (params.q_p_max() - params.q_p_min()),
            drive_n: params.q_n_min() + (1.0 - s2) * (params.q_n_max() - params.q_n_min()),
            tau_p: params.tau_min() + s1 * tau_span,
            tau_n: params.tau_min() + (1.0 - s2) * tau_span,
        }
    }
}
