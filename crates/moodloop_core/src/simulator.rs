//! Delayed Affect Simulator: explicit Euler integration of a delay-differential
//! affect model
//!
//! Two reservoirs, positive (`P`) and negative (`N`) affect, relax toward a
//! balance-dependent drive while being pushed by their own lagged history:
//!
//! ```text
//! dP/dt = -P/τP(EB) + λ·qP(EB)      (+ g·(P(t) - P(t - delay)) per step)
//! dN/dt = -N/τN(EB) + λ·qN(EB)      (+ g·(N(t) - N(t - delay)) per step)
//! EB    = P / (P + N)
//! mood  = 2·(EB - 0.5)
//! ```
//!
//! The delay term turns a plain relaxation system into one that can sustain
//! oscillation. When `gain · delay_steps` approaches 1 the lagged feedback
//! starts to dominate and the reservoirs run into the hard clamp; below that
//! they settle onto a fixed point set by `τ·λ·q`.

use crate::delay::{DelayLine, Reservoirs};
use crate::drive::{affect_balance, DriveProfile};
use crate::params::{AffectParameters, InjectionMode};
use crate::snapshot::MoodSnapshot;

/// Lower clamp applied to both reservoirs every step.
pub const RESERVOIR_MIN: f64 = 1e-6;
/// Upper clamp applied to both reservoirs every step.
pub const RESERVOIR_MAX: f64 = 1e6;

/// Multiplier for perturbations injected straight into the reservoirs
/// by `add_to_eb` and `tilt_to_pn`.
const DIRECT_INJECTION_SCALE: f64 = 10.0;

/// Result of one integration step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepOutcome {
    /// Affect balance after the step, in `[0, 1]`
    pub balance: f64,
    pub p: f64,
    pub n: f64,
}

/// Clamp a reservoir value. NaN (from a NaN perturbation, or `inf·0` under
/// `add_to_gain`) lands on the floor, as `max(min, min(v, max))` does.
#[inline]
fn clamp_reservoir(v: f64) -> f64 {
    if v.is_nan() {
        tracing::warn!("NaN reservoir value, clamping to {}", RESERVOIR_MIN);
    }
    v.max(RESERVOIR_MIN).min(RESERVOIR_MAX)
}

/// The stateful delayed affect-balance integrator.
///
/// Owns its delay line exclusively. Steps must be serialized; one driver
/// owns the simulator and others only read the published [`MoodSnapshot`].
#[derive(Debug, Clone)]
pub struct DelayedAffectSimulator {
    params: AffectParameters,
    initial: Reservoirs,
    line: DelayLine,
    snapshot: MoodSnapshot,
}

impl DelayedAffectSimulator {
    /// Default starting level for both reservoirs.
    pub const DEFAULT_INITIAL_LEVEL: f64 = 100.0;

    pub fn new(params: AffectParameters) -> Self {
        Self::with_initial(
            params,
            Self::DEFAULT_INITIAL_LEVEL,
            Self::DEFAULT_INITIAL_LEVEL,
        )
    }

    /// Create with explicit starting reservoir levels, also used by
    /// [`reset_to_initial`](Self::reset_to_initial).
    pub fn with_initial(params: AffectParameters, p0: f64, n0: f64) -> Self {
        let initial = Reservoirs::new(p0, n0);
        let mood = 2.0 * (affect_balance(p0, n0) - 0.5);
        Self {
            line: DelayLine::new(params.delay_steps(), initial),
            params,
            initial,
            snapshot: MoodSnapshot::new(mood, 0.0, 0.0),
        }
    }

    pub fn params(&self) -> &AffectParameters {
        &self.params
    }

    pub fn delay_line(&self) -> &DelayLine {
        &self.line
    }

    pub fn initial_levels(&self) -> Reservoirs {
        self.initial
    }

    /// Last published output.
    pub fn snapshot(&self) -> MoodSnapshot {
        self.snapshot
    }

    /// Current reservoir values.
    pub fn reservoirs(&self) -> Reservoirs {
        self.line.current()
    }

    /// Rebuild the delay line for the active bundle, seeded with `(p0, n0)`.
    /// The published mood is recomputed from the new levels.
    pub fn reset(&mut self, p0: f64, n0: f64) {
        self.line = DelayLine::new(self.params.delay_steps(), Reservoirs::new(p0, n0));
        self.snapshot = MoodSnapshot::new(
            2.0 * (affect_balance(p0, n0) - 0.5),
            0.0,
            self.snapshot.perturbation,
        );
        tracing::debug!(
            "Delay line reset: {} slots, delay {} steps, P0={}, N0={}",
            self.line.len(),
            self.line.delay_steps(),
            p0,
            n0
        );
    }

    /// Reset to the levels given at construction.
    pub fn reset_to_initial(&mut self) {
        let Reservoirs { p, n } = self.initial;
        self.reset(p, n);
    }

    /// Swap in a new bundle. The delay line is rebuilt iff the delay length
    /// in steps changed. Returns whether a reset happened.
    pub fn set_parameters(&mut self, params: AffectParameters) -> bool {
        let needs_reset = params.delay_steps() != self.line.delay_steps();
        self.params = params;
        if needs_reset {
            self.reset_to_initial();
        }
        needs_reset
    }

    /// Advance one step with external `perturbation`, integrating over `dt`
    /// seconds. The bundle's own `dt` only sizes the delay line.
    pub fn step(&mut self, perturbation: f64, dt: f64) -> StepOutcome {
        let params = &self.params;
        let cur = self.line.current();
        let balance = affect_balance(cur.p, cur.n);
        let drive = DriveProfile::at(params, balance);

        let mode = params.injection_mode();
        let lambda_eff = match mode {
            InjectionMode::AddToLambda => params.lambda() + perturbation,
            _ => params.lambda(),
        };
        let gain_eff = match mode {
            InjectionMode::AddToGain => params.gain() + perturbation,
            _ => params.gain(),
        };

        let delayed = self.line.delayed();
        let mut p_next = cur.p
            + dt * (-cur.p / drive.tau_p + lambda_eff * drive.drive_p)
            + gain_eff * (cur.p - delayed.p);
        let mut n_next = cur.n
            + dt * (-cur.n / drive.tau_n + lambda_eff * drive.drive_n)
            + gain_eff * (cur.n - delayed.n);

        match mode {
            InjectionMode::AddToP => p_next += perturbation,
            InjectionMode::AddToEb => {
                p_next += DIRECT_INJECTION_SCALE * perturbation;
                n_next -= DIRECT_INJECTION_SCALE * perturbation;
            }
            InjectionMode::TiltToPn => {
                if perturbation > 0.0 {
                    p_next += DIRECT_INJECTION_SCALE * perturbation.abs();
                } else {
                    n_next += DIRECT_INJECTION_SCALE * perturbation.abs();
                }
            }
            InjectionMode::AddToLambda | InjectionMode::AddToGain => {}
        }

        let p_next = clamp_reservoir(p_next);
        let n_next = clamp_reservoir(n_next);
        self.line.push(Reservoirs::new(p_next, n_next));

        let balance_next = affect_balance(p_next, n_next).clamp(0.0, 1.0);
        self.snapshot = MoodSnapshot::new(2.0 * (balance_next - 0.5), 0.0, perturbation);

        tracing::trace!(
            "step {}: P={:.4}, N={:.4}, EB={:.4}, u={:.4}",
            self.line.step_count(),
            p_next,
            n_next,
            balance_next,
            perturbation
        );

        StepOutcome {
            balance: balance_next,
            p: p_next,
            n: n_next,
        }
    }
}
