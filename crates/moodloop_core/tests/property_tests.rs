//! Property-based tests for moodloop_core.
//!
//! Uses proptest to verify invariants that must hold for ALL valid parameter
//! bundles and perturbation sequences, not just hand-picked examples.

use moodloop_core::delay::{DelayLine, Reservoirs};
use moodloop_core::gate;
use moodloop_core::schedule::{ActiveWindow, ConfigurationSchedule};
use moodloop_core::simulator::{RESERVOIR_MAX, RESERVOIR_MIN};
use moodloop_core::{AffectParameters, DelayedAffectSimulator, InjectionMode, ParameterSpec};
use proptest::prelude::*;

// ============================================================================
// Strategies: generate arbitrary but valid bundles
// ============================================================================

fn arb_mode() -> impl Strategy<Value = InjectionMode> {
    (0usize..InjectionMode::ALL.len()).prop_map(|i| InjectionMode::ALL[i])
}

/// Generate an arbitrary valid AffectParameters.
fn arb_params() -> impl Strategy<Value = AffectParameters> {
    (
        (0.5f64..10.0, 0.5f64..10.0),
        (0.0f64..20.0, 0.0f64..20.0, 0.0f64..20.0, 0.0f64..20.0),
        (0.1f64..5.0, 0.0f64..5.0),
        (0.0f64..5.0, 0.0f64..0.99),
        (0.0005f64..0.01, 0.0f64..0.1),
        arb_mode(),
    )
        .prop_map(
            |((gain_p, gain_n), (qp_a, qp_b, qn_a, qn_b), (tau_min, tau_extra), (lambda, gain), (dt, delay_seconds), mode)| {
                ParameterSpec {
                    gain_p,
                    gain_n,
                    q_p_min: qp_a.min(qp_b),
                    q_p_max: qp_a.max(qp_b),
                    q_n_min: qn_a.min(qn_b),
                    q_n_max: qn_a.max(qn_b),
                    tau_min,
                    tau_max: tau_min + tau_extra,
                    lambda,
                    gain,
                    dt,
                    delay_seconds,
                    injection_mode: mode,
                }
                .validate()
                .expect("strategy only produces valid bundles")
            },
        )
}

/// Positive initial reservoir levels.
fn arb_initial() -> impl Strategy<Value = (f64, f64)> {
    (1e-3f64..1e3, 1e-3f64..1e3)
}

/// Perturbation sequence in the range the sensor mapping produces.
fn arb_perturbations(len: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-5.0f64..5.0, len)
}

// ============================================================================
// Sigmoid Gate Properties
// ============================================================================

proptest! {
    /// **response(g, 0) = 0** for every nonzero g: the numerator vanishes.
    #[test]
    fn gate_zero_at_origin(g in prop::num::f64::NORMAL) {
        prop_assert_eq!(gate::response(g, 0.0), 0.0);
    }

    /// **Gate stays in [0, 1]** on the unit interval for positive shape.
    #[test]
    fn gate_bounded_on_unit_interval(g in 0.01f64..20.0, x in 0.0f64..=1.0) {
        let r = gate::response(g, x);
        prop_assert!(r.is_finite());
        prop_assert!(r >= -1e-12 && r <= 1.0 + 1e-12, "response({}, {}) = {}", g, x, r);
    }

    /// **Gate is monotonic** in x for positive shape.
    #[test]
    fn gate_monotonic(g in 0.01f64..20.0, a in 0.0f64..=1.0, b in 0.0f64..=1.0) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(gate::response(g, lo) <= gate::response(g, hi) + 1e-15);
    }
}

// ============================================================================
// Simulator Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    /// **Core invariant**: reservoirs stay within the clamp for 100k ticks,
    /// never NaN, whatever the (valid) bundle and bounded perturbation.
    #[test]
    fn reservoirs_bounded_over_long_run(
        params in arb_params(),
        (p0, n0) in arb_initial(),
        inputs in arb_perturbations(64),
    ) {
        let mut sim = DelayedAffectSimulator::with_initial(params, p0, n0);
        for k in 0..100_000usize {
            let out = sim.step(inputs[k % inputs.len()], params.dt());
            prop_assert!(out.p >= RESERVOIR_MIN && out.p <= RESERVOIR_MAX, "P={} at tick {}", out.p, k);
            prop_assert!(out.n >= RESERVOIR_MIN && out.n <= RESERVOIR_MAX, "N={} at tick {}", out.n, k);
        }
    }
}

proptest! {
    /// **Output ranges**: EB in [0, 1] and mood in [-1, 1] after every step.
    #[test]
    fn balance_and_mood_in_range(
        params in arb_params(),
        (p0, n0) in arb_initial(),
        inputs in arb_perturbations(500),
    ) {
        let mut sim = DelayedAffectSimulator::with_initial(params, p0, n0);
        for u in &inputs {
            let out = sim.step(*u, params.dt());
            prop_assert!((0.0..=1.0).contains(&out.balance), "EB={}", out.balance);
            let snap = sim.snapshot();
            prop_assert!((-1.0..=1.0).contains(&snap.mood), "mood={}", snap.mood);
            prop_assert_eq!(snap.perturbation.to_bits(), u.to_bits());
            prop_assert!((snap.mood - 2.0 * (out.balance - 0.5)).abs() < 1e-12);
        }
    }

    /// **Determinism**: two independent instances fed the same sequence
    /// produce bit-identical trajectories.
    #[test]
    fn identical_inputs_identical_trajectories(
        params in arb_params(),
        (p0, n0) in arb_initial(),
        inputs in arb_perturbations(300),
    ) {
        let mut a = DelayedAffectSimulator::with_initial(params, p0, n0);
        let mut b = DelayedAffectSimulator::with_initial(params, p0, n0);
        for u in &inputs {
            let oa = a.step(*u, params.dt());
            let ob = b.step(*u, params.dt());
            prop_assert_eq!(oa.p.to_bits(), ob.p.to_bits());
            prop_assert_eq!(oa.n.to_bits(), ob.n.to_bits());
        }
    }

    /// **Reset semantics**: whatever happened before, reset yields the fresh
    /// layout for the active bundle.
    #[test]
    fn reset_always_yields_fresh_line(
        params in arb_params(),
        inputs in arb_perturbations(200),
        p0 in 0.0f64..500.0,
        n0 in 0.0f64..500.0,
    ) {
        let mut sim = DelayedAffectSimulator::new(params);
        for u in &inputs {
            sim.step(*u, params.dt());
        }
        sim.reset(p0, n0);

        let line = sim.delay_line();
        prop_assert_eq!(line.len(), (params.delay_steps() + 10).max(8));
        prop_assert_eq!(line.step_count(), 0);
        prop_assert_eq!(line.at(0), Reservoirs::new(p0, n0));
        for slot in 1..line.len() {
            prop_assert_eq!(line.at(slot), Reservoirs::default());
        }
    }
}

// ============================================================================
// Delay Line Properties
// ============================================================================

proptest! {
    /// **Delay round trip**: the value read as delayed at step n is exactly
    /// the value pushed at step n - k.
    #[test]
    fn delayed_read_matches_history(k in 1usize..40, pushes in 1usize..300) {
        let mut line = DelayLine::new(k, Reservoirs::new(-1.0, -2.0));
        let mut history = vec![Reservoirs::new(-1.0, -2.0)];
        for step in 1..=pushes {
            let sentinel = Reservoirs::new(step as f64, (step * 1000) as f64);
            line.push(sentinel);
            history.push(sentinel);
            if step >= k {
                prop_assert_eq!(line.delayed(), history[step - k]);
            }
        }
        prop_assert_eq!(line.step_count(), pushes as u64);
    }

    /// **Buffer always outlasts the delay** by the safety margin.
    #[test]
    fn buffer_longer_than_delay(params in arb_params()) {
        prop_assert!(params.buffer_len() >= params.delay_steps() + 10);
        prop_assert!(params.buffer_len() >= 8);
        prop_assert!(params.delay_steps() >= 1);
    }
}

// ============================================================================
// Schedule Properties
// ============================================================================

proptest! {
    /// **First match wins**: the chosen window contains t and no earlier
    /// window does; falling back to default means none contains t.
    #[test]
    fn schedule_first_match_wins(
        windows in prop::collection::vec((-50.0f64..50.0, 0.1f64..30.0), 0..8),
        t in -60.0f64..90.0,
    ) {
        let mut schedule = ConfigurationSchedule::new(AffectParameters::default());
        for (idx, (start, len)) in windows.iter().enumerate() {
            let params = ParameterSpec { lambda: idx as f64, ..Default::default() }
                .validate()
                .unwrap();
            schedule.add_entry(params, *start, start + len).unwrap();
        }

        match schedule.lookup(t) {
            (ActiveWindow::Entry(idx), params) => {
                prop_assert!(schedule.entries()[idx].contains(t));
                prop_assert_eq!(params.lambda(), idx as f64);
                for earlier in &schedule.entries()[..idx] {
                    prop_assert!(!earlier.contains(t));
                }
            }
            (ActiveWindow::Default, params) => {
                prop_assert_eq!(params, &AffectParameters::default());
                prop_assert!(schedule.entries().iter().all(|e| !e.contains(t)));
            }
        }
    }
}
