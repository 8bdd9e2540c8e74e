//! Sigmoid Gate - smooth saturating response curve
//!
//! Maps a normalized balance value into a weighting used to interpolate drive
//! intensities and decay time constants. The base curve is the error function
//! shifted by 2, which keeps it analytic while breaking symmetry about the
//! origin:
//!
//! ```text
//! f(x)           = erf(x - 2)
//! response(g, x) = (f(g·x) - f(0)) / (f(g) - f(0))
//! ```
//!
//! For `x` in `[0, 1]` and `g > 0` the response stays in `[0, 1]` and is
//! monotonically increasing, with `g` controlling how sharp the transition is.

/// Horizontal shift applied to the error function.
const BASE_SHIFT: f64 = 2.0;

/// The unnormalized base curve `erf(x - 2)`.
#[inline]
pub fn base_curve(x: f64) -> f64 {
    libm::erf(x - BASE_SHIFT)
}

/// Normalized gate response for shape coefficient `gain` at `x`.
///
/// Returns `0.0` when the normalizing denominator vanishes (e.g. `gain == 0`).
pub fn response(gain: f64, x: f64) -> f64 {
    let origin = base_curve(0.0);
    let denom = base_curve(gain) - origin;
    if denom == 0.0 {
        return 0.0;
    }
    (base_curve(gain * x) - origin) / denom
}
