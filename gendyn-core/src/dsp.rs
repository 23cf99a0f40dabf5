//! Scalar DSP helpers shared by the stochastic synthesis path.
//!
//! Design goals:
//! - `no_std` ready (guarded by the crate features `std` / `no-std`)
//! - Math backend selection that works in both `std` and `no_std` contexts
//! - Clean, side-effect free helpers that are easy to test
//!
//! Everything here runs on the audio thread, so nothing allocates, branches
//! are cheap and every function is total over its documented domain.
//!
//! Conventions:
//! - All functions are `#[inline]` where useful to help the optimizer.
//! - Control and walk values are `f64`; only the rendered sample is `f32`.

use cfg_if::cfg_if;

// ----------------------------- Math backend selection -----------------------------

cfg_if! {
    // libm (C math) whenever std is unavailable
    if #[cfg(any(feature = "no-std", not(feature = "std")))] {
        #[inline] pub(crate) fn m_abs(x: f64) -> f64 { libm::fabs(x) }
        #[inline] pub(crate) fn m_floor(x: f64) -> f64 { libm::floor(x) }
        #[cfg(feature = "exact-distributions")]
        #[inline] pub(crate) fn m_exp(x: f64) -> f64 { libm::exp(x) }
        #[cfg(feature = "exact-distributions")]
        #[inline] pub(crate) fn m_atan(x: f64) -> f64 { libm::atan(x) }
    // std backend
    } else {
        #[inline] pub(crate) fn m_abs(x: f64) -> f64 { x.abs() }
        #[inline] pub(crate) fn m_floor(x: f64) -> f64 { x.floor() }
        #[cfg(feature = "exact-distributions")]
        #[inline] pub(crate) fn m_exp(x: f64) -> f64 { x.exp() }
        #[cfg(feature = "exact-distributions")]
        #[inline] pub(crate) fn m_atan(x: f64) -> f64 { x.atan() }
    }
}

/// IEEE 754 `remainder`: `x - n*y` with `n` the integer nearest `x/y`
/// (ties to even). std has no equivalent, so both backends use libm.
#[inline]
fn m_remainder(x: f64, y: f64) -> f64 {
    libm::remainder(x, y)
}

// --------------------------------- Utilities -------------------------------------

/// Clamp `x` into `[lo, hi]`. NaN collapses to `lo` so that malformed control
/// input can never reach the walks.
#[inline]
pub fn clamp(x: f64, lo: f64, hi: f64) -> f64 {
    if x.is_nan() {
        lo
    } else {
        num_traits::clamp(x, lo, hi)
    }
}

/// Linear interpolation in convex form: `(1 - t) * a + t * b`.
///
/// For `t` in `[0, 1]` the result never leaves the interval spanned by
/// `a` and `b`.
#[inline]
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    (1.0 - t) * a + t * b
}

/// Drop the integer part of a non-negative phase, keeping it in `[0, 1)`.
#[inline]
pub fn wrap_phase01(p: f64) -> f64 {
    let w = p - m_floor(p);
    if w >= 1.0 { 0.0 } else { w }
}

// --------------------------------- Boundary reflection ---------------------------

/// Fold `value` back into `[lower, upper]` by triangular (mirror) reflection.
///
/// Values inside the interval are returned untouched. Values outside bounce
/// off the edges instead of wrapping, so a walk pushed past a bound comes
/// back continuously:
///
/// ```
/// use gendyn_core::dsp::mirror;
/// assert_eq!(mirror(0.25, -1.0, 1.0), 0.25);
/// assert_eq!(mirror(1.5, -1.0, 1.0), 0.5);
/// assert_eq!(mirror(-1.25, 0.0, 1.0), 0.75);
/// ```
///
/// Total over all inputs:
/// - `lower == upper` returns that single value
/// - reversed bounds are swapped first
/// - a non-finite `value` folds to `lower`
#[inline]
pub fn mirror(value: f64, lower: f64, upper: f64) -> f64 {
    let (lower, upper) = if lower <= upper { (lower, upper) } else { (upper, lower) };

    if value >= lower && value <= upper {
        return value;
    }
    if !value.is_finite() {
        return lower;
    }

    let fold_range = 2.0 * m_abs(lower - upper);
    if fold_range == 0.0 {
        return lower;
    }

    // |remainder| <= fold_range / 2 == upper - lower; min() guards the last ulp.
    (lower + m_abs(m_remainder(value - lower, fold_range))).min(upper)
}

// --------------------------------- Tests (std only) ------------------------------
