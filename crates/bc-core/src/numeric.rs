/// Floating point type for forcing values.
pub type Real = f64;

/// Absolute and relative slack for comparing interpolated values.
#[derive(Clone, Copy, Debug)]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-12,
            rel: 1e-9,
        }
    }
}

pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    diff <= tol.abs || diff <= tol.rel * a.abs().max(b.abs())
}

/// Value at step `step` of `steps` equal intervals from `start` to `end`.
///
/// `lerp_step(a, b, 1, 2)` is the midpoint. `steps` must be non-zero.
pub fn lerp_step(start: Real, end: Real, step: usize, steps: usize) -> Real {
    debug_assert!(steps > 0);
    let delta = (end - start) / steps as Real;
    start + delta * step as Real
}

/// True when `v` lies strictly inside the open interval spanned by `a` and `b`.
pub fn strictly_between(v: Real, a: Real, b: Real) -> bool {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    lo < v && v < hi
}
