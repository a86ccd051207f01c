//! Deterministic float ordering.
//!
//! Picking and BVH construction sort by float keys; these helpers keep those
//! orderings total and reproducible.

use core::cmp::Ordering;

/// Canonicalize a floating-point value for deterministic ordering.
///
/// `-0.0` becomes `0.0` and all NaNs become a single canonical NaN.
pub fn canonical_f64(v: f64) -> f64 {
    if v == 0.0 {
        0.0
    } else if v.is_nan() {
        f64::NAN
    } else {
        v
    }
}

/// Deterministic total ordering for floats.
pub fn stable_total_cmp_f64(a: f64, b: f64) -> Ordering {
    canonical_f64(a).total_cmp(&canonical_f64(b))
}

/// Equality within `eps`, used for degenerate-geometry checks.
pub fn approx_eq(a: f64, b: f64, eps: f64) -> bool {
    (a - b).abs() <= eps
}

#[cfg(test)]
mod tests {
    use super::{approx_eq, canonical_f64, stable_total_cmp_f64};
    use core::cmp::Ordering;

    #[test]
    fn negative_zero_sorts_equal_to_zero() {
        assert_eq!(canonical_f64(-0.0).to_bits(), 0.0f64.to_bits());
        assert_eq!(stable_total_cmp_f64(-0.0, 0.0), Ordering::Equal);
    }

    #[test]
    fn nan_sorts_after_finite_values() {
        assert_eq!(stable_total_cmp_f64(1.0, f64::NAN), Ordering::Less);
        assert_eq!(stable_total_cmp_f64(f64::NAN, f64::NAN), Ordering::Equal);
    }

    #[test]
    fn approx_eq_uses_absolute_tolerance() {
        assert!(approx_eq(1.0, 1.0 + 1e-10, 1e-9));
        assert!(!approx_eq(1.0, 1.1, 1e-9));
    }
}
