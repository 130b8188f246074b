//! Noise-tolerant equality for measured values.
//!
//! Repeated reads of an unchanged physical quantity can differ in the last
//! bit, so finite values are compared with a relative epsilon:
//!
//! ```text
//! a ≈ b  ⇔  |a − b| ≤ max(|a|, |b|) · ε
//! ```
//!
//! Non-finite values mean "unknown". Unknown never equals a finite value,
//! and unknown equals unknown.

/// Relative tolerance used for all measured values (single-precision epsilon).
pub const EPSILON: f64 = f32::EPSILON as f64;

/// Returns true if the value carries a measurement.
#[inline]
pub fn is_known(value: f64) -> bool {
    value.is_finite()
}

/// Compares two measured values under the relative-epsilon policy.
pub fn approx_eq(a: f64, b: f64) -> bool {
    match (is_known(a), is_known(b)) {
        (false, false) => true,
        (true, true) => {
            let largest = a.abs().max(b.abs());
            (a - b).abs() <= largest * EPSILON
        }
        _ => false,
    }
}

/// Equality under the measurement policy, lifted to field groups.
pub trait ApproxEq {
    /// Returns true if `self` and `other` are indistinguishable measurements.
    fn approx_eq(&self, other: &Self) -> bool;
}

impl ApproxEq for f64 {
    fn approx_eq(&self, other: &Self) -> bool {
        approx_eq(*self, *other)
    }
}

impl<const N: usize> ApproxEq for [f64; N] {
    fn approx_eq(&self, other: &Self) -> bool {
        self.iter().zip(other.iter()).all(|(a, b)| approx_eq(*a, *b))
    }
}

impl<T: ApproxEq> ApproxEq for [T] {
    fn approx_eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().zip(other.iter()).all(|(a, b)| a.approx_eq(b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_identical_values_are_equal() {
        assert!(approx_eq(37.0, 37.0));
        assert!(approx_eq(0.0, 0.0));
        assert!(approx_eq(-122.4194, -122.4194));
    }

    #[test]
    fn test_zero_and_negative_zero_are_equal() {
        assert!(approx_eq(0.0, -0.0));
    }

    #[test]
    fn test_last_bit_jitter_is_equal() {
        let a: f64 = 51.477928;
        let b = f64::from_bits(a.to_bits() + 1);
        assert!(approx_eq(a, b));
    }

    #[test]
    fn test_half_epsilon_is_equal() {
        let l = 37.0;
        assert!(approx_eq(l, l * (1.0 + EPSILON / 2.0)));
    }

    #[test]
    fn test_double_epsilon_differs() {
        let l = 37.0;
        assert!(!approx_eq(l, l * (1.0 + 2.0 * EPSILON)));
    }

    #[test]
    fn test_unknown_equals_unknown() {
        assert!(approx_eq(f64::NAN, f64::NAN));
        assert!(approx_eq(f64::NAN, f64::INFINITY));
    }

    #[test]
    fn test_unknown_never_equals_known() {
        assert!(!approx_eq(f64::NAN, 0.0));
        assert!(!approx_eq(12.5, f64::NAN));
        assert!(!approx_eq(f64::NEG_INFINITY, -1.0e300));
    }

    #[test]
    fn test_array_comparison_is_elementwise() {
        assert!([1.0, f64::NAN, 3.0].approx_eq(&[1.0, f64::NAN, 3.0]));
        assert!(![1.0, 2.0, 3.0].approx_eq(&[1.0, 2.0, f64::NAN]));
    }

    #[test]
    fn test_slice_length_mismatch_differs() {
        let a: &[f64] = &[1.0, 2.0];
        let b: &[f64] = &[1.0, 2.0, 3.0];
        assert!(!a.approx_eq(b));
    }

    proptest! {
        #[test]
        fn prop_reflexive_for_finite(a in -1.0e9f64..1.0e9) {
            prop_assert!(approx_eq(a, a));
        }

        #[test]
        fn prop_symmetric(a in -1.0e6f64..1.0e6, b in -1.0e6f64..1.0e6) {
            prop_assert_eq!(approx_eq(a, b), approx_eq(b, a));
        }

        #[test]
        fn prop_known_vs_nan_differs(a in -1.0e9f64..1.0e9) {
            prop_assert!(!approx_eq(a, f64::NAN));
        }
    }
}
