use crate::Scalar;

/// Largest finite value `f64` rounds to without losing integer precision
const MAX_EXACT: Scalar = 9_007_199_254_740_992.0;

/// Round to the nearest integer, ties to even, saturating at zero and at the
/// largest exactly representable integer.
pub(crate) fn round_unsigned(value: Scalar) -> u64 {
    if value.is_nan() {
        return 0;
    }
    value.round_ties_even().clamp(0.0, MAX_EXACT) as u64
}
