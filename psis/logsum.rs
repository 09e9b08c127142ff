//! Log-space addition.
//!
//! `log_sum` adds two values held as natural logarithms without leaving log
//! space, so that weights spanning hundreds of orders of magnitude can be
//! accumulated without overflow or underflow.

use ndarray::ArrayView1;

/// Difference (in nats) beyond which the smaller term cannot affect the sum.
pub const NATS: f64 = 400.0;

/// Floor below which a log value is treated as `log(0)`.
pub const LOG_LIMIT: f64 = -f64::MAX / 100.0;

/// Returns `log(exp(x) + exp(y))`.
///
/// Commutative up to rounding. A term that sits more than [`NATS`] below the
/// other, or below [`LOG_LIMIT`], is dropped and the other term is returned
/// unchanged.
#[inline]
pub fn log_sum(x: f64, y: f64) -> f64 {
    let diff = y - x;
    if diff > NATS || x < LOG_LIMIT {
        return y;
    }
    if diff < -NATS || y < LOG_LIMIT {
        return x;
    }
    // Exponentiate the non-positive difference only.
    if diff < 0.0 {
        x + diff.exp().ln_1p()
    } else {
        y + (-diff).exp().ln_1p()
    }
}

/// Reduces a vector of log values to `log(sum(exp(values)))` by folding with
/// [`log_sum`] from the first element.
///
/// An empty view sums to zero, i.e. `-inf` in log space.
pub fn log_sum_exp(values: ArrayView1<f64>) -> f64 {
    let mut iter = values.iter();
    match iter.next() {
        Some(&first) => iter.fold(first, |acc, &v| log_sum(acc, v)),
        None => f64::NEG_INFINITY,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::{Array1, array};

    #[test]
    fn test_matches_direct_sum_for_moderate_values() {
        let x: f64 = 1.3;
        let y: f64 = -0.7;
        let expected = (x.exp() + y.exp()).ln();
        assert_relative_eq!(log_sum(x, y), expected, epsilon = 1e-14);
    }

    #[test]
    fn test_commutative() {
        let pairs = [(0.0, 0.0), (-3.5, 2.25), (700.0, 699.0), (-1e3, -1e3 + 5.0)];
        for (x, y) in pairs {
            assert_eq!(log_sum(x, y), log_sum(y, x), "x={x}, y={y}");
        }
    }

    #[test]
    fn test_no_overflow_for_large_arguments() {
        // exp(1000) overflows; log_sum must not.
        let s = log_sum(1000.0, 1000.0);
        assert_relative_eq!(s, 1000.0 + 2.0_f64.ln(), epsilon = 1e-12);
    }

    #[test]
    fn test_negligible_term_is_dropped() {
        assert_eq!(log_sum(0.0, -NATS - 1.0), 0.0);
        assert_eq!(log_sum(-NATS - 1.0, 0.0), 0.0);
    }

    #[test]
    fn test_floor_acts_as_log_zero() {
        let x = -2.5;
        assert_eq!(log_sum(x, LOG_LIMIT * 2.0), x);
        assert_eq!(log_sum(f64::NEG_INFINITY, x), x);
        assert_eq!(log_sum(x, f64::NEG_INFINITY), x);
    }

    #[test]
    fn test_log_sum_exp_of_uniform_vector() {
        let n = 250;
        let values = Array1::from_elem(n, -3.0);
        assert_relative_eq!(
            log_sum_exp(values.view()),
            -3.0 + (n as f64).ln(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_log_sum_exp_empty_and_single() {
        let empty: Array1<f64> = Array1::zeros(0);
        assert_eq!(log_sum_exp(empty.view()), f64::NEG_INFINITY);
        let single = array![4.2];
        assert_eq!(log_sum_exp(single.view()), 4.2);
    }
}
