//! Inverse CDF of the Generalized Pareto Distribution.

use ndarray::{Array1, ArrayView1};

/// Evaluates the GPD quantile function at each probability in `p`.
///
/// * `sigma <= 0` yields a vector of NaN of the same length (a failed fit).
/// * `p` strictly inside `(0, 1)`: `expm1(-k * log1p(-p)) / k * sigma`, or the
///   exponential quantile `-log1p(-p) * sigma` when `|k| < f64::EPSILON`.
/// * `p == 0` maps to `0`; `p == 1` maps to `+inf` for `k >= 0` and to the
///   upper end of the support `-sigma / k` for `k < 0`.
/// * Anything else (outside `[0, 1]`, or NaN) is passed through unchanged.
///
/// When every probability is interior the whole vector is mapped in one pass;
/// otherwise each element is classified first. Both paths use the same
/// interior formula, so interior points agree exactly between them.
pub fn gpinv(p: ArrayView1<f64>, k: f64, sigma: f64) -> Array1<f64> {
    if sigma <= 0.0 {
        return Array1::from_elem(p.len(), f64::NAN);
    }

    let exponential = k.abs() < f64::EPSILON;
    let quantile = |pp: f64| {
        if exponential {
            -(-pp).ln_1p() * sigma
        } else {
            (-k * (-pp).ln_1p()).exp_m1() / k * sigma
        }
    };

    if p.iter().all(|&pp| is_interior(pp)) {
        return p.mapv(quantile);
    }

    p.mapv(|pp| {
        if is_interior(pp) {
            quantile(pp)
        } else if pp == 0.0 {
            0.0
        } else if pp == 1.0 {
            if k >= 0.0 { f64::INFINITY } else { -sigma / k }
        } else {
            pp
        }
    })
}

#[inline]
fn is_interior(p: f64) -> bool {
    p > 0.0 && p < 1.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::{Array1, array};

    #[test]
    fn test_known_values() {
        // k = 0.5, sigma = 1: x = (0.25^-0.5 - 1) / 0.5 = 2 at p = 0.75.
        let x = gpinv(array![0.75].view(), 0.5, 1.0);
        assert_relative_eq!(x[0], 2.0, epsilon = 1e-12);

        // Bounded support, k = -0.5, sigma = 2: x = (1 - sqrt(0.25)) / 0.5 * 2 = 2.
        let x = gpinv(array![0.75].view(), -0.5, 2.0);
        assert_relative_eq!(x[0], 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_boundaries() {
        for &(k, sigma) in &[(0.7, 1.3), (0.0, 2.0), (-0.4, 0.5)] {
            let x = gpinv(array![0.0].view(), k, sigma);
            assert_eq!(x[0], 0.0);
        }

        let x = gpinv(array![1.0].view(), 0.7, 1.3);
        assert_eq!(x[0], f64::INFINITY);
        let x = gpinv(array![1.0].view(), 0.0, 1.3);
        assert_eq!(x[0], f64::INFINITY);

        let x = gpinv(array![1.0].view(), -0.4, 0.5);
        assert_relative_eq!(x[0], 0.5 / 0.4, epsilon = 1e-15);
    }

    #[test]
    fn test_monotone_in_p() {
        let p = Array1::from_shape_fn(101, |i| i as f64 / 100.0);
        for &(k, sigma) in &[(0.9, 1.0), (0.2, 3.0), (0.0, 1.0), (-0.6, 2.0)] {
            let x = gpinv(p.view(), k, sigma);
            for w in x.windows(2) {
                assert!(w[1] >= w[0], "not monotone for k={k}: {} then {}", w[0], w[1]);
            }
        }
    }

    #[test]
    fn test_degenerate_k_is_exponential() {
        let p = array![0.01, 0.3, 0.5, 0.9, 0.999];
        let sigma = 1.7;
        for &k in &[0.0, 1e-17, -1e-17] {
            let x = gpinv(p.view(), k, sigma);
            for (xi, &pi) in x.iter().zip(p.iter()) {
                assert_relative_eq!(*xi, -(-pi).ln_1p() * sigma, max_relative = 1e-12);
            }
        }
    }

    #[test]
    fn test_small_k_is_continuous_with_exponential() {
        let p = array![0.2, 0.6, 0.95];
        let exp_q = gpinv(p.view(), 0.0, 1.0);
        let near = gpinv(p.view(), 1e-9, 1.0);
        for (a, b) in exp_q.iter().zip(near.iter()) {
            assert_relative_eq!(*a, *b, max_relative = 1e-6);
        }
    }

    #[test]
    fn test_invalid_scale_gives_nan() {
        let p = array![0.0, 0.25, 0.5, 1.0];
        for &sigma in &[0.0, -1.0] {
            let x = gpinv(p.view(), 0.3, sigma);
            assert_eq!(x.len(), p.len());
            assert!(x.iter().all(|v| v.is_nan()));
        }
    }

    #[test]
    fn test_fast_and_per_element_paths_agree() {
        let interior = array![0.05, 0.25, 0.5, 0.75, 0.95];
        let mixed = array![0.05, 0.25, 0.5, 0.75, 0.95, 0.0, 1.0];
        for &k in &[0.6, 0.0, -0.2] {
            let fast = gpinv(interior.view(), k, 1.4);
            let slow = gpinv(mixed.view(), k, 1.4);
            for i in 0..interior.len() {
                assert_eq!(fast[i], slow[i], "k={k}, i={i}");
            }
        }
    }

    #[test]
    fn test_out_of_range_passes_through() {
        let x = gpinv(array![-0.25, 0.5, 1.5].view(), 0.3, 1.0);
        assert_eq!(x[0], -0.25);
        assert_eq!(x[2], 1.5);
        assert!(x[1] > 0.0);
    }
}
