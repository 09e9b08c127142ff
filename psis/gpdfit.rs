//! Empirical-Bayes estimation of Generalized Pareto Distribution parameters.
//!
//! The estimator follows Zhang & Stephens (2009): the scale is reparameterised
//! as `b = -k / sigma`, the profile likelihood is evaluated on a quadrature grid
//! of candidate `b` values placed from the sample quartile and maximum, and the
//! posterior mean of `b` under those grid weights gives the point estimate.
//!
//! # Sign convention
//!
//! The returned shape is the *negative* of Zhang & Stephens's `k`, so that
//! `k > 0` means a heavy, unbounded tail. This is the parameterisation that
//! [`crate::gpinv::gpinv`] and the smoother expect.
//!
//! # Preconditions
//!
//! `x` holds at least [`MIN_FIT_SAMPLES`] finite, non-negative exceedances in
//! ascending order, with a positive lower-quartile element. The functions here
//! do no validation of their own; the smoother guarantees these conditions
//! before calling in. Use [`gpdfit_unsorted`] when the order is not known.

use ndarray::{Array1, ArrayView1, Zip};

/// Strength of the prior used to place the quadrature grid.
pub const PRIOR: f64 = 3.0;

/// Fixed part of the grid size; the grid has `GRID_BASE + floor(sqrt(n))` points.
pub const GRID_BASE: usize = 30;

/// Quadrature weights below this are dropped before renormalising.
pub const NEGLIGIBLE_WEIGHT: f64 = 10.0 * f64::EPSILON;

/// Pseudo-sample size of the weakly informative prior that shrinks `k` toward 0.5.
pub const SHRINKAGE_A: f64 = 10.0;

/// Smallest sample the estimator is defined for.
pub const MIN_FIT_SAMPLES: usize = 5;

/// Shape `k` and scale `sigma` of a Generalized Pareto Distribution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GpdParameters {
    pub k: f64,
    pub sigma: f64,
}

/// The pruned quadrature over candidate `b` values.
///
/// `bs` and `weights` are aligned; the weights are non-negative and sum to one.
#[derive(Debug, Clone)]
pub struct QuadratureGrid {
    pub bs: Array1<f64>,
    pub weights: Array1<f64>,
}

impl QuadratureGrid {
    /// Posterior mean of `b` under the grid weights.
    pub fn posterior_mean(&self) -> f64 {
        self.bs.dot(&self.weights)
    }

    pub fn len(&self) -> usize {
        self.bs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bs.is_empty()
    }
}

/// A GPD point estimate together with the quadrature it was computed from.
#[derive(Debug, Clone)]
pub struct GpdFit {
    pub params: GpdParameters,
    pub quadrature: QuadratureGrid,
}

/// Estimates `(k, sigma)` from ascending exceedances.
pub fn gpdfit(x: ArrayView1<f64>) -> GpdParameters {
    gpdfit_with_quadrature(x).params
}

/// Sorts a copy of `x` and estimates `(k, sigma)` from it.
pub fn gpdfit_unsorted(x: ArrayView1<f64>) -> GpdParameters {
    let mut sorted = x.to_vec();
    sorted.sort_by(f64::total_cmp);
    gpdfit(ArrayView1::from(&sorted[..]))
}

/// Estimates `(k, sigma)` from ascending exceedances and also returns the
/// quadrature grid of the marginal posterior of `b`.
pub fn gpdfit_with_quadrature(x: ArrayView1<f64>) -> GpdFit {
    let n = x.len();
    debug_assert!(
        n >= MIN_FIT_SAMPLES,
        "gpdfit needs at least {MIN_FIT_SAMPLES} samples, got {n}"
    );
    let nf = n as f64;

    let m = GRID_BASE + nf.sqrt() as usize;
    let mf = m as f64;
    let quartile = (nf / 4.0 + 0.5) as usize - 1;
    let denom = PRIOR * x[quartile];
    let x_max = x[n - 1];

    let candidates = Array1::from_shape_fn(m, |i| {
        let i = (i + 1) as f64;
        (1.0 - (mf / (i - 0.5)).sqrt()) / denom + 1.0 / x_max
    });

    // Profile log-likelihood of each candidate.
    let log_lik = candidates.mapv(|b| {
        let k = profile_shape(x, b);
        nf * ((-b / k).ln() - k - 1.0)
    });

    // w_i = exp(L_i) / sum_j exp(L_j), written as a ratio of differences so
    // no single exponential is taken of a raw log-likelihood.
    let raw_weights = log_lik.mapv(|li| {
        let total: f64 = log_lik.iter().map(|&lj| (lj - li).exp()).sum();
        1.0 / total
    });

    let quadrature = prune_quadrature(candidates.view(), raw_weights.view());
    log::debug!(
        "GPD quadrature kept {} of {} grid points (n = {})",
        quadrature.len(),
        m,
        n
    );

    let b = quadrature.posterior_mean();
    let k = profile_shape(x, b);
    let sigma = -k / b;
    let k = k * nf / (nf + SHRINKAGE_A) + SHRINKAGE_A * 0.5 / (nf + SHRINKAGE_A);

    GpdFit {
        params: GpdParameters { k, sigma },
        quadrature,
    }
}

/// `mean_j log1p(-b * x_j)`: the shape that maximises the likelihood at fixed `b`.
fn profile_shape(x: ArrayView1<f64>, b: f64) -> f64 {
    x.iter().map(|&xj| (-b * xj).ln_1p()).sum::<f64>() / x.len() as f64
}

/// Drops negligible weights together with their candidates and renormalises.
fn prune_quadrature(candidates: ArrayView1<f64>, weights: ArrayView1<f64>) -> QuadratureGrid {
    let mut kept_bs = Vec::with_capacity(candidates.len());
    let mut kept_weights = Vec::with_capacity(weights.len());
    Zip::from(&candidates).and(&weights).for_each(|&b, &w| {
        if w >= NEGLIGIBLE_WEIGHT {
            kept_bs.push(b);
            kept_weights.push(w);
        }
    });

    let mut weights = Array1::from(kept_weights);
    let total = weights.sum();
    weights.mapv_inplace(|w| w / total);

    QuadratureGrid {
        bs: Array1::from(kept_bs),
        weights,
    }
}
