//! Pareto smoothing of log importance weights.
//!
//! The largest weights are modelled as exceedances over a cutoff and fitted
//! with a Generalized Pareto Distribution; when the fitted shape `k` is at or
//! above [`K_MIN`] the tail is replaced by the fitted distribution's expected
//! order statistics. The whole vector is then renormalised in log space.
//!
//! The returned `k` is the diagnostic: `+inf` means the tail was too short to
//! fit and the weights were only shifted by their maximum, not renormalised.

use crate::gpdfit::{GpdParameters, MIN_FIT_SAMPLES, gpdfit};
use crate::gpinv::gpinv;
use crate::logsum::log_sum_exp;
use ndarray::{Array1, ArrayView1, ArrayViewMut1};
use thiserror::Error;

/// Shape at or above which the tail is replaced by smoothed order statistics.
pub const K_MIN: f64 = 1.0 / 3.0;

/// Upper bound on the tail length as a fraction of the sample size.
pub const TAIL_FRACTION: f64 = 0.2;

/// Tail length cap in units of `sqrt(n / r_eff)`.
pub const TAIL_SQRT_FACTOR: f64 = 3.0;

/// Violations of the smoother's input contract.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PsisError {
    #[error("Cannot smooth an empty weight vector.")]
    EmptyWeights,

    #[error("Log weight at index {index} is not finite ({value}).")]
    NonFiniteWeight { index: usize, value: f64 },

    #[error("Relative efficiency must be finite and positive, but was {0}.")]
    InvalidRelativeEfficiency(f64),
}

/// A weight paired with its position before sorting.
#[derive(Debug, Clone, Copy)]
struct RankedWeight {
    value: f64,
    index: usize,
}

/// Number of weights treated as the tail for a sample of size `n`:
/// `ceil(min(0.2 n, 3 sqrt(n / r_eff))) - 1`.
pub fn tail_cutoff_count(n: usize, r_eff: f64) -> usize {
    let nf = n as f64;
    let count = (TAIL_FRACTION * nf)
        .min(TAIL_SQRT_FACTOR * (nf / r_eff).sqrt())
        .ceil() as usize;
    count.saturating_sub(1)
}

/// Natural log of the smallest positive subnormal double; the lowest
/// cutoff that still has a non-zero exponential.
fn log_smallest_positive() -> f64 {
    f64::from_bits(1).ln()
}

pub(crate) fn validate_r_eff(r_eff: f64) -> Result<(), PsisError> {
    if r_eff.is_finite() && r_eff > 0.0 {
        Ok(())
    } else {
        Err(PsisError::InvalidRelativeEfficiency(r_eff))
    }
}

fn validate_weights(weights: ArrayView1<f64>) -> Result<(), PsisError> {
    if weights.is_empty() {
        return Err(PsisError::EmptyWeights);
    }
    match weights.iter().position(|w| !w.is_finite()) {
        Some(index) => Err(PsisError::NonFiniteWeight {
            index,
            value: weights[index],
        }),
        None => Ok(()),
    }
}

/// Pareto-smooths `weights` (natural-log importance weights) in place and
/// returns the fitted GPD shape `k`.
///
/// `r_eff` is the relative efficiency `N_eff / N` of the draws; `1.0` for
/// independent draws.
///
/// On return:
/// * `Ok(f64::INFINITY)`: fewer than five tail weights were available. The
///   vector has only been shifted so that its maximum is zero.
/// * `Ok(k)` with `k >= K_MIN`: the tail has been replaced by smoothed order
///   statistics, truncated at the largest raw weight, and the vector
///   renormalised so that `sum(exp(w)) == 1`.
/// * `Ok(k)` with `k < K_MIN`: the raw weights are kept and renormalised.
///
/// A fit with non-positive scale leaves NaN in the smoothed tail slots.
///
/// # Errors
///
/// Returns [`PsisError`] for an empty vector, a non-finite weight, or an
/// invalid `r_eff`. The vector is left untouched in that case.
pub fn psislw(mut weights: ArrayViewMut1<f64>, r_eff: f64) -> Result<f64, PsisError> {
    validate_weights(weights.view())?;
    validate_r_eff(r_eff)?;

    let n = weights.len();
    let cutoff_count = tail_cutoff_count(n, r_eff);

    let max = weights.fold(f64::NEG_INFINITY, |acc, &w| acc.max(w));
    weights.mapv_inplace(|w| w - max);

    let mut ranked: Vec<RankedWeight> = weights
        .iter()
        .enumerate()
        .map(|(index, &value)| RankedWeight { value, index })
        .collect();
    // Stable, so tied weights keep their original order.
    ranked.sort_by(|a, b| a.value.total_cmp(&b.value));

    let split = n - cutoff_count;
    let xcutoff = ranked[split - 1].value.max(log_smallest_positive());
    let tail = &ranked[split..];

    if tail.len() < MIN_FIT_SAMPLES {
        log::warn!(
            "Only {} tail weights out of {}; need {} to fit a Pareto tail. Weights left unsmoothed.",
            tail.len(),
            n,
            MIN_FIT_SAMPLES
        );
        return Ok(f64::INFINITY);
    }

    let exp_cutoff = xcutoff.exp();
    let exceedances: Array1<f64> = tail.iter().map(|r| r.value.exp() - exp_cutoff).collect();
    let GpdParameters { k, sigma } = gpdfit(exceedances.view());
    log::debug!(
        "PSIS: n = {}, tail = {}, log cutoff = {:.6}, k = {:.6}, sigma = {:.6e}",
        n,
        tail.len(),
        xcutoff,
        k,
        sigma
    );

    if k >= K_MIN {
        replace_tail(&mut weights, tail, GpdParameters { k, sigma }, exp_cutoff);
    }

    let sum_logs = log_sum_exp(weights.view());
    weights.mapv_inplace(|w| w - sum_logs);

    Ok(k)
}

/// Like [`psislw`], but smooths a copy and leaves `weights` unchanged.
pub fn psislw_copy(weights: ArrayView1<f64>, r_eff: f64) -> Result<(Array1<f64>, f64), PsisError> {
    let mut smoothed = weights.to_owned();
    let k = psislw(smoothed.view_mut(), r_eff)?;
    Ok((smoothed, k))
}

/// Writes the fitted expected order statistics into the tail slots, then
/// truncates every weight at zero (the largest raw log weight).
fn replace_tail(
    weights: &mut ArrayViewMut1<f64>,
    tail: &[RankedWeight],
    params: GpdParameters,
    exp_cutoff: f64,
) {
    let n2 = tail.len() as f64;
    let probabilities = Array1::from_shape_fn(tail.len(), |i| (i as f64 + 0.5) / n2);
    let quantiles = gpinv(probabilities.view(), params.k, params.sigma);
    if params.sigma <= 0.0 {
        log::warn!(
            "GPD fit returned non-positive scale {:.3e}; smoothed tail is NaN.",
            params.sigma
        );
    }

    for (slot, &q) in tail.iter().zip(quantiles.iter()) {
        weights[slot.index] = (q + exp_cutoff).ln();
    }

    // Written as a comparison so NaN survives the truncation.
    weights.mapv_inplace(|w| if w > 0.0 { 0.0 } else { w });
}
