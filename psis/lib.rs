#![deny(dead_code)]
#![deny(unused_imports)]
#![deny(unused_variables)]

//! Pareto-smoothed importance sampling.
//!
//! [`psislw`] stabilises a vector of log importance weights by fitting a
//! Generalized Pareto Distribution to its right tail ([`gpdfit`]) and
//! replacing the tail with the fitted quantiles ([`gpinv`]). The fitted shape
//! `k` it returns is the reliability diagnostic for the importance-sampling
//! estimate.

pub mod gpdfit;
pub mod gpinv;
pub mod io;
pub mod logsum;
pub mod options;
pub mod smooth;

pub use gpdfit::{
    GpdFit, GpdParameters, QuadratureGrid, gpdfit, gpdfit_unsorted, gpdfit_with_quadrature,
};
pub use gpinv::gpinv;
pub use logsum::{log_sum, log_sum_exp};
pub use options::{OptionsError, PsisOptions};
pub use smooth::{K_MIN, PsisError, psislw, psislw_copy, tail_cutoff_count};
