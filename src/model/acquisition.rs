//! Upper-Confidence-Bound acquisition.
//!
//! UCB(x) = mu(x) + beta * sqrt(max(0, sigma^2(x))). Candidates are drawn
//! uniformly from the unit hypercube by the injected RNG and the arg-max
//! wins; ties break toward the lowest index.

use crate::engine::rng::BrewRng;
use crate::error::{BrewError, BrewResult};

/// UCB score for one candidate.
#[must_use]
pub fn ucb(mean: f64, variance: f64, beta: f64) -> f64 {
    mean + beta * variance.max(0.0).sqrt()
}

/// Index of the maximum-UCB candidate among parallel mean/variance arrays.
///
/// # Errors
///
/// Returns `InvalidInput` if the arrays are empty or differ in length.
pub fn select_best(means: &[f64], variances: &[f64], beta: f64) -> BrewResult<usize> {
    if means.is_empty() {
        return Err(BrewError::invalid_input("no candidates to score"));
    }
    if means.len() != variances.len() {
        return Err(BrewError::invalid_input(format!(
            "candidate score mismatch: {} means vs {} variances",
            means.len(),
            variances.len()
        )));
    }

    let mut best_idx = 0;
    let mut best_score = ucb(means[0], variances[0], beta);
    for i in 1..means.len() {
        let score = ucb(means[i], variances[i], beta);
        if score > best_score {
            best_score = score;
            best_idx = i;
        }
    }

    Ok(best_idx)
}

/// Draw `n` uniform candidate points from [0, 1)^d.
#[must_use]
pub fn sample_candidates(rng: &mut BrewRng, n: usize, d: usize) -> Vec<Vec<f64>> {
    (0..n).map(|_| rng.sample_unit_vec(d)).collect()
}
