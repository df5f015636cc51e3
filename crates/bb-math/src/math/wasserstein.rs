//! 1-Wasserstein (earth mover's) distance between empirical samples.
//!
//! ```text
//! W_1(P, Q) = ∫_0^1 |F_P^{-1}(u) - F_Q^{-1}(u)| du
//! ```
//!
//! For equal-size samples this is the mean absolute difference of the sorted
//! values. Unequal sizes are compared on a common quantile grid sized to the
//! larger sample.

use crate::{quantile_sorted, sorted_finite, std_dev};

/// 1-Wasserstein distance. NaN values are ignored; empty input yields 0.
pub fn wasserstein_1d(p: &[f64], q: &[f64]) -> f64 {
    let p_sorted = sorted_finite(p);
    let q_sorted = sorted_finite(q);
    if p_sorted.is_empty() || q_sorted.is_empty() {
        return 0.0;
    }

    if p_sorted.len() == q_sorted.len() {
        let n = p_sorted.len() as f64;
        let sum: f64 = p_sorted
            .iter()
            .zip(q_sorted.iter())
            .map(|(pi, qi)| (pi - qi).abs())
            .sum();
        return sum / n;
    }

    let n = p_sorted.len().max(q_sorted.len());
    let mut total = 0.0;
    for i in 0..n {
        let u = (i as f64 + 0.5) / n as f64;
        total += (quantile_sorted(&p_sorted, u) - quantile_sorted(&q_sorted, u)).abs();
    }
    total / n as f64
}

/// Wasserstein distance divided by the reference standard deviation.
///
/// A constant reference column has no natural scale; the raw distance is
/// returned in that case.
pub fn wasserstein_normed(reference: &[f64], current: &[f64]) -> f64 {
    let distance = wasserstein_1d(reference, current);
    let sd = std_dev(reference);
    if sd.is_finite() && sd > f64::EPSILON {
        distance / sd
    } else {
        distance
    }
}
