//! Summary statistics over f64 slices.
//!
//! All functions skip NaN values; empty (or all-NaN) input yields NaN.

use std::cmp::Ordering;

/// Copy the finite values of `values` and sort them ascending.
pub fn sorted_finite(values: &[f64]) -> Vec<f64> {
    let mut out: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    out.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    out
}

/// Arithmetic mean of non-NaN values.
pub fn mean(values: &[f64]) -> f64 {
    let mut sum = 0.0;
    let mut n = 0usize;
    for v in values.iter().filter(|v| !v.is_nan()) {
        sum += v;
        n += 1;
    }
    if n == 0 {
        return f64::NAN;
    }
    sum / n as f64
}

/// Population standard deviation of non-NaN values.
pub fn std_dev(values: &[f64]) -> f64 {
    let m = mean(values);
    if m.is_nan() {
        return f64::NAN;
    }
    let mut ss = 0.0;
    let mut n = 0usize;
    for v in values.iter().filter(|v| !v.is_nan()) {
        ss += (v - m).powi(2);
        n += 1;
    }
    (ss / n as f64).sqrt()
}

/// Median of non-NaN values.
pub fn median(values: &[f64]) -> f64 {
    let sorted = sorted_finite(values);
    if sorted.is_empty() {
        return f64::NAN;
    }
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Linear quantile interpolation over an ascending slice, `u` in [0, 1].
pub fn quantile_sorted(sorted: &[f64], u: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    if sorted.len() == 1 {
        return sorted[0];
    }

    let u = u.clamp(0.0, 1.0);
    let idx = u * (sorted.len() as f64 - 1.0);
    let lo = idx.floor() as usize;
    let hi = idx.ceil() as usize;

    if lo == hi || hi >= sorted.len() {
        return sorted[lo.min(sorted.len() - 1)];
    }

    let frac = idx - lo as f64;
    sorted[lo] * (1.0 - frac) + sorted[hi] * frac
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_and_std() {
        let v = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_eq!(mean(&v), 5.0);
        assert_eq!(std_dev(&v), 2.0);
    }

    #[test]
    fn test_nan_is_skipped() {
        let v = [1.0, f64::NAN, 3.0];
        assert_eq!(mean(&v), 2.0);
        assert_eq!(median(&v), 2.0);
        assert!(mean(&[f64::NAN]).is_nan());
        assert!(std_dev(&[]).is_nan());
    }

    #[test]
    fn test_median_even_odd() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), 2.5);
    }

    #[test]
    fn test_quantile_interpolation() {
        let sorted = [0.0, 10.0];
        assert_eq!(quantile_sorted(&sorted, 0.0), 0.0);
        assert_eq!(quantile_sorted(&sorted, 0.25), 2.5);
        assert_eq!(quantile_sorted(&sorted, 1.0), 10.0);
    }
}
