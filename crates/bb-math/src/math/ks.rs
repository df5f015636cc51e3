//! Two-sample Kolmogorov-Smirnov test.
//!
//! The statistic is the largest vertical gap between the two empirical CDFs:
//!
//! ```text
//! D = sup_x |F_n(x) - G_m(x)|
//! ```
//!
//! The p-value uses the asymptotic Kolmogorov distribution with the
//! small-sample correction `λ = (√nₑ + 0.12 + 0.11/√nₑ) · D`, where
//! `nₑ = n·m / (n + m)`.

const KOLMOGOROV_MAX_TERMS: usize = 100;
const KOLMOGOROV_EPS1: f64 = 1.0e-6;
const KOLMOGOROV_EPS2: f64 = 1.0e-16;

/// Outcome of a two-sample KS test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KsTest {
    pub statistic: f64,
    pub p_value: f64,
}

/// Kolmogorov survival function `Q_KS(λ) = 2 Σ (-1)^(j-1) e^(-2 j² λ²)`.
pub fn kolmogorov_sf(lambda: f64) -> f64 {
    if lambda.is_nan() {
        return f64::NAN;
    }
    if lambda <= 0.0 {
        return 1.0;
    }
    let a2 = -2.0 * lambda * lambda;
    let mut fac = 2.0;
    let mut sum = 0.0;
    let mut prev_term = 0.0_f64;
    for j in 1..=KOLMOGOROV_MAX_TERMS {
        let jf = j as f64;
        let term = fac * (a2 * jf * jf).exp();
        sum += term;
        if term.abs() <= KOLMOGOROV_EPS1 * prev_term.abs() || term.abs() <= KOLMOGOROV_EPS2 * sum {
            return sum.clamp(0.0, 1.0);
        }
        fac = -fac;
        prev_term = term;
    }
    // Series failed to converge: only happens for tiny λ where Q ≈ 1.
    1.0
}

/// KS statistic for two already-sorted, NaN-free samples.
pub fn ks_statistic_sorted(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len();
    let m = b.len();
    if n == 0 || m == 0 {
        return 0.0;
    }
    let (nf, mf) = (n as f64, m as f64);
    let mut i = 0;
    let mut j = 0;
    let mut d = 0.0_f64;
    while i < n && j < m {
        let x = if a[i] <= b[j] { a[i] } else { b[j] };
        while i < n && a[i] <= x {
            i += 1;
        }
        while j < m && b[j] <= x {
            j += 1;
        }
        d = d.max((i as f64 / nf - j as f64 / mf).abs());
    }
    d
}

/// Two-sample KS test. NaN values are ignored.
///
/// Returns `None` when either sample has no finite values.
pub fn ks_two_sample(reference: &[f64], current: &[f64]) -> Option<KsTest> {
    let a = crate::sorted_finite(reference);
    let b = crate::sorted_finite(current);
    if a.is_empty() || b.is_empty() {
        return None;
    }
    let statistic = ks_statistic_sorted(&a, &b);
    let n = a.len() as f64;
    let m = b.len() as f64;
    let ne = (n * m / (n + m)).sqrt();
    let lambda = (ne + 0.12 + 0.11 / ne) * statistic;
    Some(KsTest {
        statistic,
        p_value: kolmogorov_sf(lambda),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kolmogorov_sf_reference_values() {
        // Q_KS(1.36) ≈ 0.049 (the classic 5% critical value)
        let q = kolmogorov_sf(1.36);
        assert!((q - 0.0494).abs() < 1e-3, "Q(1.36) = {}", q);
        assert_eq!(kolmogorov_sf(0.0), 1.0);
        assert!(kolmogorov_sf(5.0) < 1e-20);
    }

    #[test]
    fn ks_identical_samples() {
        let data: Vec<f64> = (0..50).map(|i| i as f64).collect();
        let test = ks_two_sample(&data, &data).unwrap();
        assert_eq!(test.statistic, 0.0);
        assert_eq!(test.p_value, 1.0);
    }

    #[test]
    fn ks_disjoint_samples() {
        let a: Vec<f64> = (0..50).map(|i| i as f64).collect();
        let b: Vec<f64> = (100..150).map(|i| i as f64).collect();
        let test = ks_two_sample(&a, &b).unwrap();
        assert_eq!(test.statistic, 1.0);
        assert!(test.p_value < 1e-10);
    }

    #[test]
    fn ks_handles_ties() {
        let a = [1.0, 1.0, 2.0, 2.0];
        let b = [1.0, 2.0, 2.0, 2.0];
        // After x=1: F=0.5, G=0.25
        let d = ks_statistic_sorted(&a, &b);
        assert!((d - 0.25).abs() < 1e-12);
    }

    #[test]
    fn ks_ignores_nan_and_rejects_empty() {
        let a = [f64::NAN, 1.0, 2.0];
        let b = [1.0, 2.0];
        let test = ks_two_sample(&a, &b).unwrap();
        assert_eq!(test.statistic, 0.0);
        assert!(ks_two_sample(&[f64::NAN], &b).is_none());
    }
}
