//! Normal variates from uniform draws.
//!
//! Callers own the random source; this module only transforms uniforms, so
//! the same seed always yields the same variates.

use std::f64::consts::PI;

/// Box-Muller transform: two independent uniforms to two independent N(0, 1).
///
/// `u1` must lie in (0, 1]; values at or below zero are nudged to the smallest
/// positive double so the logarithm stays finite. `u2` is taken modulo 1.
pub fn box_muller(u1: f64, u2: f64) -> (f64, f64) {
    let u1 = if u1 <= 0.0 { f64::MIN_POSITIVE } else { u1.min(1.0) };
    let radius = (-2.0 * u1.ln()).sqrt();
    let theta = 2.0 * PI * u2;
    (radius * theta.cos(), radius * theta.sin())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn box_muller_known_point() {
        // u1 = e^(-1/2) gives radius 1; u2 = 0 gives angle 0.
        let (z0, z1) = box_muller((-0.5_f64).exp(), 0.0);
        assert!((z0 - 1.0).abs() < 1e-12);
        assert!(z1.abs() < 1e-12);
    }

    #[test]
    fn box_muller_zero_uniform_is_finite() {
        let (z0, z1) = box_muller(0.0, 0.25);
        assert!(z0.is_finite());
        assert!(z1.is_finite());
    }

    #[test]
    fn box_muller_moments_on_grid() {
        // Deterministic grid over the unit square approximates the moments.
        let steps = 200;
        let mut sum = 0.0;
        let mut sum_sq = 0.0;
        let mut n = 0.0;
        for i in 0..steps {
            for j in 0..steps {
                let u1 = (i as f64 + 0.5) / steps as f64;
                let u2 = (j as f64 + 0.5) / steps as f64;
                let (a, b) = box_muller(u1, u2);
                sum += a + b;
                sum_sq += a * a + b * b;
                n += 2.0;
            }
        }
        let mean = sum / n;
        let var = sum_sq / n - mean * mean;
        assert!(mean.abs() < 1e-6, "mean = {}", mean);
        assert!((var - 1.0).abs() < 0.02, "var = {}", var);
    }
}
