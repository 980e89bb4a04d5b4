/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Fixed Gauss-Legendre quadrature and Gaussian averages of parameters

use super::errors::{Result, UtilsError};
use once_cell::sync::Lazy;
use statrs::distribution::{Continuous, Normal};
use std::collections::HashMap;
use std::f64::consts::PI;
use std::sync::{Arc, RwLock};

/// Half width of the parameter window of a Gaussian average in units of sigma
pub const GAUSS_WINDOW: f64 = 3.0902;

type Rule = Arc<(Vec<f64>, Vec<f64>)>;

static RULES: Lazy<RwLock<HashMap<usize, Rule>>> = Lazy::new(|| RwLock::new(HashMap::new()));

fn compute_rule(n: usize) -> (Vec<f64>, Vec<f64>) {
    let mut nodes = vec![0.0; n];
    let mut weights = vec![0.0; n];
    let m = n.div_ceil(2);
    for i in 0..m {
        // Chebyshev guess, then Newton on P_n
        let mut z = (PI * (i as f64 + 0.75) / (n as f64 + 0.5)).cos();
        let mut dp = 1.0;
        for _ in 0..100 {
            let mut p1 = 1.0;
            let mut p2 = 0.0;
            for j in 0..n {
                let p3 = p2;
                p2 = p1;
                p1 = ((2 * j + 1) as f64 * z * p2 - j as f64 * p3) / (j + 1) as f64;
            }
            dp = n as f64 * (z * p1 - p2) / (z * z - 1.0);
            let z1 = z;
            z = z1 - p1 / dp;
            if (z - z1).abs() < 1e-15 {
                break;
            }
        }
        nodes[i] = -z;
        nodes[n - 1 - i] = z;
        let w = 2.0 / ((1.0 - z * z) * dp * dp);
        weights[i] = w;
        weights[n - 1 - i] = w;
    }
    (nodes, weights)
}

/// Nodes and weights of the `n` point Gauss-Legendre rule on [-1, 1]
pub fn gauss_legendre(n: usize) -> Rule {
    if let Ok(cache) = RULES.read() {
        if let Some(rule) = cache.get(&n) {
            return rule.clone();
        }
    }
    let rule = Arc::new(compute_rule(n));
    if let Ok(mut cache) = RULES.write() {
        cache.insert(n, rule.clone());
    }
    rule
}

/// Parameter values and normalized weights of a Gaussian average
///
/// The window covers `mean ± 3.0902 sigma` with `n` Gauss-Legendre points. A zero
/// sigma returns the single point `mean`.
pub fn normal_weights(mean: f64, sigma: f64, n: usize) -> Result<Vec<(f64, f64)>> {
    if sigma == 0.0 {
        return Ok(vec![(mean, 1.0)]);
    }
    if sigma < 0.0 || !sigma.is_finite() {
        return Err(UtilsError::Math(format!(
            "width of a Gaussian average must be positive, got {sigma}"
        )));
    }
    if n == 0 {
        return Err(UtilsError::Math(
            "Gaussian average needs at least one point".to_string(),
        ));
    }
    let normal = Normal::new(mean, sigma).map_err(|e| UtilsError::Math(e.to_string()))?;
    let rule = gauss_legendre(n);
    let half = GAUSS_WINDOW * sigma;
    let points: Vec<(f64, f64)> = rule
        .0
        .iter()
        .zip(rule.1.iter())
        .map(|(x, w)| {
            let v = mean + half * x;
            (v, w * normal.pdf(v))
        })
        .collect();
    let total: f64 = points.iter().map(|(_, w)| w).sum();
    Ok(points.into_iter().map(|(v, w)| (v, w / total)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_gauss_legendre_exactness() {
        let rule = gauss_legendre(5);
        let sum: f64 = rule.1.iter().sum();
        assert_relative_eq!(sum, 2.0, epsilon = 1e-14);
        // exact for degree 9
        let integral: f64 = rule
            .0
            .iter()
            .zip(rule.1.iter())
            .map(|(x, w)| w * x.powi(8))
            .sum();
        assert_relative_eq!(integral, 2.0 / 9.0, epsilon = 1e-14);
    }

    #[test]
    fn test_normal_weights() {
        let points = normal_weights(2.0, 0.5, 21).unwrap();
        let total: f64 = points.iter().map(|(_, w)| w).sum();
        assert_relative_eq!(total, 1.0, epsilon = 1e-12);
        let mean: f64 = points.iter().map(|(v, w)| v * w).sum();
        assert_relative_eq!(mean, 2.0, epsilon = 1e-12);
        assert_eq!(normal_weights(2.0, 0.0, 21).unwrap(), vec![(2.0, 1.0)]);
        assert!(normal_weights(2.0, -1.0, 21).is_err());
    }
}
