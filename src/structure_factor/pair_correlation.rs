/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Pair correlation g(r) from a structure factor by sine transform

use super::common::ensure_finite;
use super::errors::{Result, StructureFactorError};
use crate::data::DataArray;
use crate::utils::math::{interp, linspace, simpson, trapezoid};
use log::debug;
use rayon::prelude::*;
use std::f64::consts::PI;

/// Number of r values below which the transform runs sequentially
const PARALLEL_THRESHOLD: usize = 256;

/// Radial pair correlation from a structure factor
///
/// S(q)-1 is interpolated onto an even grid of `interpolate_factor` times the input
/// length starting at zero, sine transformed and evaluated at `r_m = 2π m/(n δ)`.
/// The result is normalized so that the mean of |g(r)-1| around `r` in `|r-R| < R/2`
/// equals one, the low r region then shows the hard core.
///
/// # Arguments
///
/// * `sq` - Structure factor with x = q and y = S(q)
/// * `r` - Characteristic distance used for normalization, usually the diameter
/// * `interpolate_factor` - Oversampling of the q grid
///
/// # Returns
///
/// Columns `r` and `gr` with attribute `n0 = -1/(2π²)∫q²(S-1)dq`
pub fn sq2gr(sq: &DataArray, r: f64, interpolate_factor: usize) -> Result<DataArray> {
    let sorted = sq.sorted_by_x()?;
    let q = sorted.x()?.to_vec();
    let s = sorted.y()?.to_vec();
    if q.len() < 2 || interpolate_factor == 0 {
        return Err(StructureFactorError::InvalidParameter(
            "sq2gr needs at least two q values and a positive interpolation factor".to_string(),
        ));
    }
    let qmax = q[q.len() - 1];
    if qmax <= 0.0 {
        return Err(StructureFactorError::InvalidParameter(
            "sq2gr needs positive wavevectors".to_string(),
        ));
    }

    let nn = interpolate_factor * q.len();
    let delta = qmax / nn as f64;
    let grid = linspace(0.0, qmax, nn);
    let s_minus_1: Vec<f64> = s.iter().map(|v| v - 1.0).collect();
    let weighted: Vec<f64> = interp(&grid, &q, &s_minus_1)?
        .iter()
        .zip(grid.iter())
        .map(|(y, x)| y * x)
        .collect();

    let radii: Vec<f64> = (1..nn / 2)
        .map(|m| 2.0 * PI * m as f64 / (nn as f64 * delta))
        .collect();
    let transform = |&rr: &f64| {
        let sum: f64 = grid
            .iter()
            .zip(weighted.iter())
            .map(|(x, w)| w * (x * rr).sin())
            .sum();
        sum * delta / (2.0 * PI * PI * rr)
    };
    let h: Vec<f64> = if radii.len() < PARALLEL_THRESHOLD {
        radii.iter().map(transform).collect()
    } else {
        radii.par_iter().map(transform).collect()
    };

    let window: Vec<f64> = radii
        .iter()
        .zip(h.iter())
        .filter(|(rr, _)| (*rr - r).abs() < r / 2.0)
        .map(|(_, v)| *v)
        .collect();
    if window.is_empty() {
        return Err(StructureFactorError::InvalidParameter(format!(
            "no r value within {r} ± {}, extend the q range",
            r / 2.0
        )));
    }
    let factor = (window.iter().sum::<f64>() / window.len() as f64).abs();
    debug!("sq2gr normalization {factor:.4e} from {} points", window.len());
    let gr: Vec<f64> = h.iter().map(|v| 1.0 + v / factor).collect();
    ensure_finite("gr", &gr)?;

    let q2s: Vec<f64> = q.iter().zip(s.iter()).map(|(x, y)| x * x * (y - 1.0)).collect();
    let n0 = -simpson(&q2s, &q) / (2.0 * PI * PI);

    let mut result = DataArray::new();
    result.push_column("r", radii)?;
    result.push_column("gr", gr)?;
    result.set_attr("n0", n0);
    Ok(result)
}

/// Hard sphere radial distribution function in diameter units
///
/// `g(r) = 1 + 1/(12π η r) ∫ (S(K)-1) K sin(K r) dK` with `K = q σ`.
pub fn radial_distribution_hs(k: &[f64], s: &[f64], eta: f64, r: &[f64]) -> Vec<f64> {
    let s_minus_1_k: Vec<f64> = k.iter().zip(s.iter()).map(|(kk, ss)| (ss - 1.0) * kk).collect();
    r.iter()
        .map(|&rr| {
            let integrand: Vec<f64> = k
                .iter()
                .zip(s_minus_1_k.iter())
                .map(|(kk, v)| v * (kk * rr).sin())
                .collect();
            1.0 + trapezoid(&integrand, k) / (12.0 * PI * eta * rr)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure_factor::percus_yevick::percus_yevick_values;
    use approx::assert_relative_eq;

    #[test]
    fn test_hard_sphere_core_is_empty() {
        let k: Vec<f64> = (0..8192).map(|i| i as f64 * 0.05).collect();
        // radius 0.5 gives diameter units
        let s = percus_yevick_values(&k, 0.5, 0.3);
        let g = radial_distribution_hs(&k, &s, 0.3, &[0.5, 0.95, 1.5]);
        assert!(g[0].abs() < 0.05, "g(0.5) = {}", g[0]);
        assert!(g[1].abs() < 0.1, "g(0.95) = {}", g[1]);
        assert!(g[2] > 0.5);
    }

    #[test]
    fn test_sq2gr_shape_and_n0() {
        let q = linspace(0.01, 40.0, 400);
        let s = percus_yevick_values(&q, 1.0, 0.3);
        let sq = DataArray::from_columns(vec![("q", q.clone()), ("Sq", s.clone())]).unwrap();
        let gr = sq2gr(&sq, 2.0, 2).unwrap();
        assert_eq!(gr.len(), 399);
        let r = gr.column("r").unwrap().to_vec();
        assert!(r.windows(2).all(|w| w[1] > w[0]));
        let q2s: Vec<f64> = q.iter().zip(s.iter()).map(|(x, y)| x * x * (y - 1.0)).collect();
        let expected = -simpson(&q2s, &q) / (2.0 * PI * PI);
        assert_relative_eq!(gr.attr_f64("n0").unwrap(), expected);
        assert!(sq2gr(&sq, 1e6, 2).is_err());
    }
}
