/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Bragg peak line shapes and the summed peak kernels of the lattice structure factors

use crate::utils::special::faddeeva;
use crate::utils::Vector3D;
use num_complex::Complex64;
use rayon::prelude::*;
use std::f64::consts::{LN_2, PI};

/// Conversion of a Gaussian FWHM into its standard deviation
pub fn fwhm_to_sigma(fwhm: f64) -> f64 {
    fwhm / (2.0 * (2.0 * LN_2).sqrt())
}

/// Normalized Voigt profile
///
/// # Arguments
///
/// * `x` - Position at which the profile is evaluated
/// * `center` - Peak center
/// * `fwhm` - Full width at half maximum of the combined profile
/// * `lg` - Lorentzian over Gaussian width ratio, 0 is a pure Gaussian
/// * `asym` - Sigmoidal asymmetry, the width becomes `2 fwhm/(1+exp(asym (x-center)))`
///
/// # Returns
///
/// The profile value, integrating to one over x for `asym = 0`
pub fn voigt(x: f64, center: f64, fwhm: f64, lg: f64, asym: f64) -> f64 {
    // Olivero-Longbothum width of the Gaussian part
    let gauss_fwhm = fwhm / (0.5346 * lg + (0.2166 * lg * lg + 1.0).sqrt());
    let dx = x - center;
    let width = 2.0 * gauss_fwhm / (1.0 + (asym * dx).exp());
    if width.is_nan() || width <= 0.0 {
        return 0.0;
    }
    let sigma = fwhm_to_sigma(width);
    let gamma = lg * width / 2.0;
    let z = Complex64::new(dx, gamma) / (2f64.sqrt() * sigma);
    faddeeva(z).re / (sigma * (2.0 * PI).sqrt())
}

/// Product of normalized Gaussians along the three axes
pub fn gauss_peak_product(q: &Vector3D, center: &Vector3D, sigma: &Vector3D) -> f64 {
    (0..3)
        .map(|i| {
            let s = sigma[i];
            let t = (q[i] - center[i]) / s;
            (-0.5 * t * t).exp() / (s * (2.0 * PI).sqrt())
        })
        .product()
}

/// Weighted sum of Voigt peaks at every q
///
/// `peaks` holds `(center, weight)` pairs. The result is in input order.
pub fn sum_voigt_peaks(
    q: &[f64],
    peaks: &[(f64, f64)],
    fwhm: f64,
    lg: f64,
    asym: f64,
) -> Vec<f64> {
    let eval = |&x: &f64| {
        peaks
            .iter()
            .map(|&(center, weight)| weight * voigt(x, center, fwhm, lg, asym))
            .sum::<f64>()
    };
    if q.len() * peaks.len() < 4096 {
        q.iter().map(eval).collect()
    } else {
        q.par_iter().map(eval).collect()
    }
}

/// Weighted sum of Gaussian peak products at every 3D wavevector
///
/// Each peak is a `(center, weight)` pair sharing the width `sigma`. Evaluation is
/// sequential, callers split the wavevectors into parallel chunks.
pub fn sum_gauss_peaks(q: &[Vector3D], peaks: &[(Vector3D, f64)], sigma: &Vector3D) -> Vec<f64> {
    q.iter()
        .map(|qv| {
            peaks
                .iter()
                .map(|(center, weight)| weight * gauss_peak_product(qv, center, sigma))
                .sum()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::math::{linspace, trapezoid};
    use approx::assert_relative_eq;

    #[test]
    fn test_voigt_gaussian_limit() {
        let sigma = fwhm_to_sigma(0.2);
        let peak = voigt(1.0, 1.0, 0.2, 0.0, 0.0);
        assert_relative_eq!(peak, 1.0 / (sigma * (2.0 * PI).sqrt()), epsilon = 1e-10);
        // half maximum at half width
        assert_relative_eq!(voigt(1.1, 1.0, 0.2, 0.0, 0.0), peak / 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_voigt_normalized() {
        for lg in [0.0, 1.0, 5.0] {
            let x = linspace(-60.0, 60.0, 120001);
            let y: Vec<f64> = x.iter().map(|&v| voigt(v, 0.0, 1.0, lg, 0.0)).collect();
            let tol = if lg > 1.0 { 1e-2 } else { 5e-3 };
            assert_relative_eq!(trapezoid(&y, &x), 1.0, epsilon = tol);
        }
    }

    #[test]
    fn test_voigt_asymmetry_shifts_weight() {
        let left = voigt(0.9, 1.0, 0.2, 1.0, 5.0);
        let right = voigt(1.1, 1.0, 0.2, 1.0, 5.0);
        assert!(left > right);
        assert_relative_eq!(voigt(0.9, 1.0, 0.2, 1.0, 0.0), voigt(1.1, 1.0, 0.2, 1.0, 0.0));
    }

    #[test]
    fn test_gauss_peak_product() {
        let s = Vector3D::new(0.1, 0.2, 0.3);
        let c = Vector3D::new(1.0, 0.0, 0.0);
        let expected = 1.0 / (0.1 * 0.2 * 0.3 * (2.0 * PI).powf(1.5));
        assert_relative_eq!(gauss_peak_product(&c, &c, &s), expected, epsilon = 1e-12);
        let sum = sum_gauss_peaks(&[c], &[(c, 2.0)], &s);
        assert_relative_eq!(sum[0], 2.0 * expected, epsilon = 1e-12);
    }

    #[test]
    fn test_sum_voigt_peaks_order() {
        let q = linspace(0.5, 2.5, 5);
        let out = sum_voigt_peaks(&q, &[(1.0, 1.0), (2.0, 3.0)], 0.1, 0.0, 0.0);
        assert_eq!(out.len(), 5);
        assert!(out[3] > out[1]);
    }
}
