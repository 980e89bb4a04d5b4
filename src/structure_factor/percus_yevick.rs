/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Percus-Yevick structure factors of hard spheres, disks and rods
//!
//! * 3D: Wertheim's solution
//! * 2D: Rosenfeld's free-energy model of hard disks
//! * 1D: Leutheusser's exact solution for hard rods

use super::common::{nonzero, sq_result, validate_length, validate_q, Concentration};
use super::errors::Result;
use crate::data::DataArray;
use crate::utils::special::{bessel_j0, bessel_j1};
use std::f64::consts::PI;

/// Below this value of 2qR the S(0) limit is returned
const SMALL_U: f64 = 0.02;

/// Wertheim coefficients `a` and `b` of the direct correlation function
fn wertheim_coefficients(eta: f64) -> (f64, f64) {
    let d4 = (1.0 - eta).powi(4);
    let a = (1.0 + 2.0 * eta).powi(2) / d4;
    let b = -1.5 * eta * (eta + 2.0).powi(2) / d4;
    (a, b)
}

/// Hard sphere S(q) for radius `r` and volume fraction `eta` without result container
pub fn percus_yevick_values(q: &[f64], r: f64, eta: f64) -> Vec<f64> {
    if r == 0.0 || eta == 0.0 {
        return vec![1.0; q.len()];
    }
    let (a, b) = wertheim_coefficients(eta);
    q.iter()
        .map(|&qq| {
            let u = (2.0 * qq * r).max(0.01);
            if u <= SMALL_U {
                return 1.0 / a;
            }
            let (s, c) = u.sin_cos();
            let u2 = u * u;
            let uu = a * (s - u * c)
                + b * ((2.0 / u2 - 1.0) * u * c + 2.0 * s - 2.0 / u)
                + eta * a / 2.0
                    * (24.0 / (u2 * u) + 4.0 * (1.0 - 6.0 / u2) * s
                        - (1.0 - 12.0 / u2 + 24.0 / (u2 * u2)) * u * c);
            1.0 / (1.0 + 24.0 * eta / (u2 * u) * uu)
        })
        .collect()
}

/// Percus-Yevick structure factor of hard spheres
///
/// # Arguments
///
/// * `q` - Wavevectors in 1/nm
/// * `r` - Hard sphere radius in nm
/// * `concentration` - Volume fraction or molarity in mol/l
///
/// # Returns
///
/// Columns `q`, `Sq` with attributes `eta`, `molarity`, `radius` and `Sq0`
pub fn percus_yevick(q: &[f64], r: f64, concentration: Concentration) -> Result<DataArray> {
    validate_q(q)?;
    validate_length("radius", r)?;
    let (eta, molarity) = concentration.resolve(r)?;
    super::common::validate_volume_fraction(eta)?;

    let sq = percus_yevick_values(q, r, eta);
    let sq0 = if r == 0.0 || eta == 0.0 {
        1.0
    } else {
        1.0 / wertheim_coefficients(eta).0
    };

    let mut result = sq_result(q, sq)?;
    result.set_attr("eta", eta);
    result.set_attr("molarity", molarity);
    result.set_attr("radius", r);
    result.set_attr("Sq0", sq0);
    Ok(result)
}

/// Packing fraction of disks on a hexagonal lattice with constant `a`
pub fn hexagonal_packing_fraction(r: f64, a: f64) -> f64 {
    PI * r * r / (1.5 * 3f64.sqrt() * a * a)
}

/// Percus-Yevick structure factor of hard disks in 2D
///
/// If the hexagonal lattice constant `a` is given, the packing fraction is derived from
/// it and `eta` is ignored.
pub fn percus_yevick_2d(q: &[f64], r: f64, eta: f64, a: Option<f64>) -> Result<DataArray> {
    validate_q(q)?;
    validate_length("radius", r)?;
    let eta = match a {
        Some(a) => hexagonal_packing_fraction(r, a),
        None => eta,
    };
    super::common::validate_volume_fraction(eta)?;

    let sq: Vec<f64> = if r == 0.0 || eta == 0.0 {
        vec![1.0; q.len()]
    } else {
        let xi = (1.0 + eta) / (1.0 - eta).powi(3);
        let g = 1.0 / (1.0 - eta);
        let big_a = (1.0 + (2.0 * eta - 1.0) * xi + 2.0 * eta * g) / eta;
        let big_b = ((1.0 - eta) * xi - 1.0 - 3.0 * eta * g) / eta;
        q.iter()
            .map(|&qq| {
                let u = nonzero(qq) * r;
                let j1u = bessel_j1(u);
                let uu = 4.0
                    * eta
                    * (big_a * (j1u / u).powi(2)
                        + big_b * bessel_j0(u) * j1u / u
                        + g * bessel_j1(2.0 * u) / u);
                1.0 / (1.0 + uu)
            })
            .collect()
    };

    let mut result = sq_result(q, sq)?;
    result.set_attr("packingfraction", eta);
    result.set_attr("R", r);
    result.set_attr("a", (PI * r * r / (eta * 1.5 * 3f64.sqrt())).sqrt());
    Ok(result)
}

/// Percus-Yevick structure factor of hard rods in 1D
///
/// `eta` is the line packing fraction `2 R n` with number density `n`.
pub fn percus_yevick_1d(q: &[f64], r: f64, eta: f64) -> Result<DataArray> {
    validate_q(q)?;
    validate_length("radius", r)?;
    super::common::validate_volume_fraction(eta)?;
    let d = 2.0 * r;
    let xi = 1.0 - eta;

    let sq: Vec<f64> = if r == 0.0 || eta == 0.0 {
        vec![1.0; q.len()]
    } else {
        let n = eta / d;
        q.iter()
            .map(|&qq| {
                let qq = nonzero(qq);
                // 1 - cos(qD) written as 2 sin²(qD/2) to stay exact at small q
                let one_minus_cos = 2.0 * (qq * d / 2.0).sin().powi(2);
                let c = -2.0 * ((qq * d).sin() / (qq * xi) + n * one_minus_cos / (qq * qq * xi * xi));
                1.0 / (1.0 - c * n)
            })
            .collect()
    };

    let mut result = sq_result(q, sq)?;
    result.set_attr("packingfraction", eta);
    result.set_attr("R", r);
    result.set_attr("nkTkappa", xi * xi);
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[rstest]
    #[case(0.1)]
    #[case(0.3)]
    #[case(0.45)]
    fn test_low_q_limit(#[case] eta: f64) {
        let result = percus_yevick(&[0.0, 0.001], 1.0, eta.into()).unwrap();
        let expected = (1.0 - eta).powi(4) / (1.0 + 2.0 * eta).powi(2);
        let sq = result.column("Sq").unwrap();
        assert_relative_eq!(sq[0], expected, epsilon = 1e-12);
        assert_relative_eq!(result.attr_f64("Sq0").unwrap(), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_known_values() {
        let result = percus_yevick(&[0.5, 1.0], 1.0, 0.3.into()).unwrap();
        let sq = result.column("Sq").unwrap();
        assert_relative_eq!(sq[0], 0.10129, epsilon = 1e-4);
        assert_relative_eq!(sq[1], 0.12827, epsilon = 1e-4);
    }

    #[test]
    fn test_dilute_and_large_q() {
        let q: Vec<f64> = (1..50).map(|i| i as f64).collect();
        let result = percus_yevick(&q, 2.0, 0.0.into()).unwrap();
        assert!(result.column("Sq").unwrap().iter().all(|&v| v == 1.0));
        let sq = percus_yevick_values(&[200.0], 2.0, 0.3);
        assert_relative_eq!(sq[0], 1.0, epsilon = 1e-3);
    }

    #[test]
    fn test_molarity_conversion() {
        let c = Concentration::Molarity(0.001);
        let result = percus_yevick(&[0.1], 3.0, c).unwrap();
        let eta = result.attr_f64("eta").unwrap();
        assert_relative_eq!(eta, c.volume_fraction(3.0).unwrap());
        assert!(percus_yevick(&[0.1], 3.0, Concentration::VolumeFraction(1.5)).is_err());
    }

    #[test]
    fn test_2d_and_1d() {
        let q = [0.0, 0.5, 1.0, 5.0];
        let sq2 = percus_yevick_2d(&q, 1.0, 0.3, None).unwrap();
        let s = sq2.column("Sq").unwrap();
        assert!(s[0] < 1.0 && s[0] > 0.0);
        let with_a = percus_yevick_2d(&q, 1.0, 0.0, Some(3.0)).unwrap();
        assert_relative_eq!(
            with_a.attr_f64("packingfraction").unwrap(),
            hexagonal_packing_fraction(1.0, 3.0)
        );
        assert_relative_eq!(with_a.attr_f64("a").unwrap(), 3.0, epsilon = 1e-12);

        let sq1 = percus_yevick_1d(&q, 1.0, 0.4).unwrap();
        let s = sq1.column("Sq").unwrap();
        // compressibility limit (1-eta)²
        assert_relative_eq!(s[0], 0.36, epsilon = 1e-6);
        assert_relative_eq!(sq1.attr_f64("nkTkappa").unwrap(), 0.36, epsilon = 1e-12);
    }
}
