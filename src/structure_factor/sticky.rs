/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Sticky hard spheres with a narrow square well and Baxter's adhesive hard spheres

use super::common::{nonzero, sq_result, validate_length, validate_q, validate_volume_fraction, Concentration};
use super::errors::Result;
use crate::data::DataArray;
use log::warn;
use serde::{Deserialize, Serialize};

/// Options of the square well model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StickyOptions {
    /// Lowest accepted well depth in kT, deeper wells are clamped to it
    pub depth_floor: f64,
}

impl Default for StickyOptions {
    fn default() -> Self {
        Self { depth_floor: -200.0 }
    }
}

/// Structure factor of hard spheres with a square well (sticky hard spheres)
///
/// Perturbative solution of the Percus-Yevick closure with the perturbation
/// parameter `ε = width/(2R + width)`.
///
/// # Arguments
///
/// * `q` - Wavevectors in 1/nm
/// * `r` - Hard core radius in nm
/// * `width` - Width of the square well in nm
/// * `depth` - Depth of the square well in kT, positive values are attractive
/// * `concentration` - Volume fraction or molarity of the hard cores
/// * `options` - Well depth clamp
///
/// # Returns
///
/// Columns `q`, `Sq` with attributes `welldepth`, `wellwidth`, `stickiness`,
/// `volumefraction`, `eta` and `molarity`
pub fn sticky_hard_sphere(
    q: &[f64],
    r: f64,
    width: f64,
    depth: f64,
    concentration: Concentration,
    options: &StickyOptions,
) -> Result<DataArray> {
    validate_q(q)?;
    validate_length("radius", r)?;
    validate_length("well width", width)?;
    let (phi, molarity) = concentration.resolve(r)?;
    validate_volume_fraction(phi)?;

    let depth = if depth < options.depth_floor {
        warn!("well depth {depth} kT clamped to {}", options.depth_floor);
        options.depth_floor
    } else {
        depth
    };

    let eps = match width / (2.0 * r + width) {
        e if e == 0.0 || !e.is_finite() => 1e-10,
        e => e,
    };
    let tau = (-depth).exp() / 12.0 / eps;
    let eta = phi * (1.0 - eps).powi(3);
    let d = 1.0 - eta;
    let lambda = (1.0 + 0.5 * eta) / (d * d) / (eta * eta / d - eta / 12.0 + tau);
    let mu = lambda * eta * d;
    let alpha = (1.0 + 2.0 * eta - mu) / (d * d);
    let beta = (-3.0 * eta + mu) / 2.0 / (d * d);

    let sq: Vec<f64> = q
        .iter()
        .map(|&qq| {
            let k = nonzero(qq) * (2.0 * r + width);
            let (s, c) = k.sin_cos();
            let k2 = k * k;
            let ak = 1.0
                + 12.0
                    * eta
                    * (alpha * (s - k * c) / (k2 * k) + beta * (1.0 - c) / k2 - lambda / 12.0 * s / k);
            let bk = 12.0
                * eta
                * (alpha * (0.5 / k - s / k2 + (1.0 - c) / (k2 * k)) + beta * (1.0 / k - s / k2)
                    - lambda / 12.0 * (1.0 - c) / k);
            1.0 / (ak * ak + bk * bk)
        })
        .collect();

    let mut result = sq_result(q, sq)?;
    result.set_attr("welldepth", depth);
    result.set_attr("wellwidth", width);
    result.set_attr("stickiness", tau);
    result.set_attr("volumefraction", phi);
    result.set_attr("eta", eta);
    result.set_attr("molarity", molarity);
    Ok(result)
}

/// Structure factor of Baxter's adhesive hard spheres
///
/// The hard core of radius `r` is surrounded by an infinitely narrow and deep well of
/// width `delta` with stickiness `tau`. Of the two solutions for λ the one with the
/// smaller modulus is taken. Parameters without a real λ are non physical and give an
/// all zero S(q) with `ir = -1` and an `error` attribute.
pub fn adhesive_hard_sphere(
    q: &[f64],
    r: f64,
    tau: f64,
    delta: f64,
    concentration: Concentration,
) -> Result<DataArray> {
    validate_q(q)?;
    validate_length("radius", r)?;
    validate_length("well width", delta)?;
    let (eta, _) = concentration.resolve(r)?;
    validate_volume_fraction(eta)?;

    let sigma = 2.0 * r + delta;
    let phi = eta * (sigma / (2.0 * r)).powi(3);
    let lam = 6.0 * (tau / phi + 1.0 / (1.0 - phi));
    let discriminant = lam * lam - 12.0 / phi * (1.0 + 0.5 * phi) / (1.0 - phi).powi(2);
    let mut result = if discriminant >= 0.0 {
        sq_result(q, adhesive_values(q, sigma, phi, lam, discriminant))?
    } else {
        let reason = format!("no real stickiness solution for tau={tau}, phi={phi}");
        warn!("adhesive hard spheres: {reason}");
        let mut zeros = sq_result(q, vec![0.0; q.len()])?;
        zeros.set_attr("ir", -1_i64);
        zeros.set_attr("error", reason);
        zeros
    };

    let well = 12.0 * tau * delta / sigma;
    result.set_attr("welldepth", if well > 0.0 { well.ln() } else { f64::INFINITY });
    result.set_attr("wellwidth", delta);
    result.set_attr("stickiness", tau);
    result.set_attr("HSvolumefraction", eta);
    result.set_attr("phi", phi);
    Ok(result)
}

fn adhesive_values(q: &[f64], sigma: f64, phi: f64, lam: f64, discriminant: f64) -> Vec<f64> {
    let lam1 = lam + discriminant.sqrt();
    let lam2 = lam - discriminant.sqrt();
    let lambda = if lam1.abs() < lam2.abs() { lam1 } else { lam2 };

    let mu = lambda * phi * (1.0 - phi);
    let d2 = (1.0 - phi).powi(2);
    let a = 0.5 * (1.0 + 2.0 * phi - mu) / d2;
    let b = 0.5 * sigma * (mu - 3.0 * phi) / d2;
    let c = -a * sigma * sigma - b * sigma + lambda * sigma * sigma / 12.0;

    q.iter()
        .map(|&qq| {
            let k = if qq == 0.0 { 1e-8 } else { qq * sigma };
            let (s, cs) = k.sin_cos();
            let k2 = k * k;
            let k3 = k2 * k;
            let i0 = s / k;
            let i1 = (cs + k * s - 1.0) / k2;
            let i2 = (k2 * s - 2.0 * s + 2.0 * k * cs) / k3;
            let j0 = (1.0 - cs) / k;
            let j1 = (s - k * cs) / k2;
            let j2 = (2.0 * s * k + 2.0 * cs - k2 * cs - 2.0) / k3;
            let alpha = 1.0 - 12.0 * phi * (c / (sigma * sigma) * i0 + b / sigma * i1 + a * i2);
            let beta = 12.0 * phi * (c / (sigma * sigma) * j0 + b / sigma * j1 + a * j2);
            1.0 / (alpha * alpha + beta * beta)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::AttrValue;
    use crate::structure_factor::percus_yevick::percus_yevick_values;
    use approx::assert_relative_eq;

    #[test]
    fn test_stickiness_attribute() {
        let q = [0.0, 0.1, 1.0];
        let result =
            sticky_hard_sphere(&q, 3.0, 0.1, 15.0, 0.2.into(), &StickyOptions::default()).unwrap();
        let expected = (-15.0f64).exp() / (12.0 * (0.1 / 6.1));
        assert_relative_eq!(result.attr_f64("stickiness").unwrap(), expected, max_relative = 1e-12);
        assert_relative_eq!(
            result.attr_f64("eta").unwrap(),
            0.2 * (1.0 - 0.1 / 6.1f64).powi(3),
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_attraction_raises_low_q() {
        let q = [0.01];
        let options = StickyOptions::default();
        let weak = sticky_hard_sphere(&q, 3.0, 0.3, 0.0, 0.2.into(), &options).unwrap();
        let strong = sticky_hard_sphere(&q, 3.0, 0.3, 2.0, 0.2.into(), &options).unwrap();
        assert!(strong.column("Sq").unwrap()[0] > weak.column("Sq").unwrap()[0]);
    }

    #[test]
    fn test_depth_floor() {
        let options = StickyOptions { depth_floor: -5.0 };
        let result = sticky_hard_sphere(&[0.1], 3.0, 0.1, -50.0, 0.1.into(), &options).unwrap();
        assert_eq!(result.attr_f64("welldepth"), Some(-5.0));
    }

    #[test]
    fn test_adhesive_weak_stickiness_is_hard_sphere() {
        let q = [0.1, 0.5, 1.0];
        let result = adhesive_hard_sphere(&q, 2.0, 1e8, 1e-6, 0.2.into()).unwrap();
        let sq = result.column("Sq").unwrap();
        let py = percus_yevick_values(&q, 2.0, 0.2);
        for (s, p) in sq.iter().zip(py.iter()) {
            assert_relative_eq!(s, p, max_relative = 1e-3);
        }
    }

    #[test]
    fn test_adhesive_complex_lambda_gives_zeros() {
        let result = adhesive_hard_sphere(&[0.1, 1.0], 2.0, 0.01, 0.1, 0.3.into()).unwrap();
        assert_eq!(result.column("Sq").unwrap().to_vec(), vec![0.0, 0.0]);
        assert_eq!(result.attr("ir"), Some(&AttrValue::Int(-1)));
        assert!(result.attr("error").is_some());
        assert_eq!(result.attr_f64("stickiness"), Some(0.01));
    }
}
