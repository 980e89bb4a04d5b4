/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Two-Yukawa fluid in the mean spherical approximation
//!
//! Hard spheres of diameter 1 interact beyond contact through
//! `V(r)/kT = -K1 e^{-Z1(r-1)}/r - K2 e^{-Z2(r-1)}/r`, positive K being attractive.
//! The closure fixes six coefficients (a, b, c1, c2, d1, d2) through four linear and two
//! nonlinear equations (Liu, Chen and Chen, J. Chem. Phys. 122, 044507 (2005)). They are
//! solved by Newton iteration, following the branch that starts at the Percus-Yevick
//! hard sphere solution while the coupling strengths are switched on.

use super::common::{sq_result, validate_length, validate_q, validate_volume_fraction, Concentration};
use super::errors::{Result, StructureFactorError};
use super::pair_correlation::radial_distribution_hs;
use crate::data::DataArray;
use crate::utils::math::{linspace, solve_linear_system};
use log::{debug, warn};

/// Smallest accepted magnitude of a reduced screening constant or a non-zero coupling
const MIN_PARAMETER: f64 = 0.001;

/// Relative distance below which both screening constants count as equal
const EQUAL_Z_TOLERANCE: f64 = 0.01;

const NEWTON_MAX_ITER: usize = 50;
const NEWTON_ACCURACY: f64 = 1e-11;
const MIN_CONTINUATION_STEP: f64 = 1e-4;

/// Wavevector grid (in units of 1/diameter) for the hard core check of g(r)
const CORE_Q_MAX: f64 = 320.0 * std::f64::consts::PI;
const CORE_Q_POINTS: usize = 8192;

/// Coefficients of the two-Yukawa closure solution
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TwoYukawaCoefficients {
    pub a: f64,
    pub b: f64,
    pub c1: f64,
    pub c2: f64,
    pub d1: f64,
    pub d2: f64,
}

impl TwoYukawaCoefficients {
    /// Percus-Yevick hard sphere solution
    fn hard_sphere(phi: f64) -> Self {
        let a = (1.0 + 2.0 * phi) / (1.0 - phi).powi(2);
        Self {
            a,
            b: -1.5 * phi * a / (1.0 + 2.0 * phi),
            c1: 0.0,
            c2: 0.0,
            d1: 0.0,
            d2: 0.0,
        }
    }

    fn to_array(self) -> [f64; 6] {
        [self.a, self.b, self.c1, self.c2, self.d1, self.d2]
    }

    fn from_array(x: &[f64; 6]) -> Self {
        Self {
            a: x[0],
            b: x[1],
            c1: x[2],
            c2: x[3],
            d1: x[4],
            d2: x[5],
        }
    }
}

/// Dimensionless potential parameters, `z1 > z2` after normalisation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TwoYukawaPotential {
    pub z1: f64,
    pub z2: f64,
    pub k1: f64,
    pub k2: f64,
    pub phi: f64,
}

impl TwoYukawaPotential {
    fn with_coupling(&self, t: f64) -> Self {
        Self {
            k1: self.k1 * t,
            k2: self.k2 * t,
            ..*self
        }
    }

    fn sigma(&self, s: f64, c: &TwoYukawaCoefficients) -> f64 {
        let (z1, z2) = (self.z1, self.z2);
        -(c.a / 2.0 + c.b + c.c1 * (-z1).exp() + c.c2 * (-z2).exp()) / s
            + c.a / s.powi(3)
            + c.b / (s * s)
            + (c.c1 + c.d1) / (s + z1)
            + (c.c2 + c.d2) / (s + z2)
    }

    fn tau(&self, s: f64, c: &TwoYukawaCoefficients) -> f64 {
        let (z1, z2) = (self.z1, self.z2);
        c.b / (s * s) + c.a * (1.0 / s.powi(3) + 1.0 / (s * s))
            - (c.c1 * z1 * (-z1).exp() / (s + z1) + c.c2 * z2 * (-z2).exp() / (s + z2)) / s
    }

    fn q_of(&self, s: f64, c: &TwoYukawaCoefficients) -> f64 {
        self.sigma(s, c) - (-s).exp() * self.tau(s, c)
    }

    /// Laplace transform of r g(r) at `s`, multiplied by `e^s`
    fn g_scaled(&self, s: f64, c: &TwoYukawaCoefficients) -> f64 {
        s * self.tau(s, c) / (1.0 - 12.0 * self.phi * self.q_of(s, c))
    }

    fn residuals(&self, x: &[f64; 6]) -> [f64; 6] {
        let c = TwoYukawaCoefficients::from_array(x);
        let (z1, z2, phi) = (self.z1, self.z2, self.phi);
        let linear_1 = c.b
            - 12.0
                * phi
                * (-c.a / 8.0 - c.b / 6.0
                    + c.d1 / (z1 * z1)
                    + c.c1 * (1.0 / (z1 * z1) - (-z1).exp() * (0.5 + (1.0 + z1) / (z1 * z1)))
                    + c.d2 / (z2 * z2)
                    + c.c2 * (1.0 / (z2 * z2) - (-z2).exp() * (0.5 + (1.0 + z2) / (z2 * z2))));
        let linear_2 = 1.0
            - c.a
            - 12.0
                * phi
                * (-c.a / 3.0 - c.b / 2.0
                    + c.d1 / z1
                    + c.c1 * (1.0 - (1.0 + z1) * (-z1).exp()) / z1
                    + c.d2 / z2
                    + c.c2 * (1.0 - (1.0 + z2) * (-z2).exp()) / z2);
        // divided by e^Z
        let linear_3 = self.k1 - c.d1 * z1 * (-z1).exp() * (1.0 - 12.0 * phi * self.q_of(z1, &c));
        let linear_4 = self.k2 - c.d2 * z2 * (-z2).exp() * (1.0 - 12.0 * phi * self.q_of(z2, &c));
        let nonlinear_1 = c.c1 + c.d1
            - 12.0 * phi * ((c.c1 + c.d1) * self.sigma(z1, &c) - c.c1 * self.tau(z1, &c) * (-z1).exp());
        let nonlinear_2 = c.c2 + c.d2
            - 12.0 * phi * ((c.c2 + c.d2) * self.sigma(z2, &c) - c.c2 * self.tau(z2, &c) * (-z2).exp());
        [linear_1, linear_2, linear_3, linear_4, nonlinear_1, nonlinear_2]
    }

    /// Newton iteration with a forward difference Jacobian and step halving
    fn newton(&self, start: &[f64; 6]) -> Option<[f64; 6]> {
        let norm = |v: &[f64; 6]| v.iter().fold(0.0_f64, |m, x| m.max(x.abs()));
        let mut x = *start;
        let mut f = self.residuals(&x);
        for _ in 0..NEWTON_MAX_ITER {
            if norm(&f) < NEWTON_ACCURACY {
                return Some(x);
            }
            let mut jacobian = vec![vec![0.0; 6]; 6];
            for j in 0..6 {
                let h = 1e-7 * x[j].abs().max(1.0);
                let mut shifted = x;
                shifted[j] += h;
                let fp = self.residuals(&shifted);
                for i in 0..6 {
                    jacobian[i][j] = (fp[i] - f[i]) / h;
                }
            }
            let dx = solve_linear_system(jacobian, f.iter().map(|v| -v).collect()).ok()?;

            let mut lambda = 1.0_f64;
            let (next, f_next) = loop {
                let mut trial = x;
                for (t, d) in trial.iter_mut().zip(dx.iter()) {
                    *t += lambda * d;
                }
                let f_trial = self.residuals(&trial);
                if f_trial.iter().all(|v| v.is_finite()) && norm(&f_trial) < norm(&f) {
                    break (trial, f_trial);
                }
                lambda /= 2.0;
                if lambda < 1e-4 {
                    return None;
                }
            };
            let step = dx.iter().fold(0.0_f64, |m, d| m.max((lambda * d).abs()));
            x = next;
            f = f_next;
            if step < 1e-13 * (1.0 + norm(&x)) {
                break;
            }
        }
        (norm(&f) < 1e-8).then_some(x)
    }

    /// Follow the solution from K = 0 to the full coupling strengths
    pub fn solve(&self) -> Option<TwoYukawaCoefficients> {
        let mut x = TwoYukawaCoefficients::hard_sphere(self.phi).to_array();
        let mut t = 0.0_f64;
        let mut dt = 0.1_f64;
        let mut steps = 0;
        while t < 1.0 {
            let next = (t + dt).min(1.0);
            match self.with_coupling(next).newton(&x) {
                Some(solution) => {
                    x = solution;
                    t = next;
                    dt = (dt * 1.5).min(0.25);
                    steps += 1;
                }
                None => {
                    dt /= 2.0;
                    if dt < MIN_CONTINUATION_STEP {
                        debug!("continuation stalled at coupling fraction {t}");
                        return None;
                    }
                }
            }
        }
        debug!("two-Yukawa solution after {steps} continuation steps: {x:?}");
        Some(TwoYukawaCoefficients::from_array(&x))
    }

    /// Fourier transform of the direct correlation of one Yukawa tail with `w = v/K`
    fn yukawa_term(q: f64, z: f64, k: f64, w: f64) -> f64 {
        if k == 0.0 {
            return 0.0;
        }
        let ez = (-z).exp();
        if q == 0.0 {
            return k
                * (w * ez + w * (z - 1.0) - 2.0 * z)
                * (-w * (1.0 + z) * ez + w + 2.0 * z * (1.0 + z))
                / z.powi(4)
                / 4.0;
        }
        let (s, c) = q.sin_cos();
        let zq = z * z + q * q;
        let t1 = (1.0 - w * ez / (2.0 * z)) * ((1.0 - c) / (q * q) - 1.0 / zq);
        let t2 = w * w * (q * c - z * s) / (4.0 * z * z * q * zq);
        let t3 = (q * c + z * s) / (q * zq);
        let t4 = w * ez / z - w * w * ez * ez / (4.0 * z * z) - 1.0;
        k * (w / z * t1 - t2 + t3 * t4)
    }

    /// Structure factor at wavevectors `q` in units of 1/diameter
    pub fn structure_factor(&self, q: &[f64], c: &TwoYukawaCoefficients) -> Vec<f64> {
        let phi = self.phi;
        let w1 = 24.0 * phi * self.g_scaled(self.z1, c);
        let w2 = 24.0 * phi * self.g_scaled(self.z2, c);
        let a0 = c.a * c.a;
        let b0 = -12.0
            * phi
            * ((c.a + c.b).powi(2) / 2.0 + c.a * (c.c1 * (-self.z1).exp() + c.c2 * (-self.z2).exp()));
        q.iter()
            .map(|&qq| {
                let (t1, t2, t3) = if qq == 0.0 {
                    (a0 / 3.0, b0 / 4.0, a0 * phi / 12.0)
                } else {
                    let (s, co) = qq.sin_cos();
                    let q2 = qq * qq;
                    (
                        a0 * (s - qq * co) / qq.powi(3),
                        b0 * (2.0 * qq * s - (q2 - 2.0) * co - 2.0) / (q2 * q2),
                        a0 * phi * ((q2 - 6.0) * 4.0 * qq * s - (q2 * q2 - 12.0 * q2 + 24.0) * co + 24.0)
                            / (2.0 * qq.powi(6)),
                    )
                };
                let pc = -24.0
                    * phi
                    * (t1 + t2 + t3
                        + Self::yukawa_term(qq, self.z1, self.k1, w1)
                        + Self::yukawa_term(qq, self.z2, self.k2, w2));
                1.0 / (1.0 - pc)
            })
            .collect()
    }

    /// Mean |g(r)| inside the hard core, over 0.1 < r < 0.9 diameters
    fn core_mean(&self, c: &TwoYukawaCoefficients) -> f64 {
        let k = linspace(0.0, CORE_Q_MAX, CORE_Q_POINTS);
        let s = self.structure_factor(&k, c);
        let r: Vec<f64> = (17..=143).map(|m| m as f64 / 160.0).collect();
        let g = radial_distribution_hs(&k, &s, self.phi, &r);
        g.iter().map(|v| v.abs()).sum::<f64>() / g.len() as f64
    }

    /// Reason why a solution is unphysical, if it is
    fn check(&self, c: &TwoYukawaCoefficients) -> Option<String> {
        if !(c.a > 0.0) {
            return Some(format!("unphysical solution with a = {}", c.a));
        }
        for (z, k) in [(self.z1, self.k1), (self.z2, self.k2)] {
            let g = self.g_scaled(z, c);
            if k != 0.0 && !(g > 0.0) {
                return Some(format!("unphysical solution with g({z}) = {g}"));
            }
        }
        let core = self.core_mean(c);
        if !(core <= 1.0) {
            return Some(format!("bad solution with mean g(r<1) = {core}"));
        }
        None
    }
}

/// Structure factor of the two-Yukawa fluid
///
/// Inverse screening lengths are reduced with the diameter, `Z_i = 2R/scl_i`. Reduced
/// constants below 0.001 and non-zero couplings below 0.001 in magnitude are raised to
/// 0.001. If both screening constants agree within 1% the potential is replaced by
/// `Z1 → 2 Z1`, `K2 → K1 + K2`, `K1 → 0.001 K2`, noted in the `approximation` attribute.
/// Without a physical solution S(q) is zero and the reason is stored in `error`.
///
/// # Arguments
///
/// * `q` - Wavevectors in 1/nm
/// * `r` - Hard core radius in nm
/// * `k1`, `k2` - Potential strengths in kT, positive values are attractive
/// * `scl1`, `scl2` - Screening lengths in nm
/// * `concentration` - Volume fraction or molarity
pub fn two_yukawa(
    q: &[f64],
    r: f64,
    k1: f64,
    k2: f64,
    scl1: f64,
    scl2: f64,
    concentration: Concentration,
) -> Result<DataArray> {
    validate_q(q)?;
    validate_length("radius", r)?;
    if !(r > 0.0 && scl1 > 0.0 && scl2 > 0.0) || !k1.is_finite() || !k2.is_finite() {
        return Err(StructureFactorError::InvalidParameter(format!(
            "radius and screening lengths must be positive and strengths finite, \
             got R={r} scl1={scl1} scl2={scl2} K1={k1} K2={k2}"
        )));
    }
    let (phi, molarity) = concentration.resolve(r)?;
    validate_volume_fraction(phi)?;
    if phi >= 1.0 {
        return Err(StructureFactorError::InvalidParameter(
            "volume fraction must be below 1".to_string(),
        ));
    }

    let raise = |v: f64| {
        if v != 0.0 && v.abs() < MIN_PARAMETER {
            MIN_PARAMETER.copysign(v)
        } else {
            v
        }
    };
    let clamp_z = |z: f64| z.max(MIN_PARAMETER);
    let mut z1 = clamp_z(2.0 * r / scl1);
    let mut z2 = clamp_z(2.0 * r / scl2);
    let mut kk1 = raise(k1);
    let mut kk2 = raise(k2);

    let mut approximation = None;
    if (z1 - z2).abs() <= EQUAL_Z_TOLERANCE * z1.max(z2) {
        z1 *= 2.0;
        kk2 += kk1;
        kk1 = 0.001 * kk2;
        let note = format!("equal screening replaced by Z1={z1}, K1={kk1}, Z2={z2}, K2={kk2}");
        warn!("two-Yukawa: {note}");
        approximation = Some(note);
    }
    if z1 < z2 {
        std::mem::swap(&mut z1, &mut z2);
        std::mem::swap(&mut kk1, &mut kk2);
    }
    let potential = TwoYukawaPotential {
        z1,
        z2,
        k1: kk1,
        k2: kk2,
        phi,
    };

    let outcome = match potential.solve() {
        None => Err("no solution found".to_string()),
        Some(c) => match potential.check(&c) {
            Some(reason) => Err(reason),
            None => Ok(c),
        },
    };
    let mut result = match outcome {
        Ok(c) => {
            let qd: Vec<f64> = q.iter().map(|qq| qq * 2.0 * r).collect();
            sq_result(q, potential.structure_factor(&qd, &c))?
        }
        Err(reason) => {
            warn!("two-Yukawa: {reason}");
            let mut zeros = sq_result(q, vec![0.0; q.len()])?;
            zeros.set_attr("error", reason);
            zeros
        }
    };
    result.set_attr("R", r);
    result.set_attr("K1", k1);
    result.set_attr("K2", k2);
    result.set_attr("scl1", scl1);
    result.set_attr("scl2", scl2);
    result.set_attr("phi", phi);
    result.set_attr("molarity", molarity);
    if let Some(note) = approximation {
        result.set_attr("approximation", note);
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::AttrValue;
    use crate::structure_factor::percus_yevick::percus_yevick_values;
    use approx::assert_relative_eq;

    #[test]
    fn test_zero_coupling_is_percus_yevick() {
        let q = [0.0, 1.0, 3.0, 6.0];
        let result = two_yukawa(&q, 0.5, 0.0, 0.0, 0.1, 2.0, 0.2.into()).unwrap();
        let sq = result.column("Sq").unwrap();
        assert_relative_eq!(sq[0], 0.208_979_591_8, epsilon = 1e-8);
        let py = percus_yevick_values(&q[1..], 0.5, 0.2);
        for (s, p) in sq.iter().skip(1).zip(py.iter()) {
            assert_relative_eq!(*s, *p, epsilon = 1e-8);
        }
    }

    #[test]
    fn test_cluster_peak_grows_with_attraction() {
        // short range attraction Z1 = 10, long range repulsion Z2 = 0.5
        let q = [2.0];
        let heights: Vec<f64> = [3.0, 6.0, 10.0]
            .iter()
            .map(|&k1| {
                let result = two_yukawa(&q, 0.5, k1, -1.0, 0.1, 2.0, 0.2.into()).unwrap();
                assert!(result.attr("error").is_none());
                result.column("Sq").unwrap()[0]
            })
            .collect();
        assert_relative_eq!(heights[0], 0.393, epsilon = 2e-3);
        assert_relative_eq!(heights[2], 1.527, epsilon = 2e-3);
        assert!(heights[0] < heights[1] && heights[1] < heights[2]);
    }

    #[test]
    fn test_equal_screening_is_approximated() {
        let result = two_yukawa(&[0.5, 1.0], 0.5, 1.0, -2.0, 1.0, 1.0, 0.1.into()).unwrap();
        // Z = 2R/scl = 1 for both tails, the first is doubled and takes K1 = 0.001 K2
        match result.attr("approximation") {
            Some(AttrValue::Text(note)) => {
                assert!(note.contains("Z1=2,"), "{note}");
                assert!(note.contains("Z2=1,"), "{note}");
                assert!(note.contains("K2=-1"), "{note}");
            }
            other => panic!("unexpected approximation attribute {other:?}"),
        }
        assert_eq!(result.attr_f64("K1"), Some(1.0));
    }

    #[test]
    fn test_coefficients_solve_the_closure() {
        let potential = TwoYukawaPotential {
            z1: 10.0,
            z2: 0.5,
            k1: 6.0,
            k2: -1.0,
            phi: 0.2,
        };
        let c = potential.solve().unwrap();
        let residual = potential.residuals(&c.to_array());
        assert!(residual.iter().all(|r| r.abs() < 1e-8));
        assert!(potential.check(&c).is_none());
    }

    #[test]
    fn test_invalid_input() {
        assert!(two_yukawa(&[0.1], 0.5, 1.0, -1.0, 0.0, 1.0, 0.1.into()).is_err());
        assert!(two_yukawa(&[0.1], 0.5, 1.0, -1.0, 0.1, 1.0, 1.5.into()).is_err());
    }
}
